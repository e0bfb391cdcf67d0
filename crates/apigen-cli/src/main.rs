use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::info;
use rayon::prelude::*;

use apigen_core::config::{self, ApigenConfig, CONFIG_FILE_NAME, TargetConfig};
use apigen_core::emit::writer::{write_files, write_index};
use apigen_core::emit::{IndexFile, export_line};
use apigen_core::generator::GeneratorRegistry;
use apigen_core::parse::{self, OpenApiSpec};
use apigen_core::resolve::{ReachabilitySet, resolve_spec};
use apigen_core::transform::{build_operations, schema_or_ref_to_ir_schema};
use apigen_core::typescript::ir_type_to_ts;
use apigen_core::{GenerationReport, Pipeline};

#[derive(Parser)]
#[command(name = "apigen", about = "OpenAPI 3.x to TypeScript client generator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every configured target
    Generate {
        /// Path to the config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Path to the OpenAPI spec file (YAML or JSON), overriding the config
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Only generate the target with this name
        #[arg(long)]
        target: Option<String>,
    },

    /// Validate an OpenAPI spec
    Validate {
        /// Path to the OpenAPI spec file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the operations and reachable schemas of an OpenAPI spec
    Inspect {
        /// Path to the OpenAPI spec file
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Initialize a new apigen configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            config,
            input,
            target,
        } => cmd_generate(config, input, target),

        Commands::Validate { input } => cmd_validate(input),

        Commands::Inspect { input, format } => cmd_inspect(input, format),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "apigen", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn registry() -> GeneratorRegistry {
    let mut registry = GeneratorRegistry::new();
    apigen_client::register(&mut registry);
    apigen_zod::register(&mut registry);
    registry
}

fn load_spec(path: &Path) -> Result<OpenApiSpec> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");

    let parsed = match ext {
        "json" => parse::from_json(&content),
        _ => parse::from_yaml(&content),
    }
    .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(parsed)
}

/// Targets to run: all of them, or the one named on the command line.
fn select_targets<'a>(cfg: &'a ApigenConfig, name: Option<&str>) -> Result<Vec<&'a TargetConfig>> {
    let selected: Vec<&TargetConfig> = cfg
        .targets
        .iter()
        .filter(|t| name.is_none_or(|n| t.name == n))
        .collect();
    if selected.is_empty() {
        match name {
            Some(n) => anyhow::bail!("no target named `{n}` in the config"),
            None => anyhow::bail!("no targets configured. Add a `targets` section to your config."),
        }
    }
    Ok(selected)
}

/// Generate one target and write its files and indexes.
fn run_target(
    registry: &GeneratorRegistry,
    spec: &OpenApiSpec,
    target: &TargetConfig,
) -> Result<GenerationReport> {
    let report = Pipeline::new(registry)
        .run(spec, target)
        .with_context(|| format!("target `{}` failed", target.name))?;

    let output_dir = Path::new(&target.output);
    write_files(output_dir, &report.files)
        .with_context(|| format!("failed to write target `{}`", target.name))?;
    for index in &report.indexes {
        write_index(output_dir, index, target.incremental_index)
            .with_context(|| format!("failed to write index for target `{}`", target.name))?;
    }
    Ok(report)
}

fn normalize_dir(path: &str) -> String {
    let path = path.trim_start_matches("./").trim_end_matches('/');
    if path.is_empty() { ".".to_string() } else { path.to_string() }
}

/// `index.ts` of the workspace, re-exporting each target's own index.
fn workspace_index(workspace: &str, targets: &[&TargetConfig]) -> IndexFile {
    let workspace = normalize_dir(workspace);
    let index_path = format!("{workspace}/index.ts");
    IndexFile {
        path: "index.ts".to_string(),
        lines: targets
            .iter()
            .filter(|t| t.index)
            .map(|t| export_line(&index_path, &format!("{}/index.ts", normalize_dir(&t.output))))
            .collect(),
    }
}

fn cmd_generate(
    config_path: Option<PathBuf>,
    input: Option<PathBuf>,
    target: Option<String>,
) -> Result<()> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let cfg = config::load_config(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?
        .unwrap_or_default();
    let input = input.unwrap_or_else(|| PathBuf::from(&cfg.input));
    let spec = load_spec(&input)?;
    let targets = select_targets(&cfg, target.as_deref())?;
    let registry = registry();

    let outcomes: Vec<Result<GenerationReport>> = targets
        .par_iter()
        .map(|t| run_target(&registry, &spec, t))
        .collect();

    let mut failures = 0;
    let mut succeeded = Vec::new();
    for (target, outcome) in targets.iter().zip(outcomes) {
        match outcome {
            Ok(report) => {
                eprintln!(
                    "Generated {} files for `{}` in {} ({} operations, {} models)",
                    report.files.len() + report.indexes.len(),
                    target.name,
                    target.output,
                    report.operations,
                    report.models
                );
                for err in &report.errors {
                    eprintln!("  error: {err}");
                }
                failures += report.errors.len();
                succeeded.push(*target);
            }
            Err(err) => {
                eprintln!("error: {err:#}");
                failures += 1;
            }
        }
    }

    if let Some(workspace) = &cfg.workspace
        && !succeeded.is_empty()
    {
        let index = workspace_index(workspace, &succeeded);
        write_index(Path::new(workspace), &index, true)
            .with_context(|| format!("failed to write workspace index in {workspace}"))?;
        info!("updated workspace index in {workspace}");
    }

    if failures > 0 {
        anyhow::bail!("{failures} output unit(s) failed to generate");
    }
    Ok(())
}

fn cmd_validate(input: PathBuf) -> Result<()> {
    let parsed = load_spec(&input)?;

    eprintln!(
        "Valid OpenAPI {} spec: {}",
        parsed.openapi, parsed.info.title
    );
    eprintln!("  Version: {}", parsed.info.version);
    eprintln!("  Paths: {}", parsed.paths.len());

    let resolved = resolve_spec(&parsed)
        .with_context(|| format!("failed to resolve {}", input.display()))?;
    eprintln!("  Schemas: {}", resolved.arena.len());

    let records = build_operations(&resolved, &TargetConfig::default())?;
    eprintln!("  Operations: {}", records.len());

    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_inspect(input: PathBuf, format: InspectFormat) -> Result<()> {
    let parsed = load_spec(&input)?;
    let summary = build_inspect_summary(&parsed)?;

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_inspect_summary(spec: &OpenApiSpec) -> Result<serde_json::Value> {
    let resolved = resolve_spec(spec)?;
    let records = build_operations(&resolved, &TargetConfig::default())?;
    let reachable =
        ReachabilitySet::from_roots(&resolved.arena, records.iter().flat_map(|r| r.schema_roots()));

    let operations: Vec<serde_json::Value> = records
        .iter()
        .map(|op| {
            serde_json::json!({
                "name": op.name.camel_case,
                "method": op.method.as_str(),
                "path": op.route,
                "tags": op.tags,
                "props": op.props.iter().map(|p| &p.name).collect::<Vec<_>>(),
                "success": ir_type_to_ts(&op.response.success_type()),
            })
        })
        .collect();

    let schemas: Vec<serde_json::Value> = reachable
        .iter()
        .filter_map(|name| resolved.arena.get(name).map(|s| (name, s)))
        .map(|(name, schema)| {
            let ir = schema_or_ref_to_ir_schema(name, schema);
            serde_json::json!({
                "name": ir.name.pascal_case,
                "kind": ir.kind.label(),
            })
        })
        .collect();

    Ok(serde_json::json!({
        "info": {
            "title": resolved.spec.info.title,
            "version": resolved.spec.info.version,
        },
        "operations": operations,
        "schemas": schemas,
        "unreachable": resolved.arena.len() - schemas.len(),
    }))
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
