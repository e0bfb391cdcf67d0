use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level project configuration loaded from `.apigen.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApigenConfig {
    pub input: String,
    /// Directory receiving an index that re-exports every target's output.
    pub workspace: Option<String>,
    pub targets: Vec<TargetConfig>,
}

impl Default for ApigenConfig {
    fn default() -> Self {
        Self {
            input: "openapi.yaml".to_string(),
            workspace: None,
            targets: vec![TargetConfig::default()],
        }
    }
}

/// One generation run: a backend, an output directory and its layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub name: String,
    /// Backend identifier, looked up in the generator registry.
    pub client: String,
    pub output: String,
    pub mode: OutputMode,
    pub models: ModelKind,
    /// Base name of the generated files (defaults to the camelCased spec title).
    pub file_name: Option<String>,
    pub index: bool,
    /// Merge index exports with the ones already on disk instead of replacing them.
    pub incremental_index: bool,
    pub base_url: Option<String>,
    pub mutator: Option<MutatorConfig>,
    pub params_serializer: Option<MutatorConfig>,
    /// Serialize every array query parameter as repeated `key=value` pairs.
    pub explode_arrays: bool,
    pub naming: NamingConfig,
    pub filters: FilterConfig,
    pub overrides: OverrideConfig,
    pub zod: ZodConfig,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            client: "fetch".to_string(),
            output: "src/generated".to_string(),
            mode: OutputMode::Single,
            models: ModelKind::Typescript,
            file_name: None,
            index: true,
            incremental_index: false,
            base_url: None,
            mutator: None,
            params_serializer: None,
            explode_arrays: false,
            naming: NamingConfig::default(),
            filters: FilterConfig::default(),
            overrides: OverrideConfig::default(),
            zod: ZodConfig::default(),
        }
    }
}

/// How generated files are laid out on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Everything, models included, in one file.
    #[default]
    Single,
    /// One client file plus one `<name>.schemas.ts` file.
    Split,
    /// One client file per tag plus a shared schemas file.
    Tags,
    /// One directory per tag plus a `model/` directory with a file per schema.
    TagsSplit,
    /// One file per operation plus a `model/` directory with a file per schema.
    Operations,
}

impl OutputMode {
    /// Whether models are written one file per schema.
    pub fn splits_models(&self) -> bool {
        matches!(self, OutputMode::TagsSplit | OutputMode::Operations)
    }
}

/// Which flavour of model declarations to emit for component schemas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    Typescript,
    Zod,
}

impl ModelKind {
    /// Id of the model emitter that handles this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Typescript => "typescript",
            ModelKind::Zod => "zod",
        }
    }
}

/// A custom function imported into generated code (request executor or params serializer).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MutatorConfig {
    /// Module specifier, relative to the output directory.
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub default: bool,
}

/// Naming strategy and aliases.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub strategy: NamingStrategy,
    /// Map from resolved operation name (operationId or route-derived) to custom alias.
    #[serde(default)]
    pub aliases: IndexMap<String, String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            strategy: NamingStrategy::UseOperationId,
            aliases: IndexMap::new(),
        }
    }
}

/// How operation names are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    #[default]
    UseOperationId,
    UseRouteBased,
}

/// Operation selection. Empty `tags` selects everything.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub tags: Vec<String>,
    pub exclude_tags: Vec<String>,
}

impl FilterConfig {
    pub fn selects(&self, tags: &[String]) -> bool {
        if tags.iter().any(|t| self.exclude_tags.contains(t)) {
            return false;
        }
        self.tags.is_empty() || tags.iter().any(|t| self.tags.contains(t))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OverrideConfig {
    /// Keyed by operationId (or the route-derived name when there is none).
    pub operations: IndexMap<String, OperationOverride>,
    pub tags: IndexMap<String, OperationOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OperationOverride {
    pub mutator: Option<MutatorConfig>,
    pub explode_arrays: Option<bool>,
}

impl OverrideConfig {
    /// Resolve the override for one operation: operation entries win over tag entries,
    /// and earlier tags win over later ones.
    pub fn resolve(&self, operation_key: &str, tags: &[String]) -> OperationOverride {
        let mut merged = OperationOverride::default();
        if let Some(op) = self.operations.get(operation_key) {
            merged = op.clone();
        }
        for tag in tags {
            if let Some(t) = self.tags.get(tag) {
                if merged.mutator.is_none() {
                    merged.mutator = t.mutator.clone();
                }
                if merged.explode_arrays.is_none() {
                    merged.explode_arrays = t.explode_arrays;
                }
            }
        }
        merged
    }
}

/// Zod generation options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ZodConfig {
    /// Declared dependency range of `zod` in the consuming project (e.g. `^3.23.0`).
    pub version: Option<String>,
    pub strict: ZodStrictness,
    pub coerce: ZodCoercion,
}

/// Reject unknown object keys, per validation site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ZodStrictness {
    pub param: bool,
    pub query: bool,
    pub header: bool,
    pub body: bool,
    pub response: bool,
}

/// Coercion of primitive validators, per validation site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ZodCoercion {
    pub param: CoerceSetting,
    pub query: CoerceSetting,
    pub header: CoerceSetting,
    pub body: CoerceSetting,
    pub response: CoerceSetting,
}

/// `true` coerces every eligible primitive, a list restricts it to the named ones.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CoerceSetting {
    All(bool),
    Only(Vec<CoerceType>),
}

impl Default for CoerceSetting {
    fn default() -> Self {
        CoerceSetting::All(false)
    }
}

impl CoerceSetting {
    pub fn applies_to(&self, ty: CoerceType) -> bool {
        match self {
            CoerceSetting::All(enabled) => *enabled,
            CoerceSetting::Only(types) => types.contains(&ty),
        }
    }
}

/// Validators that may be coerced. Composite validators are deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoerceType {
    String,
    Number,
    Boolean,
    Bigint,
    Date,
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".apigen.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<ApigenConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ApigenConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# apigen configuration
input: openapi.yaml
# workspace: src/api      # writes an index re-exporting every target

targets:
  - name: client
    client: fetch           # fetch | axios | axios-functions | zod
    output: src/api/client
    mode: split             # single | split | tags | tags-split | operations
    models: typescript      # typescript | zod
    index: true
    # base_url: https://api.example.com
    # mutator: { path: ./custom-instance.ts, name: customInstance }
    explode_arrays: false
    naming:
      strategy: use_operation_id  # use_operation_id | use_route_based
      aliases: {}
    filters:
      tags: []
      exclude_tags: []

  # - name: validation
  #   client: zod
  #   output: src/api/zod
  #   zod:
  #     version: "^3.23.0"
  #     strict: { body: true, response: false }
  #     coerce: { query: true, param: [number] }
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApigenConfig::default();
        assert_eq!(config.input, "openapi.yaml");
        assert_eq!(config.targets.len(), 1);
        let target = &config.targets[0];
        assert_eq!(target.client, "fetch");
        assert_eq!(target.mode, OutputMode::Single);
        assert_eq!(target.naming.strategy, NamingStrategy::UseOperationId);
        assert!(target.naming.aliases.is_empty());
        assert!(target.index);
        assert!(!target.explode_arrays);
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
input: spec.yaml
workspace: src/api
targets:
  - name: pets
    client: axios
    output: src/api/pets
    mode: tags-split
    models: zod
    naming:
      strategy: use_route_based
      aliases:
        listPets: pets
    overrides:
      operations:
        listPets:
          explode_arrays: true
      tags:
        pets:
          mutator: { path: ./instance.ts, name: customInstance }
    zod:
      version: "^4.0.0"
      strict:
        body: true
      coerce:
        query: true
        param: [number, boolean]
"#;
        let config: ApigenConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.input, "spec.yaml");
        assert_eq!(config.workspace.as_deref(), Some("src/api"));
        let target = &config.targets[0];
        assert_eq!(target.client, "axios");
        assert_eq!(target.mode, OutputMode::TagsSplit);
        assert_eq!(target.models, ModelKind::Zod);
        assert_eq!(target.naming.strategy, NamingStrategy::UseRouteBased);
        assert_eq!(target.naming.aliases["listPets"], "pets");
        assert!(target.zod.strict.body);
        assert!(!target.zod.strict.response);
        assert!(target.zod.coerce.query.applies_to(CoerceType::String));
        assert!(target.zod.coerce.param.applies_to(CoerceType::Number));
        assert!(!target.zod.coerce.param.applies_to(CoerceType::String));
        assert!(!target.zod.coerce.body.applies_to(CoerceType::Number));
    }

    #[test]
    fn test_parse_minimal_config() {
        let yaml = "input: api.yaml\n";
        let config: ApigenConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.input, "api.yaml");
        assert_eq!(config.targets.len(), 1);
        assert_eq!(config.targets[0].output, "src/generated");
    }

    #[test]
    fn test_override_precedence() {
        let yaml = r#"
operations:
  listPets:
    explode_arrays: false
tags:
  pets:
    explode_arrays: true
    mutator: { path: ./m.ts, name: m }
"#;
        let overrides: OverrideConfig = serde_yaml_ng::from_str(yaml).unwrap();
        let resolved = overrides.resolve("listPets", &["pets".to_string()]);
        assert_eq!(resolved.explode_arrays, Some(false));
        assert_eq!(resolved.mutator.unwrap().name, "m");

        let other = overrides.resolve("createPet", &["store".to_string()]);
        assert_eq!(other, OperationOverride::default());
    }

    #[test]
    fn test_filter_selection() {
        let filters = FilterConfig {
            tags: vec!["pets".to_string()],
            exclude_tags: vec!["internal".to_string()],
        };
        assert!(filters.selects(&["pets".to_string()]));
        assert!(!filters.selects(&["store".to_string()]));
        assert!(!filters.selects(&["pets".to_string(), "internal".to_string()]));
        assert!(FilterConfig::default().selects(&[]));
    }

    #[test]
    fn test_default_config_content_parses() {
        let config: ApigenConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config.targets.len(), 1);
        assert_eq!(config.targets[0].mode, OutputMode::Split);
    }
}
