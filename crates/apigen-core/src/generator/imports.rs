use indexmap::IndexMap;

use super::{GeneratorDependency, GeneratorImport};

/// Merge dependencies that share a module specifier, dropping duplicate exports.
/// First-seen order is kept for both modules and exports.
pub fn merge_dependencies(
    deps: impl IntoIterator<Item = GeneratorDependency>,
) -> Vec<GeneratorDependency> {
    let mut merged: IndexMap<String, Vec<GeneratorImport>> = IndexMap::new();
    for dep in deps {
        let exports = merged.entry(dep.dependency).or_default();
        for export in dep.exports {
            match exports.iter_mut().find(|e| e.local_name() == export.local_name()) {
                // A value import subsumes a type-only import of the same binding.
                Some(existing) => existing.type_only &= export.type_only,
                None => exports.push(export),
            }
        }
    }
    merged
        .into_iter()
        .map(|(dependency, exports)| GeneratorDependency {
            dependency,
            exports,
        })
        .collect()
}

/// Render one import statement, e.g. `import axios, { type AxiosResponse } from 'axios';`.
pub fn render_dependency(dep: &GeneratorDependency) -> String {
    let default = dep.exports.iter().find(|e| e.default);
    let named: Vec<&GeneratorImport> = dep.exports.iter().filter(|e| !e.default).collect();
    let all_types = default.is_none() && !named.is_empty() && named.iter().all(|e| e.type_only);

    let specifiers: Vec<String> = named
        .iter()
        .map(|e| {
            let binding = match &e.alias {
                Some(alias) => format!("{} as {alias}", e.name),
                None => e.name.clone(),
            };
            if e.type_only && !all_types {
                format!("type {binding}")
            } else {
                binding
            }
        })
        .collect();

    let keyword = if all_types { "import type" } else { "import" };
    match (default, specifiers.is_empty()) {
        (Some(d), true) => format!("{keyword} {} from '{}';", d.name, dep.dependency),
        (Some(d), false) => format!(
            "{keyword} {}, {{ {} }} from '{}';",
            d.name,
            specifiers.join(", "),
            dep.dependency
        ),
        (None, _) => format!(
            "{keyword} {{ {} }} from '{}';",
            specifiers.join(", "),
            dep.dependency
        ),
    }
}

/// Module specifier for importing `to` from `from`, both relative to the output root.
///
/// `relative_import("pets/pets.ts", "model/pet.ts")` is `../model/pet`.
pub fn relative_import(from: &str, to: &str) -> String {
    let from_dir: Vec<&str> = {
        let mut parts: Vec<&str> = from.split('/').collect();
        parts.pop();
        parts
    };
    let target = to.strip_suffix(".ts").unwrap_or(to);
    let to_parts: Vec<&str> = target.split('/').collect();

    let common = from_dir
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count()
        .min(to_parts.len().saturating_sub(1));

    let ups = from_dir.len() - common;
    let rest = to_parts[common..].join("/");
    if ups == 0 {
        format!("./{rest}")
    } else {
        format!("{}{rest}", "../".repeat(ups))
    }
}
