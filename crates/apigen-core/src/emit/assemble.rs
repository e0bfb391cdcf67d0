use std::collections::{BTreeMap, BTreeSet, HashMap};

use indexmap::IndexMap;

use super::SchemaFileEntry;
use crate::generator::imports::relative_import;
use crate::generator::{GeneratorDependency, GeneratorImport};

/// A physical file built from one or more entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledFile {
    pub path: String,
    pub entries: Vec<SchemaFileEntry>,
}

impl AssembledFile {
    /// Names declared in this file.
    pub fn defined(&self) -> BTreeSet<&str> {
        self.entries.iter().map(|e| e.schema_name.as_str()).collect()
    }

    /// Names referenced by the file's entries but declared elsewhere, sorted.
    pub fn external_refs(&self) -> BTreeSet<&str> {
        let defined = self.defined();
        self.entries
            .iter()
            .flat_map(|e| e.imports.iter().map(String::as_str))
            .filter(|name| !defined.contains(name))
            .collect()
    }

    /// Import statements for names declared in other files, grouped per file.
    ///
    /// `locations` maps a declared name to its file path. Names with no known location
    /// are left out.
    pub fn model_imports(
        &self,
        locations: &HashMap<String, String>,
        type_only: bool,
    ) -> Vec<GeneratorDependency> {
        let mut by_file: BTreeMap<String, Vec<GeneratorImport>> = BTreeMap::new();
        for name in self.external_refs() {
            if let Some(path) = locations.get(name) {
                let import = if type_only {
                    GeneratorImport::type_only(name)
                } else {
                    GeneratorImport::named(name)
                };
                by_file
                    .entry(relative_import(&self.path, path))
                    .or_default()
                    .push(import);
            }
        }
        by_file
            .into_iter()
            .map(|(dependency, exports)| GeneratorDependency {
                dependency,
                exports,
            })
            .collect()
    }

    /// Declarations in order, each entry's consts before its expression.
    pub fn body(&self) -> String {
        self.entries
            .iter()
            .map(|e| {
                let mut lines = e.consts.clone();
                lines.push(e.expression.trim_end().to_string());
                lines.join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Group entries into files.
///
/// Entries whose paths differ only by case share a file. Inside a file entries are
/// ordered by exact path, then by name; the file takes the first entry's path. Files
/// are ordered by that path.
pub fn assemble_entries(entries: Vec<SchemaFileEntry>) -> Vec<AssembledFile> {
    let mut groups: IndexMap<String, Vec<SchemaFileEntry>> = IndexMap::new();
    for entry in entries {
        groups.entry(entry.path.to_lowercase()).or_default().push(entry);
    }

    let mut files: Vec<AssembledFile> = groups
        .into_values()
        .map(|mut entries| {
            entries.sort_by(|a, b| {
                a.path
                    .cmp(&b.path)
                    .then_with(|| a.schema_name.cmp(&b.schema_name))
            });
            let path = entries[0].path.clone();
            AssembledFile { path, entries }
        })
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

/// Map every declared name to the path of the file that holds it.
pub fn locate(files: &[AssembledFile]) -> HashMap<String, String> {
    files
        .iter()
        .flat_map(|f| {
            f.entries
                .iter()
                .map(move |e| (e.schema_name.clone(), f.path.clone()))
        })
        .collect()
}
