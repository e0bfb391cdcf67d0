use std::collections::BTreeSet;

use crate::generator::imports::relative_import;

/// An index file and the export lines it must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexFile {
    pub path: String,
    pub lines: Vec<String>,
}

/// `export * from './pet';` for `file` as seen from `index_path`.
pub fn export_line(index_path: &str, file: &str) -> String {
    let target = relative_import(index_path, file);
    let target = target.strip_suffix("/index").unwrap_or(&target);
    format!("export * from '{target}';")
}

/// Merge new export lines into an existing index.
///
/// Lines are trimmed, deduplicated and sorted; blank lines are dropped. The result always
/// ends with a newline, so merging the same lines twice is byte-identical.
pub fn merge_index(existing: Option<&str>, lines: &[String]) -> String {
    let merged: BTreeSet<&str> = existing
        .into_iter()
        .flat_map(str::lines)
        .chain(lines.iter().map(String::as_str))
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let mut out = merged.into_iter().collect::<Vec<_>>().join("\n");
    out.push('\n');
    out
}
