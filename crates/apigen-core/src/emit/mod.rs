//! File assembly: grouping fragments into files, index files and the disk writer.

pub mod assemble;
pub mod index;
pub mod writer;

pub use assemble::{AssembledFile, assemble_entries};
pub use index::{IndexFile, export_line, merge_index};

/// One named model declaration and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFileEntry {
    pub schema_name: String,
    /// Destination path relative to the target output directory.
    pub path: String,
    /// Hoisted declarations the expression depends on, emitted before it.
    pub consts: Vec<String>,
    pub expression: String,
    /// Other model names this entry refers to.
    pub imports: Vec<String>,
}

/// Banner placed at the top of every generated source file.
pub fn banner(title: &str, version: &str) -> String {
    format!(
        "/**\n * Generated by apigen. Do not edit.\n * {title} (version {version})\n */"
    )
}

/// Join a file from its banner, import lines and body sections.
/// Empty sections are skipped and the file always ends with a newline.
pub fn render_file(banner: &str, imports: &[String], sections: &[String]) -> String {
    let mut parts: Vec<String> = vec![banner.to_string()];
    if !imports.is_empty() {
        parts.push(imports.join("\n"));
    }
    parts.extend(
        sections
            .iter()
            .map(|s| s.trim_end().to_string())
            .filter(|s| !s.is_empty()),
    );
    let mut out = parts.join("\n\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_file_skips_empty_sections() {
        let out = render_file(
            "// banner",
            &["import a from 'a';".to_string()],
            &["const x = 1;\n".to_string(), String::new(), "const y = 2;".to_string()],
        );
        assert_eq!(
            out,
            "// banner\n\nimport a from 'a';\n\nconst x = 1;\n\nconst y = 2;\n"
        );
    }
}
