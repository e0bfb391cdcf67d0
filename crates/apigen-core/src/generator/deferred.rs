use std::collections::HashMap;

/// Output a backend's `client` step postpones until the unit footer.
///
/// Keyed by operation name. A later registration for the same name replaces the
/// earlier one. Owned by a single run.
#[derive(Debug, Clone, Default)]
pub struct DeferredRegistry {
    entries: HashMap<String, String>,
}

impl DeferredRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, operation: &str, content: impl Into<String>) {
        self.entries.insert(operation.to_string(), content.into());
    }

    pub fn get(&self, operation: &str) -> Option<&str> {
        self.entries.get(operation).map(String::as_str)
    }

    /// Entries for `operations`, in the order given. Operations with nothing deferred
    /// are skipped.
    pub fn flush<'a>(&'a self, operations: &[&str]) -> Vec<&'a str> {
        operations
            .iter()
            .filter_map(|name| self.get(name))
            .collect()
    }

    /// Drop the entries of a finished unit.
    pub fn clear(&mut self, operations: &[&str]) {
        for name in operations {
            self.entries.remove(*name);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
