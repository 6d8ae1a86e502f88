//! Module records and the registry document.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Description stored when a module has no documentation.
pub const NO_DESCRIPTION: &str = "No description available.";

fn default_description() -> String {
    NO_DESCRIPTION.to_owned()
}

/// Metadata about one discovered module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// Registry identifier, taken from the file's base name.
    pub name: String,
    /// Dotted import path, optionally carrying a healing marker.
    pub import_path: String,
    /// Module documentation.
    #[serde(default = "default_description")]
    pub description: String,
    /// Public callable names.
    #[serde(default)]
    pub functions: BTreeSet<String>,
}

impl ModuleRecord {
    /// Create a record with no functions and the default description.
    #[must_use]
    pub fn new(name: impl Into<String>, import_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            import_path: import_path.into(),
            description: default_description(),
            functions: BTreeSet::new(),
        }
    }

    /// Set the description. Blank text keeps the default.
    #[must_use]
    pub fn with_description(mut self, description: Option<&str>) -> Self {
        if let Some(text) = description.map(str::trim).filter(|t| !t.is_empty()) {
            text.clone_into(&mut self.description);
        }
        self
    }

    /// Set the callable names. Duplicates collapse.
    #[must_use]
    pub fn with_functions<I, S>(mut self, functions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.functions = functions.into_iter().map(Into::into).collect();
        self
    }
}

/// The persisted collection of module records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    /// Records in scan order.
    #[serde(default)]
    pub modules: Vec<ModuleRecord>,
}

impl RegistryDocument {
    /// Wrap a list of records.
    #[must_use]
    pub fn new(modules: Vec<ModuleRecord>) -> Self {
        Self { modules }
    }

    /// First record with the given name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ModuleRecord> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// First record with the given name, mutably.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut ModuleRecord> {
        self.modules.iter_mut().find(|m| m.name == name)
    }

    /// Whether the registry has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_description_keeps_default() {
        let record = ModuleRecord::new("greet", "modules.greet").with_description(Some("   "));
        assert_eq!(record.description, NO_DESCRIPTION);

        let record = record.with_description(Some("  Says hello.\n"));
        assert_eq!(record.description, "Says hello.");
    }

    #[test]
    fn functions_collapse_duplicates() {
        let record = ModuleRecord::new("m", "modules.m").with_functions(["b", "a", "b"]);
        assert_eq!(record.functions.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn missing_fields_take_defaults_when_parsed() {
        let doc: RegistryDocument =
            serde_yaml::from_str("modules:\n  - name: m\n    import_path: modules.m\n").unwrap();
        let record = doc.find("m").unwrap();
        assert_eq!(record.description, NO_DESCRIPTION);
        assert!(record.functions.is_empty());
    }

    #[test]
    fn find_returns_first_match() {
        let mut doc = RegistryDocument::new(vec![
            ModuleRecord::new("dup", "modules.a.dup"),
            ModuleRecord::new("dup", "modules.b.dup"),
        ]);
        assert_eq!(doc.find("dup").unwrap().import_path, "modules.a.dup");

        doc.find_mut("dup").unwrap().import_path = "modules.c.dup".into();
        assert_eq!(doc.modules[0].import_path, "modules.c.dup");
        assert_eq!(doc.modules[1].import_path, "modules.b.dup");
        assert_eq!(doc.len(), 2);
    }
}
