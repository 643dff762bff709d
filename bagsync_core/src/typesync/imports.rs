use crate::typesync::TargetFormat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// A request to bring `imported_name` into scope from `path`.
///
/// For the browser runtime `path` is a module specifier, for the managed
/// runtime it is a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImportDescriptor {
    pub path: String,
    pub imported_name: String,
}

impl ImportDescriptor {
    pub fn new(path: impl Into<String>, imported_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            imported_name: imported_name.into(),
        }
    }
}

/// Sorted, de-duplicated set of imports.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSet {
    entries: BTreeSet<ImportDescriptor>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, import: ImportDescriptor) {
        self.entries.insert(import);
    }

    pub fn merge(&mut self, other: ImportSet) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImportDescriptor> {
        self.entries.iter()
    }

    /// Drops every import of a name defined by the batch itself.
    pub fn exclude_defined(&mut self, defined: &HashSet<String>) {
        self.entries
            .retain(|import| !defined.contains(&import.imported_name));
    }

    pub fn into_vec(self) -> Vec<ImportDescriptor> {
        self.entries.into_iter().collect()
    }

    /// Renders the set as import statements, one per module or namespace.
    pub fn render(&self, format: TargetFormat) -> String {
        let mut by_path: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for import in &self.entries {
            by_path
                .entry(import.path.as_str())
                .or_default()
                .push(import.imported_name.as_str());
        }

        let mut out = String::new();
        for (path, names) in by_path {
            match format {
                TargetFormat::Browser => {
                    out.push_str(&format!(
                        "import type {{ {} }} from \"{}\";\n",
                        names.join(", "),
                        path
                    ));
                }
                TargetFormat::Managed => {
                    out.push_str(&format!("using {};\n", path));
                }
            }
        }
        out
    }
}

impl FromIterator<ImportDescriptor> for ImportSet {
    fn from_iter<I: IntoIterator<Item = ImportDescriptor>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ImportSet {
    type Item = ImportDescriptor;
    type IntoIter = std::collections::btree_set::IntoIter<ImportDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
