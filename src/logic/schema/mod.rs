//! Schema Module - Feature schema for header-less flow files
//!
//! A descriptor table ("No.", "Name", "Type", "Description") lists the flow
//! columns in file order. The resolver turns it into a [`FeatureSchema`] that
//! is built once per run and never changed afterwards.

pub mod layout;
pub mod resolver;


use serde::{Deserialize, Serialize};

pub use layout::{layout_hash, LAYOUT_VERSION};
pub use resolver::{resolve, resolve_file};

/// One column of the raw flow file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntry {
    /// 1-based position in the raw file
    pub position: usize,
    pub name: String,
    pub type_hint: Option<String>,
    pub description: Option<String>,
}

/// Ordered, immutable column list. Positions are contiguous and names unique.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureSchema {
    entries: Vec<SchemaEntry>,
}

impl FeatureSchema {
    pub(crate) fn from_entries(entries: Vec<SchemaEntry>) -> Self {
        Self { entries }
    }

    /// Schema with names only
    pub fn from_names(names: &[&str]) -> Self {
        let entries = names
            .iter()
            .enumerate()
            .map(|(i, name)| SchemaEntry {
                position: i + 1,
                name: name.to_string(),
                type_hint: None,
                description: None,
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    /// Column names in positional order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.position)
    }

    pub fn layout_hash(&self) -> u32 {
        layout_hash(&self.names())
    }
}
