use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use util::HashMap;

/// A resource as recorded in the scheduler's resource metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: i64,
    /// Path relative to the resource root, usually with a leading `/`.
    pub full_name: String,
}

impl CatalogEntry {
    pub fn new(id: i64, full_name: impl Into<String>) -> Self {
        Self {
            id,
            full_name: full_name.into(),
        }
    }
}

/// Read-only lookup of resources by catalog id.
///
/// Implementations are shared between runners, so lookups only take `&self`.
pub trait ResourceCatalog: Send + Sync {
    /// `Ok(None)` means the catalog was reachable but has no such id.
    fn lookup(&self, id: i64) -> Result<Option<CatalogEntry>>;
}

/// A catalog held entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    entries: HashMap<i64, CatalogEntry>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any previous entry with the same id.
    pub fn insert(&mut self, entry: CatalogEntry) {
        self.entries.insert(entry.id, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a JSON array of `{"id": .., "fullName": ..}` objects.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("while reading resource catalog {:?}", path))?;
        Self::from_json(&text).with_context(|| format!("while parsing resource catalog {:?}", path))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(text)?;
        Ok(entries.into_iter().collect())
    }
}

impl FromIterator<CatalogEntry> for InMemoryCatalog {
    fn from_iter<T: IntoIterator<Item = CatalogEntry>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for entry in iter {
            catalog.insert(entry);
        }
        catalog
    }
}

impl ResourceCatalog for InMemoryCatalog {
    fn lookup(&self, id: i64) -> Result<Option<CatalogEntry>> {
        Ok(self.entries.get(&id).cloned())
    }
}
