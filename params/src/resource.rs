use std::fmt;

use serde::Deserialize;

/// Resource id meaning "no catalog entry; `res` is already a path".
pub const NO_CATALOG_ID: i64 = 0;

/// Reference to a binary artifact (jar, config file) used by a task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceRef {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub res: String,
}

/// Identity of a resource, used to suppress duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey<'a> {
    Catalog(i64),
    Literal(&'a str),
}

impl ResourceRef {
    /// A reference that is already a path.
    pub fn literal(path: impl Into<String>) -> Self {
        Self {
            id: NO_CATALOG_ID,
            res: path.into(),
        }
    }

    /// A reference that must be looked up in the resource catalog.
    pub fn catalog(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            res: name.into(),
        }
    }

    pub fn is_literal(&self) -> bool {
        self.id == NO_CATALOG_ID
    }

    pub fn key(&self) -> ResourceKey<'_> {
        if self.is_literal() {
            ResourceKey::Literal(&self.res)
        } else {
            ResourceKey::Catalog(self.id)
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_literal() {
            write!(f, "resource '{}'", self.res)
        } else {
            write!(f, "resource id {}", self.id)
        }
    }
}

/// Ordered list of resources with duplicates (by identity) suppressed.
/// Order matters: it becomes classpath order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<Option<ResourceRef>>")]
pub struct ResourceList {
    items: Vec<ResourceRef>,
}

impl ResourceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `resource` unless one with the same identity is present.
    /// Returns true if it was added.
    pub fn push(&mut self, resource: ResourceRef) -> bool {
        if self.contains(&resource) {
            false
        } else {
            self.items.push(resource);
            true
        }
    }

    pub fn contains(&self, resource: &ResourceRef) -> bool {
        let key = resource.key();
        self.items.iter().any(|r| r.key() == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceRef> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<Vec<Option<ResourceRef>>> for ResourceList {
    fn from(items: Vec<Option<ResourceRef>>) -> Self {
        items.into_iter().flatten().collect()
    }
}

impl FromIterator<ResourceRef> for ResourceList {
    fn from_iter<T: IntoIterator<Item = ResourceRef>>(iter: T) -> Self {
        let mut list = Self::new();
        for resource in iter {
            list.push(resource);
        }
        list
    }
}

impl<'a> IntoIterator for &'a ResourceList {
    type Item = &'a ResourceRef;
    type IntoIter = std::slice::Iter<'a, ResourceRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
