use anyhow::{Context, Result};

use params::{ResourceList, ResourceRef};

use crate::catalog::ResourceCatalog;

use super::Error;

/// Resolves resource references to the paths a task uses them by.
pub struct ResourceLocator<'a> {
    catalog: &'a dyn ResourceCatalog,
}

impl<'a> ResourceLocator<'a> {
    pub fn new(catalog: &'a dyn ResourceCatalog) -> Self {
        Self { catalog }
    }

    /// Literal references come back unchanged; catalog references become the
    /// entry's full name relative to the execute directory.
    pub fn resolve(&self, resource: &ResourceRef) -> Result<String> {
        if resource.is_literal() {
            return Ok(resource.res.clone());
        }
        let id = resource.id;
        let entry = self
            .catalog
            .lookup(id)
            .with_context(|| format!("while looking up resource id {id}"))?;
        match entry {
            Some(entry) => {
                let path = entry.full_name.strip_prefix('/').unwrap_or(&entry.full_name);
                tracing::debug!(resource_id = id, path, "resolved resource");
                Ok(path.to_owned())
            }
            None => {
                tracing::error!(resource_id = id, "resource not found in catalog");
                Err(Error::ResourceNotFound(id).into())
            }
        }
    }

    /// Resolve every resource, keeping list order.
    pub fn resolve_list(&self, resources: &ResourceList) -> Result<Vec<String>> {
        resources.iter().map(|r| self.resolve(r)).collect()
    }
}
