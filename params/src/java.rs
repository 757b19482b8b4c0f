use serde::Deserialize;

use util::is_blank;

use crate::{Error, Property, ResourceList, ResourceRef, TaskKind};

/// Parameters for running a main class on the JVM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaParameters {
    /// The jar containing the main class.
    #[serde(default)]
    pub main_jar: Option<ResourceRef>,
    #[serde(default)]
    pub main_class: Option<String>,
    /// Arguments passed to the main class.
    #[serde(default)]
    pub main_args: Option<String>,
    /// Options passed to the JVM itself.
    #[serde(default)]
    pub jvm_args: Option<String>,
    /// Additional classpath entries, in classpath order.
    #[serde(default, deserialize_with = "crate::null_default")]
    pub resource_list: ResourceList,
    #[serde(default, deserialize_with = "crate::null_default")]
    pub local_params: Vec<Property>,
}

impl JavaParameters {
    /// Check structural validity, naming the first offending field.
    pub fn check(&self) -> Result<(), Error> {
        if is_blank(self.main_class.as_deref()) {
            return Err(Error::invalid(TaskKind::Java, "mainClass", "must not be blank"));
        }
        if self.main_jar.is_none() {
            return Err(Error::invalid(TaskKind::Java, "mainJar", "must be set"));
        }
        Ok(())
    }

    pub fn validate(&self) -> bool {
        self.check().is_ok()
    }

    /// Declared resources followed by the main jar, unless it was already declared.
    pub fn resources_used(&self) -> ResourceList {
        let mut resources = self.resource_list.clone();
        if let Some(main_jar) = &self.main_jar {
            resources.push(main_jar.clone());
        }
        resources
    }
}
