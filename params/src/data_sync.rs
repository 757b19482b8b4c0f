use serde::Deserialize;

use util::{is_blank, non_blank};

use crate::{DeployMode, Error, Property, TaskKind};

/// Parameters for a FlinkX data-sync job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSyncParameters {
    #[serde(default)]
    pub deploy_mode: Option<String>,
    /// Inline job descriptor.
    #[serde(default)]
    pub json: Option<String>,
    /// Used only when the execution context doesn't name a queue.
    #[serde(default)]
    pub queue: Option<String>,
    #[serde(default, deserialize_with = "crate::null_default")]
    pub local_params: Vec<Property>,
}

impl DataSyncParameters {
    /// Check structural validity, naming the first offending field.
    /// Note that an unrecognized deploy mode passes here; it is rejected
    /// when the mode is actually needed, by [`DataSyncParameters::deploy_mode`].
    pub fn check(&self) -> Result<(), Error> {
        if is_blank(self.deploy_mode.as_deref()) {
            return Err(Error::invalid(TaskKind::DataSync, "deployMode", "must not be blank"));
        }
        if is_blank(self.json.as_deref()) {
            return Err(Error::invalid(TaskKind::DataSync, "json", "must not be blank"));
        }
        Ok(())
    }

    pub fn validate(&self) -> bool {
        self.check().is_ok()
    }

    pub fn deploy_mode(&self) -> Result<DeployMode, Error> {
        match non_blank(self.deploy_mode.as_deref()) {
            Some(mode) => mode.parse(),
            None => Err(Error::invalid(TaskKind::DataSync, "deployMode", "must not be blank")),
        }
    }

    /// The queue a YARN submission targets: the context's queue if it has
    /// one, otherwise the one declared on the task.
    pub fn queue<'a>(&'a self, context_queue: Option<&'a str>) -> Option<&'a str> {
        non_blank(context_queue).or_else(|| non_blank(self.queue.as_deref()))
    }
}
