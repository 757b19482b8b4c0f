use serde::{Deserialize, Deserializer};

mod kind;
pub use kind::TaskKind;

mod resource;
pub use resource::{ResourceKey, ResourceList, ResourceRef, NO_CATALOG_ID};

mod property;
pub use property::{DataType, Direct, Property};

mod java;
pub use java::JavaParameters;

mod data_sync;
pub use data_sync::DataSyncParameters;

mod deploy;
pub use deploy::DeployMode;

mod context;
pub use context::{CommandType, ExecutionContext, TaskSpec};

mod datetime;

mod parameters;
pub use parameters::TaskParameters;

/// Merging of user-defined and business-time variables.
pub mod variables;

pub use syntax::VarMap;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Malformed {kind} task parameters: {msg}")]
    MalformedParameters { kind: String, msg: String },
    #[error("Invalid {kind} task parameters: '{field}' {reason}")]
    InvalidParameters {
        kind: TaskKind,
        field: &'static str,
        reason: String,
    },
}

impl Error {
    pub(crate) fn malformed(kind: impl ToString, msg: impl ToString) -> Self {
        Self::MalformedParameters {
            kind: kind.to_string(),
            msg: msg.to_string(),
        }
    }

    pub(crate) fn invalid(kind: TaskKind, field: &'static str, reason: impl ToString) -> Self {
        Self::InvalidParameters {
            kind,
            field,
            reason: reason.to_string(),
        }
    }
}

// orchestrators send explicit nulls for empty lists and maps.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
