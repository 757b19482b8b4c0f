use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{DataSyncParameters, Error, JavaParameters, Property, ResourceList, TaskKind};

/// Kind-specific parameters of a task; one variant per [`TaskKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskParameters {
    Java(JavaParameters),
    DataSync(DataSyncParameters),
}

impl TaskParameters {
    /// Parse raw parameters, given either as a JSON object
    /// or as a string containing one.
    pub fn parse(kind: TaskKind, raw: &Value) -> Result<Self, Error> {
        Ok(match kind {
            TaskKind::Java => Self::Java(from_raw(kind, raw)?),
            TaskKind::DataSync => Self::DataSync(from_raw(kind, raw)?),
        })
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Java(_) => TaskKind::Java,
            Self::DataSync(_) => TaskKind::DataSync,
        }
    }

    pub fn check(&self) -> Result<(), Error> {
        match self {
            Self::Java(p) => p.check(),
            Self::DataSync(p) => p.check(),
        }
    }

    pub fn validate(&self) -> bool {
        self.check().is_ok()
    }

    /// Resources the task needs on the local filesystem, in classpath order.
    pub fn resources_used(&self) -> ResourceList {
        match self {
            Self::Java(p) => p.resources_used(),
            Self::DataSync(_) => ResourceList::new(),
        }
    }

    pub fn local_params(&self) -> &[Property] {
        match self {
            Self::Java(p) => &p.local_params,
            Self::DataSync(p) => &p.local_params,
        }
    }
}

fn from_raw<T: DeserializeOwned>(kind: TaskKind, raw: &Value) -> Result<T, Error> {
    let parsed = match raw {
        Value::String(text) if text.trim().is_empty() => {
            return Err(Error::malformed(kind, "parameters are empty"));
        }
        Value::String(text) => serde_json::from_str(text),
        Value::Object(_) => serde_json::from_value(raw.clone()),
        Value::Null => return Err(Error::malformed(kind, "parameters are missing")),
        _ => return Err(Error::malformed(kind, "parameters must be a JSON object")),
    };
    parsed.map_err(|e| Error::malformed(kind, e))
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn test_object_and_string_forms_agree() -> Result<()> {
        let obj = json!({
            "mainClass": "com.acme.Main",
            "mainJar": {"id": 4, "res": "/jars/app.jar"},
            "resourceList": [{"id": 0, "res": "lib/dep.jar"}],
            "localParams": [{"prop": "x", "direct": "IN", "type": "VARCHAR", "value": "1"}]
        });
        let text = Value::String(obj.to_string());
        let a = TaskParameters::parse(TaskKind::Java, &obj)?;
        let b = TaskParameters::parse(TaskKind::Java, &text)?;
        assert_eq!(a, b);
        assert_eq!(a.kind(), TaskKind::Java);
        assert_eq!(a.local_params().len(), 1);
        assert_eq!(a.resources_used().len(), 2);
        Ok(())
    }

    #[test]
    fn test_malformed() {
        for raw in [Value::Null, json!(""), json!("{not json"), json!([1, 2]), json!({"json": 5})] {
            match TaskParameters::parse(TaskKind::DataSync, &raw) {
                Err(Error::MalformedParameters { .. }) => {}
                other => panic!("{raw} parsed as {other:?}"),
            }
        }
    }

    #[test]
    fn test_data_sync_declares_no_resources() -> Result<()> {
        let p = TaskParameters::parse(
            TaskKind::DataSync,
            &json!({"deployMode": "local", "json": "{}", "resourceList": [{"id": 3, "res": "x"}]}),
        )?;
        assert!(p.validate());
        assert!(p.resources_used().is_empty());
        Ok(())
    }
}
