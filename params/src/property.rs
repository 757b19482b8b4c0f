use serde::Deserialize;

/// A task-local parameter declared on the task definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Property {
    pub prop: String,
    #[serde(default)]
    pub direct: Direct,
    #[serde(default, rename = "type")]
    pub data_type: DataType,
    #[serde(default)]
    pub value: Option<String>,
}

impl Property {
    /// An input `VARCHAR` property.
    pub fn new(prop: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            prop: prop.into(),
            direct: Direct::In,
            data_type: DataType::Varchar,
            value: Some(value.into()),
        }
    }
}

/// Whether the property is consumed by the task or produced by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direct {
    #[default]
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    #[default]
    Varchar,
    Integer,
    Long,
    Float,
    Double,
    Date,
    Time,
    Timestamp,
    Boolean,
}
