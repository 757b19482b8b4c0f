use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Discriminator selecting which parameter schema and command rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Run a main class from a jar on the JVM.
    Java,
    /// Submit a FlinkX data-sync job.
    DataSync,
}

impl TaskKind {
    /// The `taskType` tag used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Java => "JAVA",
            TaskKind::DataSync => "FLINKX",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("JAVA") {
            Ok(TaskKind::Java)
        } else if s.eq_ignore_ascii_case("FLINKX") {
            Ok(TaskKind::DataSync)
        } else {
            Err(Error::malformed(s, "unknown task type"))
        }
    }
}
