use std::fmt;
use std::str::FromStr;

use crate::{Error, TaskKind};

/// Where a data-sync job is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeployMode {
    /// Local process.
    Local,
    /// Standalone Flink cluster.
    Standalone,
    /// Shared YARN session.
    Yarn,
    /// Dedicated YARN cluster per job.
    YarnPerJob,
}

impl DeployMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployMode::Local => "Local",
            DeployMode::Standalone => "Standalone",
            DeployMode::Yarn => "Yarn",
            DeployMode::YarnPerJob => "YarnPerJob",
        }
    }

    /// YARN submissions need a target queue.
    pub fn needs_queue(&self) -> bool {
        matches!(self, DeployMode::Yarn | DeployMode::YarnPerJob)
    }
}

impl fmt::Display for DeployMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeployMode {
    type Err = Error;

    /// Exact, case-insensitive. There is no fallback mode.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const MODES: [(&str, DeployMode); 5] = [
            ("Local", DeployMode::Local),
            ("Standalone", DeployMode::Standalone),
            ("Yarn", DeployMode::Yarn),
            ("YarnPerJob", DeployMode::YarnPerJob),
            ("YarnPer", DeployMode::YarnPerJob),
        ];
        MODES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|(_, mode)| *mode)
            .ok_or_else(|| {
                Error::invalid(
                    TaskKind::DataSync,
                    "deployMode",
                    format!("has unrecognized value \"{s}\""),
                )
            })
    }
}
