use std::fs::File;
use std::path::Path;

use anyhow::Result;

use crate::prep::TargetOs;

/// Cooperative cancellation shared between a runner and other threads
mod cancel;
pub use cancel::{CancelHandle, Terminate};

/// Run a script as a subprocess
mod run_cmd;
pub use run_cmd::ShellExecutor;

/// Exit code reported for a process killed on request.
pub const EXIT_CODE_KILL: i32 = 137;
/// Exit code reported when the process gave none (e.g. killed by a signal).
pub const EXIT_CODE_FAILURE: i32 = -1;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to start \"{program}\": {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Lost track of child process {pid}: {source}")]
    Wait {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("Output reader for child process panicked")]
    OutputReader,
}

/// Everything a [`ProcessExecutor`] needs to run one materialized script.
#[derive(Debug)]
pub struct ExecRequest<'a> {
    pub app_id: &'a str,
    pub script: &'a Path,
    pub working_dir: &'a Path,
    pub os: TargetOs,
    /// If present, process output is copied here as well as logged.
    pub log_file: Option<File>,
}

/// What came out of running a task's process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub pid: Option<u32>,
    /// YARN application ids seen in the output, in order of first appearance.
    pub app_ids: Vec<String>,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// The capability to run a script to completion.
///
/// `run` blocks until the process exits. Implementations must attach a
/// [`Terminate`] to `cancel` while the process is alive, so cancellation
/// requested from another thread reaches it.
pub trait ProcessExecutor: Send + Sync {
    fn run(&self, req: ExecRequest<'_>, cancel: &CancelHandle) -> Result<ExecutionResult>;
}
