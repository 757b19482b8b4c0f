use std::convert::TryFrom;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::{datetime, Error, TaskKind, TaskParameters, VarMap};

/// A serialized task as received by a worker. Immutable once parsed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub task_type: String,
    /// Either a JSON object or a JSON-encoded string.
    #[serde(default)]
    pub task_params: serde_json::Value,
    #[serde(flatten)]
    pub context: ExecutionContext,
}

impl TaskSpec {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::malformed("task spec", e))
    }

    pub fn kind(&self) -> Result<TaskKind, Error> {
        self.task_type.parse()
    }

    /// Parse the kind-specific parameters. Doesn't validate them.
    pub fn parameters(&self) -> Result<TaskParameters, Error> {
        TaskParameters::parse(self.kind()?, &self.task_params)
    }
}

/// Everything about an attempt that isn't kind-specific.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    /// Unique id of this attempt; names every artifact it produces.
    pub task_app_id: String,
    #[serde(default)]
    pub task_name: String,
    pub execute_path: PathBuf,
    /// User-defined (global) variables.
    #[serde(default, deserialize_with = "crate::null_default")]
    pub defined_params: VarMap,
    #[serde(default, deserialize_with = "datetime::option")]
    pub schedule_time: Option<NaiveDateTime>,
    #[serde(default = "datetime::now", deserialize_with = "datetime::or_now")]
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub queue: Option<String>,
    #[serde(default)]
    pub cmd_type_if_complement: CommandType,
    /// Sourced by the generated script before the command runs.
    #[serde(default)]
    pub env_file: Option<String>,
}

impl ExecutionContext {
    /// Minimal context, mostly useful for tests and embedding.
    pub fn new(task_app_id: impl Into<String>, execute_path: impl Into<PathBuf>) -> Self {
        Self {
            task_app_id: task_app_id.into(),
            task_name: String::new(),
            execute_path: execute_path.into(),
            defined_params: VarMap::default(),
            schedule_time: None,
            start_time: datetime::now(),
            queue: None,
            cmd_type_if_complement: CommandType::default(),
            env_file: None,
        }
    }

    /// The time schedule-time expressions are expanded against:
    /// the schedule time if there is one, else the attempt's start.
    pub fn reference_time(&self) -> NaiveDateTime {
        self.schedule_time.unwrap_or(self.start_time)
    }
}

/// What triggered the workflow instance this task belongs to.
/// Codes follow the scheduler's numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "RawCommandType")]
pub enum CommandType {
    #[default]
    StartProcess,
    StartCurrentTaskProcess,
    RecoverToleranceFaultProcess,
    RecoverSuspendedProcess,
    StartFailureTaskProcess,
    ComplementData,
    Scheduler,
    RepeatRunning,
    Pause,
    Stop,
    RecoverWaitingThread,
}

impl CommandType {
    const ALL: [(CommandType, &'static str); 11] = [
        (CommandType::StartProcess, "START_PROCESS"),
        (CommandType::StartCurrentTaskProcess, "START_CURRENT_TASK_PROCESS"),
        (CommandType::RecoverToleranceFaultProcess, "RECOVER_TOLERANCE_FAULT_PROCESS"),
        (CommandType::RecoverSuspendedProcess, "RECOVER_SUSPENDED_PROCESS"),
        (CommandType::StartFailureTaskProcess, "START_FAILURE_TASK_PROCESS"),
        (CommandType::ComplementData, "COMPLEMENT_DATA"),
        (CommandType::Scheduler, "SCHEDULER"),
        (CommandType::RepeatRunning, "REPEAT_RUNNING"),
        (CommandType::Pause, "PAUSE"),
        (CommandType::Stop, "STOP"),
        (CommandType::RecoverWaitingThread, "RECOVER_WAITING_THREAD"),
    ];

    pub fn as_str(&self) -> &'static str {
        Self::ALL[self.code() as usize].1
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCommandType {
    Code(u8),
    Name(String),
}

impl TryFrom<RawCommandType> for CommandType {
    type Error = String;

    fn try_from(raw: RawCommandType) -> Result<Self, Self::Error> {
        match raw {
            RawCommandType::Code(code) => Self::ALL
                .get(code as usize)
                .map(|(cmd, _)| *cmd)
                .ok_or_else(|| format!("unknown command type code {code}")),
            // the scheduler historically spelled this one "WAITTING".
            RawCommandType::Name(name) if name.eq_ignore_ascii_case("RECOVER_WAITTING_THREAD") => {
                Ok(CommandType::RecoverWaitingThread)
            }
            RawCommandType::Name(name) => Self::ALL
                .iter()
                .find(|(_, n)| n.eq_ignore_ascii_case(&name))
                .map(|(cmd, _)| *cmd)
                .ok_or_else(|| format!("unknown command type \"{name}\"")),
        }
    }
}
