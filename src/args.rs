use clap::{ArgAction, Parser};

use crate::prep::{DEFAULT_FLINKX_LAUNCHER, DEFAULT_JAVA_LAUNCHER};

const CMD_NAME: &str = "tsm";

/// Stores our command-line args format.
#[derive(Parser, Debug)]
#[command(name = CMD_NAME, version, about = None, long_about = None)]
pub struct Args {
    /// Task specification file (JSON)
    #[arg(short, long, value_name = "FILE")]
    #[arg(env = "TASKSMITH_TASK")]
    pub task: String,

    /// Resource catalog file (JSON array of {id, fullName})
    #[arg(short, long, value_name = "FILE")]
    #[arg(env = "TASKSMITH_CATALOG")]
    pub catalog: Option<String>,

    /// Execute directory; overrides the one in the task spec
    #[arg(short, long, value_name = "DIR")]
    #[arg(env = "TASKSMITH_EXECUTE_DIR")]
    pub execute_dir: Option<String>,

    /// Host OS the command is built for ('unix' or 'windows')
    #[arg(long, value_name = "OS")]
    #[arg(env = "TASKSMITH_TARGET_OS")]
    pub target_os: Option<String>,

    /// Launcher for JVM tasks
    #[arg(long, value_name = "CMD", default_value = DEFAULT_JAVA_LAUNCHER)]
    #[arg(env = "TASKSMITH_JAVA")]
    pub java: String,

    /// Launcher for data-sync tasks
    #[arg(long, value_name = "CMD", default_value = DEFAULT_FLINKX_LAUNCHER)]
    #[arg(env = "TASKSMITH_FLINKX")]
    pub flinkx: String,

    /// Dry run; print the command but don't write or run anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print additional debugging info (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
