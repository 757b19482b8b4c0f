/// High-level command line app
mod app;
/// Definition of command-line args
mod args;
/// Resource catalog lookups
pub mod catalog;
/// Running task scripts as subprocesses
pub mod exec;
/// Filesystem operations
pub mod fs;
/// Turning a task spec into a runnable script
pub mod prep;
/// Validated command-line settings
mod settings;
/// Text UI
mod ui;

// exported for tests:
pub use app::App;
pub use args::Args;
pub use settings::Settings;

use tracing_subscriber::{fmt, EnvFilter};

/// Env var holding a tracing filter, used when no `-v` is given.
const LOG_ENV: &str = "TASKSMITH_LOG";

/// Run the command-line app.
pub fn run() -> Result<(), anyhow::Error> {
    use clap::Parser;
    let args = Args::parse();

    // INTERPRET SETTINGS ///////////////
    let settings: Settings = args.try_into()?;

    init_logging(settings.verbose);

    // RUN THE THING /////////////////
    let app = App::new(settings);
    match app.run()? {
        prep::TaskStatus::Failed { exit_code } => Err(prep::Error::ExecutionFailure(exit_code).into()),
        _ => Ok(()),
    }
}

/// Logs go to stderr. An explicit `-v` wins over `TASKSMITH_LOG`.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
