use colored::Colorize;

use util::Timer;

use crate::exec::ExecutionResult;
use crate::prep::{CommandArtifact, TaskStatus};
use crate::settings::Settings;

/// All interactions with the text UI should go through this struct.
/// Everything goes to stderr; stdout belongs to the task.
pub struct Ui {
    /// -v setting, displays extra text info to user
    pub verbose: bool,
    /// keeps track of time for each step
    timer: Timer,
}

impl Ui {
    pub fn new(settings: &Settings) -> Self {
        Self {
            verbose: settings.verbose > 0,
            timer: Timer::now(),
        }
    }

    pub fn start_timer(&mut self) {
        self.timer.reset();
    }

    pub fn print_elapsed(&self, step: &str) {
        if self.verbose {
            eprintln!("{step} took {:.3}s.", self.timer.elapsed().as_secs_f64());
        }
    }

    pub fn verbose_msg(&self, msg: &str) {
        if self.verbose {
            eprintln!("{}", msg);
        }
    }

    pub fn verbose_progress(&self, msg: &str) {
        if self.verbose {
            eprint!("{}... ", msg.magenta());
        }
    }

    pub fn done(&self) {
        if self.verbose {
            eprintln!("{}.", "done".green());
        }
    }

    pub fn print_artifact(&self, artifact: &CommandArtifact) {
        match &artifact.command {
            Some(command) => eprintln!("{} {command}", "COMMAND".cyan()),
            None => eprintln!(
                "{} {} (existing script reused)",
                "SCRIPT".cyan(),
                artifact.script.display()
            ),
        }
        if self.verbose {
            eprintln!("script: {}", artifact.script.display());
            if let Some(descriptor) = &artifact.descriptor {
                eprintln!("job descriptor: {}", descriptor.display());
            }
        }
    }

    pub fn print_outcome(&self, status: TaskStatus, result: Option<&ExecutionResult>) {
        let label = match status {
            TaskStatus::Succeeded => "SUCCEEDED".green(),
            TaskStatus::Cancelled => "CANCELLED".yellow(),
            TaskStatus::Failed { .. } => "FAILED".red(),
            _ => status.to_string().to_uppercase().as_str().normal(),
        };
        match result {
            Some(result) => {
                eprintln!("{label} with exit code {}.", result.exit_code);
                if let Some(pid) = result.pid {
                    self.verbose_msg(&format!("pid: {pid}"));
                }
                for app_id in &result.app_ids {
                    eprintln!("{} {app_id}", "APPLICATION".cyan());
                }
            }
            None => eprintln!("{label}."),
        }
    }
}
