use anyhow::{Context, Result};
use colored::Colorize;

use params::TaskSpec;

use crate::catalog::InMemoryCatalog;
use crate::exec::ShellExecutor;
use crate::prep::{TaskRunner, TaskStatus};
use crate::settings::Settings;
use crate::ui::Ui;

/// This struct actually runs the command-line app.
pub struct App {
    /// Interpreted command line settings
    settings: Settings,
    /// User interface
    ui: Ui,
}

impl App {
    /// Create a new `App`.
    pub fn new(settings: Settings) -> Self {
        let ui = Ui::new(&settings);
        Self { settings, ui }
    }

    /// Run one attempt of the task given in settings, returning its final status.
    pub fn run(mut self) -> Result<TaskStatus> {
        let spec = self.load_spec()?;
        let catalog = self.load_catalog()?;

        let mut runner = TaskRunner::new(
            spec,
            &catalog,
            self.settings.options.clone(),
            self.settings.dry_run,
        );

        self.ui.verbose_progress("Validating task parameters");
        runner.init()?;
        self.ui.done();

        self.ui.verbose_progress("Building task command");
        self.ui.start_timer();
        runner.build()?;
        self.ui.done();
        self.ui.print_elapsed("Building task command");

        if let Some(artifact) = runner.artifact() {
            self.ui.print_artifact(artifact);
        }

        if self.settings.dry_run {
            eprintln!("{}", "Dry run; not executing.".yellow());
            return Ok(runner.status());
        }

        eprintln!("{} {}\n", "RUN".green(), runner.spec().context.task_app_id);
        self.ui.start_timer();
        let status = runner.execute(&ShellExecutor::new())?;
        self.ui.print_elapsed("Task execution");
        self.ui.print_outcome(status, runner.result());

        Ok(status)
    }

    fn load_spec(&mut self) -> Result<TaskSpec> {
        self.ui.verbose_progress("Reading task spec");
        let text = std::fs::read_to_string(&self.settings.task)
            .with_context(|| format!("while reading task spec {:?}", self.settings.task))?;
        let mut spec = TaskSpec::from_json(&text)
            .with_context(|| format!("while parsing task spec {:?}", self.settings.task))?;
        self.ui.done();

        if let Some(dir) = &self.settings.execute_dir {
            tracing::debug!(?dir, "overriding execute directory");
            spec.context.execute_path = dir.clone();
        }
        Ok(spec)
    }

    fn load_catalog(&self) -> Result<InMemoryCatalog> {
        match &self.settings.catalog {
            Some(path) => {
                let catalog = InMemoryCatalog::from_json_file(path)?;
                tracing::debug!(entries = catalog.len(), "loaded resource catalog");
                Ok(catalog)
            }
            None => Ok(InMemoryCatalog::new()),
        }
    }
}
