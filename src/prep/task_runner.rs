use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};

use params::{variables, DataSyncParameters, JavaParameters, TaskParameters, TaskSpec, VarMap};
use syntax::resolve_all;
use util::Timer;

use crate::catalog::ResourceCatalog;
use crate::exec::{CancelHandle, ExecRequest, ExecutionResult, ProcessExecutor, EXIT_CODE_FAILURE};
use crate::fs::{FileMode, Fs};

use super::{command, Error, ResourceLocator, SynthesisOptions, TaskScriptBuilder};

/// Where a task attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Created,
    /// Parameters parsed and valid.
    Initialized,
    /// Script (and descriptor) written.
    ArtifactReady,
    Running,
    Succeeded,
    Failed { exit_code: i32 },
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed { .. } | Self::Cancelled
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Initialized => f.write_str("initialized"),
            Self::ArtifactReady => f.write_str("ready to run"),
            Self::Running => f.write_str("running"),
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed { exit_code } => write!(f, "failed (exit code {exit_code})"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// What `build` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandArtifact {
    pub script: PathBuf,
    /// Job descriptor, for data-sync tasks.
    pub descriptor: Option<PathBuf>,
    /// Command tokens in order. Empty if an existing script was reused.
    pub tokens: Vec<String>,
    /// The final command line. `None` if an existing script was reused.
    pub command: Option<String>,
}

impl CommandArtifact {
    pub fn reused(&self) -> bool {
        self.command.is_none()
    }
}

/// Owns a single attempt at running a task: `init`, then `build`, then `execute`.
///
/// Any step that fails moves the attempt to `Failed`; there is no retry.
/// Cancellation can be requested at any point, here or through a
/// [`CancelHandle`] from another thread, and turns the remaining steps into no-ops.
pub struct TaskRunner<'a> {
    spec: TaskSpec,
    catalog: &'a dyn ResourceCatalog,
    options: SynthesisOptions,
    fs: Fs,
    status: TaskStatus,
    params: Option<TaskParameters>,
    artifact: Option<CommandArtifact>,
    result: Option<ExecutionResult>,
    cancel: CancelHandle,
    span: tracing::Span,
    timer: Timer,
}

impl<'a> TaskRunner<'a> {
    pub fn new(
        spec: TaskSpec,
        catalog: &'a dyn ResourceCatalog,
        options: SynthesisOptions,
        dry_run: bool,
    ) -> Self {
        let span = tracing::info_span!(
            "task",
            app_id = %spec.context.task_app_id,
            task_type = %spec.task_type
        );
        let fs = Fs::new(&spec.context.execute_path, dry_run);
        Self {
            spec,
            catalog,
            options,
            fs,
            status: TaskStatus::Created,
            params: None,
            artifact: None,
            result: None,
            cancel: CancelHandle::new(),
            span,
            timer: Timer::now(),
        }
    }

    pub fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    pub fn status(&self) -> TaskStatus {
        if self.cancel.is_requested() && !self.status.is_terminal() {
            TaskStatus::Cancelled
        } else {
            self.status
        }
    }

    pub fn parameters(&self) -> Option<&TaskParameters> {
        self.params.as_ref()
    }

    pub fn artifact(&self) -> Option<&CommandArtifact> {
        self.artifact.as_ref()
    }

    pub fn result(&self) -> Option<&ExecutionResult> {
        self.result.as_ref()
    }

    /// A handle that can cancel this attempt from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Parse and validate the task's parameters.
    pub fn init(&mut self) -> Result<TaskStatus> {
        let span = self.span.clone();
        let _enter = span.enter();
        if !self.begin("init", TaskStatus::Created)? {
            return Ok(self.status);
        }

        let parsed = self.spec.parameters().and_then(|params| {
            params.check()?;
            Ok(params)
        });
        match parsed {
            Ok(params) => {
                tracing::debug!(resources = params.resources_used().len(), "parameters valid");
                self.params = Some(params);
                self.status = TaskStatus::Initialized;
                Ok(self.status)
            }
            Err(e) => {
                tracing::error!(error = %e, "task parameters rejected");
                self.fail();
                Err(e.into())
            }
        }
    }

    /// Resolve placeholders and resources, synthesize the command, and write
    /// the task's artifacts. If the script already exists it is reused as-is.
    pub fn build(&mut self) -> Result<TaskStatus> {
        let span = self.span.clone();
        let _enter = span.enter();
        if !self.begin("build", TaskStatus::Initialized)? {
            return Ok(self.status);
        }

        let built = self
            .fs
            .ensure_execute_dir_exists()
            .context("while preparing execute directory")
            .and_then(|_| self.materialize());
        match built {
            Ok(artifact) => {
                match &artifact.command {
                    Some(command) => tracing::info!(command = %command, "task command built"),
                    None => tracing::info!(script = ?artifact.script, "reusing existing task script"),
                }
                self.artifact = Some(artifact);
                self.status = TaskStatus::ArtifactReady;
                Ok(self.status)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to build task");
                self.fail();
                Err(e)
            }
        }
    }

    /// Run the built script to completion. Blocks the calling thread.
    pub fn execute(&mut self, executor: &dyn ProcessExecutor) -> Result<TaskStatus> {
        let span = self.span.clone();
        let _enter = span.enter();
        if !self.begin("execute", TaskStatus::ArtifactReady)? {
            return Ok(self.status);
        }

        let script = match &self.artifact {
            Some(artifact) => artifact.script.clone(),
            None => {
                self.fail();
                return Err(Error::InvalidTransition {
                    op: "execute",
                    state: TaskStatus::Initialized,
                }
                .into());
            }
        };
        let app_id = self.spec.context.task_app_id.clone();

        let log_file = if self.fs.is_dry_run() {
            None
        } else {
            match self.fs.create_file(self.fs.task_log(&app_id)) {
                Ok(file) => Some(file),
                Err(e) => {
                    self.fail();
                    return Err(e.context("while creating task log"));
                }
            }
        };

        self.status = TaskStatus::Running;
        self.timer.reset();
        tracing::info!(?script, "running task");

        let req = ExecRequest {
            app_id: &app_id,
            script: &script,
            working_dir: self.fs.execute_dir(),
            os: self.options.os,
            log_file,
        };
        match executor.run(req, &self.cancel) {
            Ok(result) => {
                self.status = if self.cancel.is_requested() {
                    TaskStatus::Cancelled
                } else if result.success() {
                    TaskStatus::Succeeded
                } else {
                    TaskStatus::Failed {
                        exit_code: result.exit_code,
                    }
                };
                tracing::info!(
                    exit_code = result.exit_code,
                    elapsed_ms = self.timer.elapsed_ms(),
                    status = %self.status,
                    "task finished"
                );
                self.result = Some(result);
                Ok(self.status)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to run task");
                self.fail();
                Err(e.context("while running task process"))
            }
        }
    }

    /// Request cancellation. Idempotent; an attempt that already finished keeps its status.
    pub fn cancel(&mut self) -> TaskStatus {
        let span = self.span.clone();
        let _enter = span.enter();
        if self.status.is_terminal() && self.status != TaskStatus::Cancelled {
            tracing::debug!(status = %self.status, "task already finished, ignoring cancel");
            return self.status;
        }
        if self.cancel.cancel() {
            tracing::info!(status = %self.status, "task cancelled");
        }
        self.status = TaskStatus::Cancelled;
        self.status
    }

    /// Returns false if the attempt was cancelled and `op` should do nothing.
    fn begin(&mut self, op: &'static str, expected: TaskStatus) -> Result<bool, Error> {
        if self.cancel.is_requested() && !self.status.is_terminal() {
            self.status = TaskStatus::Cancelled;
        }
        if self.status == TaskStatus::Cancelled {
            tracing::debug!(op, "task cancelled, skipping");
            return Ok(false);
        }
        if self.status != expected {
            return Err(Error::InvalidTransition {
                op,
                state: self.status,
            });
        }
        Ok(true)
    }

    fn fail(&mut self) {
        self.status = TaskStatus::Failed {
            exit_code: EXIT_CODE_FAILURE,
        };
    }
}

// BUILDING ////////////////
impl TaskRunner<'_> {
    fn materialize(&self) -> Result<CommandArtifact> {
        let params = self.params.as_ref().ok_or(Error::InvalidTransition {
            op: "build",
            state: TaskStatus::Created,
        })?;
        let ctx = &self.spec.context;
        let app_id = ctx.task_app_id.as_str();
        let script = self.fs.script(app_id, self.options.os);
        let descriptor = match params {
            TaskParameters::DataSync(_) => Some(self.fs.job_descriptor(app_id)),
            TaskParameters::Java(_) => None,
        };

        if self.fs.exists(&script) {
            return Ok(CommandArtifact {
                script,
                descriptor,
                tokens: Vec::with_capacity(0),
                command: None,
            });
        }

        let vars = variables::merge(ctx, params.local_params())
            .context("while resolving task variables")?;

        let tokens = match params {
            TaskParameters::Java(p) => self.java_tokens(p, &vars)?,
            TaskParameters::DataSync(p) => self.data_sync_tokens(p, &vars)?,
        };
        let command = command::finish_command(&tokens, &ctx.defined_params)
            .context("while resolving task command")?;

        let mut strbuf = String::with_capacity(command.len() + 128);
        let mut builder = TaskScriptBuilder::new(&mut strbuf, self.options.os);
        builder.write_prefix();
        if let Some(env_file) = util::non_blank(ctx.env_file.as_deref()) {
            builder.write_env_file(env_file);
        }
        builder.write_command(&command);

        let written = self
            .fs
            .materialize(&script, FileMode::Executable, || Ok(strbuf))
            .context("while writing task script")?;

        // another attempt with this app id wrote the script first; report its file, not our command.
        if !written.created && !self.fs.is_dry_run() {
            tracing::debug!(?script, "task script written concurrently, reusing");
            return Ok(CommandArtifact {
                script,
                descriptor,
                tokens: Vec::with_capacity(0),
                command: None,
            });
        }

        Ok(CommandArtifact {
            script,
            descriptor,
            tokens,
            command: Some(command),
        })
    }

    fn java_tokens(&self, p: &JavaParameters, vars: &VarMap) -> Result<Vec<String>> {
        let time = self.spec.context.reference_time();
        let resolve = |field: &Option<String>| {
            resolve_all(field.as_deref().unwrap_or_default(), vars, time)
                .context("while resolving task arguments")
        };

        let paths = ResourceLocator::new(self.catalog).resolve_list(&p.resources_used())?;
        let classpath = command::join_classpath(&paths, self.options.os);

        Ok(command::java_tokens(
            &self.options,
            &resolve(&p.jvm_args)?,
            &classpath,
            p.main_class.as_deref().unwrap_or_default(),
            &resolve(&p.main_args)?,
        ))
    }

    fn data_sync_tokens(&self, p: &DataSyncParameters, vars: &VarMap) -> Result<Vec<String>> {
        let ctx = &self.spec.context;
        let mode = p.deploy_mode()?;
        let descriptor = self.fs.job_descriptor(&ctx.task_app_id);

        // mode first: one we can't use must not leave a descriptor behind.
        let tokens = command::data_sync_tokens(
            &self.options,
            &descriptor,
            mode,
            p.queue(ctx.queue.as_deref()),
        );

        let time = ctx.reference_time();
        self.fs
            .materialize(&descriptor, FileMode::Data, || {
                let body = p.json.as_deref().unwrap_or_default().replace("\r\n", "\n");
                Ok(resolve_all(&body, vars, time)?)
            })
            .context("while writing job descriptor")?;

        Ok(tokens)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::{CatalogEntry, InMemoryCatalog};
    use crate::prep::TargetOs;
    use serde_json::{json, Value};
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    /// Records what it was asked to run instead of running it.
    struct FakeExecutor {
        exit_code: i32,
        cancel_during_run: bool,
        scripts: Mutex<Vec<String>>,
    }

    impl FakeExecutor {
        fn exiting(exit_code: i32) -> Self {
            Self {
                exit_code,
                cancel_during_run: false,
                scripts: Mutex::new(Vec::new()),
            }
        }
    }

    impl ProcessExecutor for FakeExecutor {
        fn run(&self, req: ExecRequest<'_>, cancel: &CancelHandle) -> Result<ExecutionResult> {
            self.scripts
                .lock()
                .unwrap()
                .push(std::fs::read_to_string(req.script)?);
            if self.cancel_during_run {
                cancel.cancel();
            }
            Ok(ExecutionResult {
                exit_code: self.exit_code,
                pid: Some(4242),
                app_ids: vec!["application_1_0001".to_owned()],
            })
        }
    }

    fn catalog() -> InMemoryCatalog {
        [CatalogEntry::new(1, "/jars/dep.jar"), CatalogEntry::new(2, "/jars/app.jar")]
            .into_iter()
            .collect()
    }

    fn unix() -> SynthesisOptions {
        SynthesisOptions {
            os: TargetOs::Unix,
            ..Default::default()
        }
    }

    fn spec(dir: &Path, task_type: &str, params: Value, extra: Value) -> TaskSpec {
        let mut spec = json!({
            "taskType": task_type,
            "taskAppId": "7_8_9",
            "executePath": dir.join("exec"),
            "scheduleTime": "2024-03-15 02:30:00",
            "taskParams": params,
        });
        if let (Some(obj), Value::Object(extra)) = (spec.as_object_mut(), extra) {
            obj.extend(extra);
        }
        TaskSpec::from_json(&spec.to_string()).unwrap()
    }

    fn java_params() -> Value {
        json!({
            "mainClass": "com.acme.Main",
            "mainJar": {"id": 0, "res": "lib/app.jar"},
            "jvmArgs": "-Xmx512m",
            "mainArgs": "--flag",
        })
    }

    fn yarn_params(mode: &str) -> Value {
        json!({"deployMode": mode, "json": "{\"job\": {}}"})
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    fn built<'a>(runner: &'a mut TaskRunner) -> Result<&'a CommandArtifact> {
        runner.init()?;
        runner.build()?;
        Ok(runner.artifact().unwrap())
    }

    fn setup() -> Result<(TempDir, InMemoryCatalog)> {
        Ok((tempdir()?, catalog()))
    }

    #[test]
    fn test_java_command() -> Result<()> {
        let (dir, catalog) = setup()?;
        let mut runner = TaskRunner::new(spec(dir.path(), "JAVA", java_params(), json!({})), &catalog, unix(), false);
        let artifact = built(&mut runner)?;

        assert_eq!(
            artifact.command.as_deref(),
            Some("$JAVA_HOME/bin/java -Xmx512m -classpath lib/app.jar com.acme.Main --flag")
        );
        assert!(artifact.script.ends_with("7_8_9_node.sh"));
        assert!(artifact.descriptor.is_none());

        let script = std::fs::read_to_string(&artifact.script)?;
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.ends_with("com.acme.Main --flag\n"));
        assert_eq!(runner.status(), TaskStatus::ArtifactReady);
        Ok(())
    }

    #[test]
    fn test_java_classpath_and_variables() -> Result<()> {
        let (dir, catalog) = setup()?;
        let params = json!({
            "mainClass": "com.acme.Main",
            "mainJar": {"id": 2, "res": "app.jar"},
            "resourceList": [{"id": 1, "res": "dep.jar"}, {"id": 2, "res": "app.jar"}],
            "mainArgs": "--day ${system.biz.date} --out ${out} --month $[yyyyMM]",
            "localParams": [{"prop": "out", "direct": "IN", "type": "VARCHAR", "value": "${root}/x"}],
        });
        let extra = json!({"definedParams": {"root": "/data"}, "envFile": "/opt/env.sh"});
        let mut runner = TaskRunner::new(spec(dir.path(), "java", params, extra), &catalog, unix(), false);
        let artifact = built(&mut runner)?;

        assert_eq!(
            artifact.command.as_deref(),
            Some("$JAVA_HOME/bin/java -classpath jars/dep.jar:jars/app.jar com.acme.Main --day 20240314 --out /data/x --month 202403")
        );
        let script = std::fs::read_to_string(&artifact.script)?;
        assert!(script.contains("\n. /opt/env.sh\n"));
        Ok(())
    }

    #[test]
    fn test_windows_classpath() -> Result<()> {
        let (dir, catalog) = setup()?;
        let params = json!({
            "mainClass": "Main",
            "mainJar": {"id": 0, "res": "app.jar"},
            "resourceList": [{"id": 0, "res": "dep.jar"}],
        });
        let opts = SynthesisOptions {
            os: TargetOs::Windows,
            ..Default::default()
        };
        let mut runner = TaskRunner::new(spec(dir.path(), "JAVA", params, json!({})), &catalog, opts, false);
        let artifact = built(&mut runner)?;
        assert!(artifact.command.as_deref().unwrap().contains("-classpath dep.jar;app.jar Main"));
        assert!(artifact.script.ends_with("7_8_9_node.bat"));
        Ok(())
    }

    #[test]
    fn test_data_sync_yarn() -> Result<()> {
        let (dir, catalog) = setup()?;
        let extra = json!({"queue": "default"});
        let mut runner = TaskRunner::new(spec(dir.path(), "FLINKX", yarn_params("yarn"), extra), &catalog, unix(), false);
        let artifact = built(&mut runner)?.clone();

        let descriptor = artifact.descriptor.clone().unwrap();
        assert!(descriptor.ends_with("7_8_9_flinkx_job.json"));
        assert_eq!(std::fs::read_to_string(&descriptor)?, "{\"job\": {}}");
        assert_eq!(
            artifact.command.unwrap(),
            format!(
                "${{FLINKX_HOME}}/bin/flinkx -job {} -pluginRoot ${{FLINKX_HOME}}/syncplugins \
                 -mode yarn -flinkconf ${{FLINK_CONF_DIR}} -yarnconf ${{HADOOP_CONF_DIR}} -queue default",
                descriptor.display()
            )
        );
        Ok(())
    }

    #[test]
    fn test_descriptor_body_resolved() -> Result<()> {
        let (dir, catalog) = setup()?;
        let params = json!({
            "deployMode": "local",
            "json": "{\r\n  \"day\": \"${system.biz.date}\",\r\n  \"month\": \"$[yyyyMM]\",\r\n  \"x\": \"${x}\"\r\n}",
            "localParams": [{"prop": "x", "value": "local"}],
        });
        let mut runner = TaskRunner::new(spec(dir.path(), "FLINKX", params, json!({})), &catalog, unix(), false);
        let artifact = built(&mut runner)?;
        let body = std::fs::read_to_string(artifact.descriptor.as_ref().unwrap())?;
        assert_eq!(body, "{\n  \"day\": \"20240314\",\n  \"month\": \"202403\",\n  \"x\": \"local\"\n}");
        Ok(())
    }

    #[test]
    fn test_unknown_mode_writes_nothing() -> Result<()> {
        let (dir, catalog) = setup()?;
        let extra = json!({"queue": "default"});
        let mut runner = TaskRunner::new(spec(dir.path(), "FLINKX", yarn_params("Bogus"), extra), &catalog, unix(), false);
        assert_eq!(runner.init()?, TaskStatus::Initialized);

        let err = runner.build().unwrap_err();
        match err.downcast_ref::<params::Error>() {
            Some(params::Error::InvalidParameters { field, .. }) => assert_eq!(*field, "deployMode"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(entries(&dir.path().join("exec")), 0);
        assert_eq!(runner.status(), TaskStatus::Failed { exit_code: EXIT_CODE_FAILURE });
        Ok(())
    }

    #[test]
    fn test_yarn_queue() -> Result<()> {
        let (dir, catalog) = setup()?;
        let mut runner = TaskRunner::new(spec(dir.path(), "FLINKX", yarn_params("YarnPerJob"), json!({})), &catalog, unix(), false);
        let artifact = built(&mut runner)?;
        let command = artifact.command.as_deref().unwrap();
        assert!(command.ends_with("-flinkLibJar ${FLINK_HOME}/lib"));
        assert!(!command.contains("-queue"));
        assert_eq!(runner.status(), TaskStatus::ArtifactReady);

        // the task's own queue is used when the context has none.
        let dir = tempdir()?;
        let mut params = yarn_params("YarnPerJob");
        params["queue"] = json!("etl");
        let mut runner = TaskRunner::new(spec(dir.path(), "FLINKX", params, json!({})), &catalog, unix(), false);
        let artifact = built(&mut runner)?;
        assert!(artifact.command.as_deref().unwrap().ends_with("-mode yarnPer -yarnconf ${HADOOP_CONF_DIR} -flinkLibJar ${FLINK_HOME}/lib -queue etl"));
        Ok(())
    }

    #[test]
    fn test_rebuild_reuses_artifacts() -> Result<()> {
        let (dir, catalog) = setup()?;
        let extra = json!({"queue": "default"});
        let mut first = TaskRunner::new(spec(dir.path(), "FLINKX", yarn_params("yarn"), extra.clone()), &catalog, unix(), false);
        let artifact = built(&mut first)?.clone();
        let script = std::fs::read(&artifact.script)?;
        let descriptor = std::fs::read(artifact.descriptor.as_ref().unwrap())?;

        // same app id, different parameters: nothing is recomputed.
        let changed = json!({"deployMode": "local", "json": "{\"other\": true}"});
        let mut second = TaskRunner::new(spec(dir.path(), "FLINKX", changed, extra), &catalog, unix(), false);
        let reused = built(&mut second)?;
        assert!(reused.reused());
        assert_eq!(reused.script, artifact.script);
        assert_eq!(std::fs::read(&reused.script)?, script);
        assert_eq!(std::fs::read(reused.descriptor.as_ref().unwrap())?, descriptor);
        Ok(())
    }

    #[test]
    fn test_concurrent_builds_report_written_command() -> Result<()> {
        for _ in 0..20 {
            let (dir, catalog) = setup()?;
            let artifacts = std::thread::scope(|scope| {
                let handles: Vec<_> = (0..4)
                    .map(|i| {
                        let spec = spec(dir.path(), "JAVA", java_params(), json!({}));
                        let options = SynthesisOptions {
                            java_launcher: format!("java{i}"),
                            ..unix()
                        };
                        let catalog = &catalog;
                        scope.spawn(move || -> Result<CommandArtifact> {
                            let mut runner = TaskRunner::new(spec, catalog, options, false);
                            Ok(built(&mut runner)?.clone())
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().expect("builder thread panicked"))
                    .collect::<Result<Vec<_>>>()
            })?;

            let script = std::fs::read_to_string(&artifacts[0].script)?;
            let written: Vec<_> = artifacts.iter().filter(|a| !a.reused()).collect();
            assert_eq!(written.len(), 1);
            assert!(!written[0].tokens.is_empty());
            assert!(script.contains(written[0].command.as_deref().unwrap()));
            for artifact in artifacts.iter().filter(|a| a.reused()) {
                assert!(artifact.tokens.is_empty());
                assert_eq!(artifact.script, written[0].script);
            }
        }
        Ok(())
    }

    #[test]
    fn test_resource_not_found() -> Result<()> {
        let (dir, catalog) = setup()?;
        let params = json!({"mainClass": "Main", "mainJar": {"id": 99, "res": "gone.jar"}});
        let mut runner = TaskRunner::new(spec(dir.path(), "JAVA", params, json!({})), &catalog, unix(), false);
        runner.init()?;
        let err = runner.build().unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::ResourceNotFound(99))));
        assert_eq!(entries(&dir.path().join("exec")), 0);
        Ok(())
    }

    #[test]
    fn test_init_rejects_bad_parameters() -> Result<()> {
        let (dir, catalog) = setup()?;
        let mut runner = TaskRunner::new(spec(dir.path(), "JAVA", json!(""), json!({})), &catalog, unix(), false);
        let err = runner.init().unwrap_err();
        assert!(matches!(err.downcast_ref::<params::Error>(), Some(params::Error::MalformedParameters { .. })));
        assert!(runner.status().is_terminal());

        let params = json!({"mainClass": " ", "mainJar": {"id": 0, "res": "a.jar"}});
        let mut runner = TaskRunner::new(spec(dir.path(), "JAVA", params, json!({})), &catalog, unix(), false);
        let err = runner.init().unwrap_err();
        match err.downcast_ref::<params::Error>() {
            Some(params::Error::InvalidParameters { field, .. }) => assert_eq!(*field, "mainClass"),
            other => panic!("unexpected {other:?}"),
        }
        // a failed attempt can't be continued.
        assert!(runner.build().is_err());
        Ok(())
    }

    #[test]
    fn test_out_of_order() -> Result<()> {
        let (dir, catalog) = setup()?;
        let mut runner = TaskRunner::new(spec(dir.path(), "JAVA", java_params(), json!({})), &catalog, unix(), false);
        let err = runner.build().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidTransition { op: "build", state: TaskStatus::Created })
        ));
        runner.init()?;
        let executor = FakeExecutor::exiting(0);
        assert!(runner.execute(&executor).is_err());
        assert!(runner.init().is_err());
        Ok(())
    }

    #[test]
    fn test_execute_outcomes() -> Result<()> {
        let (dir, catalog) = setup()?;
        let mut runner = TaskRunner::new(spec(dir.path(), "JAVA", java_params(), json!({})), &catalog, unix(), false);
        built(&mut runner)?;
        let executor = FakeExecutor::exiting(0);
        assert_eq!(runner.execute(&executor)?, TaskStatus::Succeeded);
        let result = runner.result().unwrap();
        assert_eq!(result.pid, Some(4242));
        assert_eq!(result.app_ids, vec!["application_1_0001"]);
        assert!(executor.scripts.lock().unwrap()[0].contains("com.acme.Main --flag"));
        assert!(dir.path().join("exec/7_8_9.log").exists());

        let dir = tempdir()?;
        let mut runner = TaskRunner::new(spec(dir.path(), "JAVA", java_params(), json!({})), &catalog, unix(), false);
        built(&mut runner)?;
        assert_eq!(
            runner.execute(&FakeExecutor::exiting(3))?,
            TaskStatus::Failed { exit_code: 3 }
        );
        Ok(())
    }

    #[test]
    fn test_cancel_during_execute() -> Result<()> {
        let (dir, catalog) = setup()?;
        let mut runner = TaskRunner::new(spec(dir.path(), "JAVA", java_params(), json!({})), &catalog, unix(), false);
        built(&mut runner)?;
        let executor = FakeExecutor {
            cancel_during_run: true,
            ..FakeExecutor::exiting(137)
        };
        assert_eq!(runner.execute(&executor)?, TaskStatus::Cancelled);
        assert_eq!(runner.cancel(), TaskStatus::Cancelled);
        Ok(())
    }

    #[test]
    fn test_cancel_before_build() -> Result<()> {
        let (dir, catalog) = setup()?;
        let mut runner = TaskRunner::new(spec(dir.path(), "JAVA", java_params(), json!({})), &catalog, unix(), false);
        runner.init()?;
        runner.cancel_handle().cancel();
        assert_eq!(runner.status(), TaskStatus::Cancelled);
        assert_eq!(runner.build()?, TaskStatus::Cancelled);
        assert!(runner.artifact().is_none());
        assert_eq!(entries(&dir.path().join("exec")), 0);

        let executor = FakeExecutor::exiting(0);
        assert_eq!(runner.execute(&executor)?, TaskStatus::Cancelled);
        assert!(executor.scripts.lock().unwrap().is_empty());
        Ok(())
    }

    #[test]
    fn test_cancel_after_success_is_ignored() -> Result<()> {
        let (dir, catalog) = setup()?;
        let mut runner = TaskRunner::new(spec(dir.path(), "JAVA", java_params(), json!({})), &catalog, unix(), false);
        built(&mut runner)?;
        runner.execute(&FakeExecutor::exiting(0))?;
        assert_eq!(runner.cancel(), TaskStatus::Succeeded);
        assert_eq!(runner.status(), TaskStatus::Succeeded);
        Ok(())
    }

    #[test]
    fn test_dry_run_builds_without_writing() -> Result<()> {
        let (dir, catalog) = setup()?;
        let mut runner = TaskRunner::new(spec(dir.path(), "JAVA", java_params(), json!({})), &catalog, unix(), true);
        let artifact = built(&mut runner)?;
        assert!(artifact.command.is_some());
        assert!(!dir.path().join("exec").exists());
        Ok(())
    }
}
