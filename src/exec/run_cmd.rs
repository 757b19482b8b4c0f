use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use regex::Regex;

use crate::prep::TargetOs;

use super::{
    CancelHandle, Error, ExecRequest, ExecutionResult, ProcessExecutor, Terminate,
    EXIT_CODE_FAILURE, EXIT_CODE_KILL,
};

static YARN_APP_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"application_\d+_\d+").expect("valid app id regex"));

const POLL_INTERVAL: Duration = Duration::from_millis(50);

type SharedLog = Arc<Mutex<File>>;

/// Runs scripts with the platform shell, in their own process group, logging
/// each line of output and copying it to the task's log file.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    poll_interval: Duration,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
        }
    }
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessExecutor for ShellExecutor {
    fn run(&self, req: ExecRequest<'_>, cancel: &CancelHandle) -> Result<ExecutionResult> {
        let mut cmd = shell_command(req.os, req.script);
        cmd.current_dir(req.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| Error::Spawn {
            program: format!("{:?} {:?}", cmd.get_program(), req.script),
            source,
        })?;
        let pid = child.id();
        tracing::info!(pid, script = ?req.script, "process started");

        let log = req.log_file.map(|f| Arc::new(Mutex::new(f)));
        let readers: Vec<_> = [
            child.stdout.take().map(|s| read_output(s, "stdout", log.clone())),
            child.stderr.take().map(|s| read_output(s, "stderr", log.clone())),
        ]
        .into_iter()
        .flatten()
        .collect();

        let process = Arc::new(ChildProcess {
            pid,
            child: Mutex::new(child),
        });
        cancel.attach(process.clone());
        let status = self.wait(&process, pid);
        cancel.detach();
        let status = status?;

        let mut app_ids = Vec::new();
        for reader in readers {
            for id in reader.join().map_err(|_| Error::OutputReader)? {
                if !app_ids.contains(&id) {
                    app_ids.push(id);
                }
            }
        }

        let exit_code = if cancel.is_requested() && !status.success() {
            EXIT_CODE_KILL
        } else {
            status.code().unwrap_or(EXIT_CODE_FAILURE)
        };
        tracing::info!(pid, exit_code, app_ids = ?app_ids, "process finished");

        Ok(ExecutionResult {
            exit_code,
            pid: Some(pid),
            app_ids,
        })
    }
}

impl ShellExecutor {
    fn wait(&self, process: &ChildProcess, pid: u32) -> Result<std::process::ExitStatus, Error> {
        loop {
            match process.lock().try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(source) => return Err(Error::Wait { pid, source }),
            }
            thread::sleep(self.poll_interval);
        }
    }
}

fn shell_command(os: TargetOs, script: &Path) -> Command {
    match os {
        TargetOs::Unix => {
            let mut cmd = Command::new("sh");
            cmd.arg(script);
            #[cfg(unix)]
            {
                use std::os::unix::process::CommandExt;
                // own process group, so cancelling reaches everything the script starts.
                cmd.process_group(0);
            }
            cmd
        }
        TargetOs::Windows => {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(script);
            cmd
        }
    }
}

/// Log each line of `stream` and copy it to `log`, collecting YARN app ids.
fn read_output<R>(stream: R, name: &'static str, log: Option<SharedLog>) -> JoinHandle<Vec<String>>
where
    R: Read + Send + 'static,
{
    let span = tracing::Span::current();
    thread::spawn(move || {
        span.in_scope(|| {
            let mut app_ids = Vec::new();
            let mut reader = BufReader::new(stream);
            let mut buf = Vec::with_capacity(256);
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(stream = name, error = %e, "error reading process output");
                        break;
                    }
                }
                if let Some(log) = &log {
                    let mut file = log.lock().unwrap_or_else(PoisonError::into_inner);
                    if let Err(e) = file.write_all(&buf) {
                        tracing::warn!(error = %e, "error writing task log");
                    }
                }
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']);
                tracing::info!(target: "tasksmith::output", stream = name, "{line}");
                for m in YARN_APP_ID.find_iter(line) {
                    if !app_ids.iter().any(|id| id == m.as_str()) {
                        app_ids.push(m.as_str().to_owned());
                    }
                }
            }
            app_ids
        })
    })
}

struct ChildProcess {
    pid: u32,
    child: Mutex<Child>,
}

impl ChildProcess {
    fn lock(&self) -> std::sync::MutexGuard<'_, Child> {
        self.child.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Terminate for ChildProcess {
    fn terminate(&self) -> std::io::Result<()> {
        tracing::info!(pid = self.pid, "killing process");
        if kill_tree(self.pid) {
            return Ok(());
        }
        self.lock().kill()
    }
}

/// Kill the process and everything it started. False if that didn't work.
fn kill_tree(pid: u32) -> bool {
    let status = if cfg!(windows) {
        Command::new("taskkill")
            .args(["/F", "/T", "/PID", &pid.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
    } else {
        Command::new("sh")
            .arg("-c")
            .arg(format!("kill -9 -{pid}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
    };
    matches!(status, Ok(s) if s.success())
}

#[cfg(all(test, unix))]
mod test {
    use super::*;
    use anyhow::Result;
    use std::time::Instant;
    use tempfile::tempdir;

    fn write_script(dir: &Path, body: &str) -> Result<std::path::PathBuf> {
        let path = dir.join("1_1_1_node.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
        Ok(path)
    }

    fn request<'a>(script: &'a Path, dir: &'a Path, log: Option<File>) -> ExecRequest<'a> {
        ExecRequest {
            app_id: "1_1_1",
            script,
            working_dir: dir,
            os: TargetOs::Unix,
            log_file: log,
        }
    }

    #[test]
    fn test_exit_code_and_log() -> Result<()> {
        let dir = tempdir()?;
        let script = write_script(
            dir.path(),
            "echo hello\necho Submitted application application_1700000000000_0042 >&2\necho again application_1700000000000_0042\nexit 3",
        )?;
        let log_path = dir.path().join("1_1_1.log");
        let log = File::create(&log_path)?;

        let result = ShellExecutor::new().run(
            request(&script, dir.path(), Some(log)),
            &CancelHandle::new(),
        )?;

        assert_eq!(result.exit_code, 3);
        assert!(result.pid.is_some());
        assert_eq!(result.app_ids, vec!["application_1700000000000_0042".to_owned()]);
        let logged = std::fs::read_to_string(&log_path)?;
        assert!(logged.contains("hello\n"));
        assert!(logged.contains("Submitted application"));
        Ok(())
    }

    #[test]
    fn test_runs_in_working_dir() -> Result<()> {
        let dir = tempdir()?;
        let script = write_script(dir.path(), "touch marker")?;
        let result = ShellExecutor::new().run(request(&script, dir.path(), None), &CancelHandle::new())?;
        assert!(result.success());
        assert!(dir.path().join("marker").exists());
        Ok(())
    }

    #[test]
    fn test_cancel_kills_process() -> Result<()> {
        let dir = tempdir()?;
        let script = write_script(dir.path(), "exec sleep 30")?;
        let cancel = CancelHandle::new();
        let remote = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            remote.cancel();
        });

        let start = Instant::now();
        let result = ShellExecutor::new().run(request(&script, dir.path(), None), &cancel)?;
        canceller.join().expect("canceller panicked");

        assert_eq!(result.exit_code, EXIT_CODE_KILL);
        assert!(start.elapsed() < Duration::from_secs(20));
        Ok(())
    }

    #[test]
    fn test_cancelled_before_start() -> Result<()> {
        let dir = tempdir()?;
        let script = write_script(dir.path(), "exec sleep 30")?;
        let cancel = CancelHandle::new();
        cancel.cancel();
        let result = ShellExecutor::new().run(request(&script, dir.path(), None), &cancel)?;
        assert_eq!(result.exit_code, EXIT_CODE_KILL);
        Ok(())
    }

    #[test]
    fn test_missing_shell_target() -> Result<()> {
        let dir = tempdir()?;
        let missing = dir.path().join("nope.sh");
        let result = ShellExecutor::new().run(request(&missing, dir.path(), None), &CancelHandle::new())?;
        // sh itself starts fine and reports the missing file.
        assert_ne!(result.exit_code, 0);
        Ok(())
    }
}
