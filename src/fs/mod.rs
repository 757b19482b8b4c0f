use std::path::{Path, PathBuf};
use std::{fs, io};

use anyhow::{Context, Result};

use util::PathEncodingError;

/// Utility fns
mod ops;

/// Defines fns for creating the paths of a task's artifacts
mod paths;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Specified execute directory \"{0}\" is not a directory")]
    NotDirectory(String),
    #[error("Can't perform IO operation: \"{0}\" is not whitelisted")]
    NotWhitelisted(String),
    #[error("Failed to write artifact \"{path}\": {source}")]
    ArtifactWrite {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// How a materialized file should be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Plain data, e.g. a job descriptor.
    Data,
    /// A script that will be executed (`rwxr-xr-x` on unix).
    Executable,
}

/// The outcome of [`Fs::materialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    /// False if the file already existed, or if this was a dry run.
    pub created: bool,
}

/// All file operations in the crate should go through this struct.
///
/// All destructive operations check that the path in question is a child of the
/// single whitelisted prefix (the task's execute directory), otherwise they will
/// not be performed.
#[derive(Debug)]
pub struct Fs {
    /// The directory we are allowed to modify
    execute_dir: PathBuf,
    /// if true, prevents all destructive operations
    dry_run: bool,
}

impl Fs {
    /// Create a new `Fs` with the given execute directory.
    pub fn new(execute_dir: &Path, dry_run: bool) -> Self {
        Self {
            execute_dir: execute_dir.to_path_buf(),
            dry_run,
        }
    }

    pub fn execute_dir(&self) -> &Path {
        &self.execute_dir
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Check whether the execute dir exists, and create it if not.
    pub fn ensure_execute_dir_exists(&mut self) -> Result<()> {
        if !self.execute_dir.exists() {
            if self.dry_run {
                tracing::info!(dir = ?self.execute_dir, "dry run, not creating execute directory");
                return Ok(());
            }
            tracing::debug!(dir = ?self.execute_dir, "creating execute directory");
            fs::create_dir_all(&self.execute_dir).context("creating execute directory")?;
        } else if !self.execute_dir.is_dir() {
            return Err(Error::NotDirectory(
                self.execute_dir
                    .to_str()
                    .ok_or(PathEncodingError)?
                    .to_string(),
            )
            .into());
        }

        self.execute_dir = self.execute_dir.canonicalize()?;
        Ok(())
    }

    /// Check if path exists on disk.
    pub fn exists<T: AsRef<Path>>(&self, path: T) -> bool {
        let path = path.as_ref();
        path.exists() || path.is_symlink()
    }

    /// Create a file, and return a writable `File` handle.
    pub fn create_file<T: AsRef<Path>>(&self, path: T) -> Result<fs::File> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        let f = fs::File::create(path).context("creating file")?;
        Ok(f)
    }

    /// Make sure a file exists at `path`, creating it with the output of `render` if not.
    ///
    /// An existing file is returned as-is and `render` is never called, so
    /// re-entering with the same path reuses the first attempt's content.
    /// Creation is atomic: content goes to a temporary file in the same
    /// directory that is then linked into place without clobbering, and if
    /// another writer got there first its file is kept.
    pub fn materialize<F>(&self, path: &Path, mode: FileMode, render: F) -> Result<Artifact>
    where
        F: FnOnce() -> Result<String>,
    {
        if self.exists(path) {
            tracing::debug!(?path, "artifact exists, reusing");
            return Ok(Artifact {
                path: path.to_path_buf(),
                created: false,
            });
        }

        let content = render()?;

        if self.dry_run {
            tracing::info!(?path, bytes = content.len(), "dry run, not writing artifact");
            return Ok(Artifact {
                path: path.to_path_buf(),
                created: false,
            });
        }

        self.check_whitelist(path)?;
        let artifact_error = |source| Error::ArtifactWrite {
            path: path.to_string_lossy().into_owned(),
            source,
        };
        let parent = path.parent().unwrap_or(&self.execute_dir);
        fs::create_dir_all(parent).map_err(artifact_error)?;

        let created = ops::write_new(path, content.as_bytes(), mode).map_err(artifact_error)?;
        if created {
            tracing::debug!(?path, bytes = content.len(), "wrote artifact");
        } else {
            tracing::debug!(?path, "artifact created concurrently, reusing");
        }
        Ok(Artifact {
            path: path.to_path_buf(),
            created,
        })
    }

    fn is_whitelisted<T: AsRef<Path>>(&self, path: T) -> bool {
        let path = path.as_ref();
        if path.starts_with(&self.execute_dir) {
            return true;
        }
        false
    }

    fn check_whitelist(&self, path: &Path) -> Result<()> {
        if self.dry_run || !self.is_whitelisted(path) {
            Err(Error::NotWhitelisted(path.to_str().ok_or(PathEncodingError)?.to_owned()).into())
        } else {
            Ok(())
        }
    }
}
