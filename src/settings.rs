use std::path::PathBuf;

use anyhow::Result;

use util::is_blank;

use crate::args::Args;
use crate::prep::{SynthesisOptions, TargetOs};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Task spec file \"{0}\" does not exist")]
    TaskFileNotFound(String),
    #[error("Resource catalog file \"{0}\" does not exist")]
    CatalogFileNotFound(String),
    #[error("Invalid --target-os: {0}")]
    InvalidTargetOs(String),
    #[error("Launcher for {0} tasks must not be blank")]
    BlankLauncher(&'static str),
}

/// Settings are like Args, except all the logic has
/// been applied so e.g. defaults are added in.
#[derive(Debug)]
pub struct Settings {
    pub task: PathBuf,
    pub catalog: Option<PathBuf>,
    pub execute_dir: Option<PathBuf>,
    pub options: SynthesisOptions,
    pub dry_run: bool,
    pub verbose: u8,
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let task = PathBuf::from(&args.task);
        if !task.is_file() {
            return Err(Error::TaskFileNotFound(args.task).into());
        }

        let catalog = match args.catalog {
            Some(catalog) if !PathBuf::from(&catalog).is_file() => {
                return Err(Error::CatalogFileNotFound(catalog).into());
            }
            catalog => catalog.map(PathBuf::from),
        };

        let os = match args.target_os {
            Some(os) => os.parse().map_err(Error::InvalidTargetOs)?,
            None => TargetOs::current(),
        };

        if is_blank(Some(args.java.as_str())) {
            return Err(Error::BlankLauncher("JAVA").into());
        }
        if is_blank(Some(args.flinkx.as_str())) {
            return Err(Error::BlankLauncher("FLINKX").into());
        }

        Ok(Self {
            task,
            catalog,
            execute_dir: args.execute_dir.map(PathBuf::from),
            options: SynthesisOptions {
                os,
                java_launcher: args.java,
                flinkx_launcher: args.flinkx,
            },
            dry_run: args.dry_run,
            verbose: args.verbose,
        })
    }
}
