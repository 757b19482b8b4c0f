use std::fmt;
use std::path::Path;
use std::str::FromStr;

use params::{DeployMode, VarMap};

pub const DEFAULT_JAVA_LAUNCHER: &str = "$JAVA_HOME/bin/java";
pub const DEFAULT_FLINKX_LAUNCHER: &str = "${FLINKX_HOME}/bin/flinkx";

const FLINKX_PLUGIN_ROOT: &str = "-pluginRoot ${FLINKX_HOME}/syncplugins";
const FLINK_CONF: &str = "-flinkconf ${FLINK_CONF_DIR}";
const YARN_CONF: &str = "-yarnconf ${HADOOP_CONF_DIR}";
const FLINK_LIB_JAR: &str = "-flinkLibJar ${FLINK_HOME}/lib";

/// Operating system of the host the command will run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetOs {
    Unix,
    Windows,
}

impl TargetOs {
    /// The OS we're running on.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    pub fn classpath_separator(&self) -> char {
        match self {
            Self::Unix => ':',
            Self::Windows => ';',
        }
    }

    pub fn script_extension(&self) -> &'static str {
        match self {
            Self::Unix => "sh",
            Self::Windows => "bat",
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix => f.write_str("unix"),
            Self::Windows => f.write_str("windows"),
        }
    }
}

impl FromStr for TargetOs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unix" | "linux" | "macos" => Ok(Self::Unix),
            "windows" => Ok(Self::Windows),
            _ => Err(format!("unknown target os '{s}' (expected 'unix' or 'windows')")),
        }
    }
}

/// Host-specific choices that shape the synthesized command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOptions {
    pub os: TargetOs,
    pub java_launcher: String,
    pub flinkx_launcher: String,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            os: TargetOs::current(),
            java_launcher: DEFAULT_JAVA_LAUNCHER.to_owned(),
            flinkx_launcher: DEFAULT_FLINKX_LAUNCHER.to_owned(),
        }
    }
}

/// Join resolved resource paths in classpath order.
pub fn join_classpath<S: AsRef<str>>(paths: &[S], os: TargetOs) -> String {
    let sep = os.classpath_separator();
    let mut out = String::with_capacity(paths.iter().map(|p| p.as_ref().len() + 1).sum());
    for (i, path) in paths.iter().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        out.push_str(path.as_ref());
    }
    out
}

/// `launcher [jvm_args] -classpath <classpath> main_class [main_args]`.
///
/// `jvm_args` and `main_args` are expected to be resolved already;
/// blank ones are left out entirely.
pub fn java_tokens(
    opts: &SynthesisOptions,
    jvm_args: &str,
    classpath: &str,
    main_class: &str,
    main_args: &str,
) -> Vec<String> {
    let mut tokens = Vec::with_capacity(6);
    tokens.push(opts.java_launcher.clone());
    push_non_blank(&mut tokens, jvm_args);
    tokens.push("-classpath".to_owned());
    tokens.push(classpath.to_owned());
    tokens.push(main_class.trim().to_owned());
    push_non_blank(&mut tokens, main_args);
    tokens
}

/// `launcher -job <descriptor> -pluginRoot .. <mode flags>`.
pub fn data_sync_tokens(
    opts: &SynthesisOptions,
    descriptor: &Path,
    mode: DeployMode,
    queue: Option<&str>,
) -> Vec<String> {
    let mut tokens = Vec::with_capacity(8);
    tokens.push(opts.flinkx_launcher.clone());
    tokens.push(format!("-job {}", descriptor.display()));
    tokens.push(FLINKX_PLUGIN_ROOT.to_owned());
    tokens.extend(deploy_flags(mode, queue));
    tokens
}

/// The fixed, ordered flags for each deploy mode. YARN modes end with
/// `-queue <queue>`, left off when no queue is known.
pub fn deploy_flags(mode: DeployMode, queue: Option<&str>) -> Vec<String> {
    let mut flags = match mode {
        DeployMode::Local => vec!["-mode local".to_owned(), FLINK_CONF.to_owned()],
        DeployMode::Standalone => vec!["-mode standalone".to_owned(), FLINK_CONF.to_owned()],
        DeployMode::Yarn => vec![
            "-mode yarn".to_owned(),
            FLINK_CONF.to_owned(),
            YARN_CONF.to_owned(),
        ],
        DeployMode::YarnPerJob => vec![
            "-mode yarnPer".to_owned(),
            YARN_CONF.to_owned(),
            FLINK_LIB_JAR.to_owned(),
        ],
    };
    if mode.needs_queue() {
        match util::non_blank(queue) {
            Some(queue) => flags.push(format!("-queue {queue}")),
            None => tracing::warn!(%mode, "no queue for YARN submission, using the cluster default"),
        }
    }
    flags
}

/// Join tokens with single spaces and resolve `${..}` placeholders once more
/// against the context's defined params.
pub fn finish_command(tokens: &[String], defined_params: &VarMap) -> Result<String, syntax::Error> {
    syntax::resolve(&tokens.join(" "), defined_params)
}

fn push_non_blank(tokens: &mut Vec<String>, arg: &str) {
    let arg = arg.trim();
    if !arg.is_empty() {
        tokens.push(arg.to_owned());
    }
}
