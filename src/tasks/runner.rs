//! External command invocation
//!
//! Tasks describe what to run as a [`ToolCommand`] and hand it to a
//! [`CommandRunner`]. Working directory and environment overrides travel
//! with the command, so running a tool never changes the state of this
//! process.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("{program} not found! {hint}")]
    NotFound { program: String, hint: String },

    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// A command line to run, plus its execution parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(OsString, OsString)>,
    /// Collect stdout instead of inheriting it
    pub capture: bool,
    /// Shown when the program cannot be found
    pub missing_hint: String,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            capture: false,
            missing_hint: String::new(),
        }
    }

    /// Builds a command from a `[program, args...]` list
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone()).args(args))
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.env
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn capture_output(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn missing_hint(mut self, hint: impl Into<String>) -> Self {
        self.missing_hint = hint.into();
        self
    }

    /// Human-readable command line, for logs and error messages
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }

    /// The error reported when this command's program is missing
    pub fn not_found(&self) -> RunError {
        RunError::NotFound {
            program: self.program.clone(),
            hint: self.missing_hint.clone(),
        }
    }
}

/// Result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Exit code; `None` when terminated by a signal
    pub code: Option<i32>,
    /// Captured stdout (empty unless capture was requested)
    pub stdout: String,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit status for messages
    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external commands
pub trait CommandRunner {
    /// Returns true if the program can be executed
    fn is_available(&self, program: &str) -> bool;

    /// Runs the command to completion
    fn run(&self, command: &ToolCommand) -> Result<RunOutcome, RunError>;
}

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn is_available(&self, program: &str) -> bool {
        find_executable(program, None).is_some()
    }

    fn run(&self, command: &ToolCommand) -> Result<RunOutcome, RunError> {
        let program = find_executable(&command.program, command.cwd.as_deref())
            .ok_or_else(|| command.not_found())?;

        tracing::debug!(command = %command.display(), cwd = ?command.cwd, "running");

        let mut cmd = Command::new(&program);
        cmd.args(&command.args);
        if let Some(dir) = &command.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &command.env {
            cmd.env(key, value);
        }

        let spawn_error = |source| RunError::Spawn {
            program: command.program.clone(),
            source,
        };

        let outcome = if command.capture {
            let output = cmd
                .stdin(Stdio::null())
                .stderr(Stdio::inherit())
                .output()
                .map_err(spawn_error)?;
            RunOutcome {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            }
        } else {
            let status = cmd.status().map_err(spawn_error)?;
            RunOutcome {
                code: status.code(),
                stdout: String::new(),
            }
        };

        tracing::debug!(command = %command.program, code = ?outcome.code, "finished");
        Ok(outcome)
    }
}

/// Locates a program on `PATH`, or checks it directly when given a path
///
/// Relative paths are resolved against `cwd` when the child gets one.
pub fn find_executable(program: &str, cwd: Option<&Path>) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        let candidate = match cwd {
            Some(dir) if candidate.is_relative() => dir.join(candidate),
            _ => candidate.to_path_buf(),
        };
        return is_executable(&candidate).then_some(candidate);
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        executable_names(program)
            .into_iter()
            .map(|name| dir.join(name))
            .find(|path| is_executable(path))
    })
}

#[cfg(windows)]
fn executable_names(program: &str) -> Vec<String> {
    if Path::new(program).extension().is_some() {
        return vec![program.to_string()];
    }
    ["exe", "bat", "cmd"]
        .iter()
        .map(|ext| format!("{}.{}", program, ext))
        .collect()
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> Vec<String> {
    vec![program.to_string()]
}

/// Checks if a file is executable
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
