//! Invocation contract for the external `git` executable

use crate::error::{SyncError, SyncResult};
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Timeout for connectivity probes
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for ordinary commands run inside the clone
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for the initial clone
pub const CLONE_TIMEOUT: Duration = Duration::from_secs(300);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// One git command: `git [-C <repo>] <args…>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitInvocation {
    /// Clone the command runs in; `None` for commands that run before a
    /// local repository exists (probe, clone)
    pub repo: Option<PathBuf>,
    pub args: Vec<String>,
    pub timeout: Duration,
    /// Message reported when `timeout` elapses
    pub timeout_message: &'static str,
}

impl GitInvocation {
    /// A command run inside an existing clone with the default timeout
    pub fn in_repo<I, S>(repo: &Path, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            repo: Some(repo.to_path_buf()),
            args: args.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_TIMEOUT,
            timeout_message: "Command timed out",
        }
    }

    /// A command that does not need a local repository
    pub fn detached<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            repo: None,
            args: args.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_TIMEOUT,
            timeout_message: "Command timed out",
        }
    }

    /// Override the timeout and the message reported when it elapses
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration, message: &'static str) -> Self {
        self.timeout = timeout;
        self.timeout_message = message;
        self
    }

    /// Full argument vector after the program name
    #[must_use]
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        if let Some(repo) = &self.repo {
            argv.push(OsString::from("-C"));
            argv.push(repo.as_os_str().to_os_string());
        }
        argv.extend(self.args.iter().map(OsString::from));
        argv
    }

    /// True if the subcommand arguments start with `prefix`
    #[must_use]
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        prefix.len() <= self.args.len()
            && prefix.iter().zip(&self.args).all(|(p, a)| *p == a.as_str())
    }
}

/// Captured result of a finished git process. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolOutput {
    /// Exit status was zero
    pub ok: bool,
    /// Trimmed standard output
    pub stdout: String,
    /// Trimmed standard error
    pub stderr: String,
}

impl ToolOutput {
    /// Build an output, trimming both streams
    pub fn new(ok: bool, stdout: impl AsRef<str>, stderr: impl AsRef<str>) -> Self {
        Self {
            ok,
            stdout: stdout.as_ref().trim().to_owned(),
            stderr: stderr.as_ref().trim().to_owned(),
        }
    }

    /// A zero-exit output with the given stdout
    pub fn success(stdout: impl AsRef<str>) -> Self {
        Self::new(true, stdout, "")
    }

    /// A non-zero-exit output with the given stderr
    pub fn failure(stderr: impl AsRef<str>) -> Self {
        Self::new(false, "", stderr)
    }

    /// stdout and stderr joined, for substring checks
    #[must_use]
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// stderr if present, otherwise stdout, otherwise `fallback`
    #[must_use]
    pub fn error_message(&self, fallback: &str) -> String {
        if !self.stderr.is_empty() {
            self.stderr.clone()
        } else if !self.stdout.is_empty() {
            self.stdout.clone()
        } else {
            fallback.to_owned()
        }
    }

    /// Convert a failed run into a tool error labelled with `step`
    ///
    /// # Errors
    ///
    /// Returns `ToolExecution` when the process exited non-zero
    pub fn into_step_result(self, step: &str) -> SyncResult<Self> {
        if self.ok {
            return Ok(self);
        }
        Err(SyncError::tool(format!("{step}: {}", self.stderr)))
    }
}

/// Something that can run git commands
///
/// Timeouts and spawn failures are reported as errors; a process that ran
/// to completion is always an `Ok(ToolOutput)`, whatever its exit status.
pub trait GitRunner: Send + Sync {
    /// Run one invocation to completion or timeout
    ///
    /// # Errors
    ///
    /// - `ToolTimeout` if the process outlived `invocation.timeout`
    /// - `ToolExecution` if the process could not be started
    fn run(&self, invocation: &GitInvocation) -> SyncResult<ToolOutput>;
}

/// Runs the real `git` binary
#[derive(Debug, Clone)]
pub struct RealGit {
    program: OsString,
}

impl RealGit {
    /// Use `git` from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Use a specific git executable
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for RealGit {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buffer) {
            warn!("Failed to read git output: {e}");
        }
        buffer
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    let Some(handle) = reader else {
        return String::new();
    };
    match handle.join() {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => {
            warn!("git output reader panicked");
            String::new()
        }
    }
}

impl GitRunner for RealGit {
    fn run(&self, invocation: &GitInvocation) -> SyncResult<ToolOutput> {
        debug!("git {:?}", invocation.argv());

        let mut child = Command::new(&self.program)
            .args(invocation.argv())
            // Never block on a credential prompt nobody can answer
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SyncError::tool(format!(
                    "Failed to execute {}: {e}",
                    self.program.to_string_lossy()
                ))
            })?;

        // Drain both pipes while waiting so a chatty process cannot fill them
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let deadline = Instant::now() + invocation.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    warn!(
                        "git {} exceeded {:?}, killing it",
                        invocation.args.first().map_or("", String::as_str),
                        invocation.timeout
                    );
                    if let Err(e) = child.kill() {
                        warn!("Failed to kill timed out git process: {e}");
                    }
                    if let Err(e) = child.wait() {
                        warn!("Failed to reap timed out git process: {e}");
                    }
                    return Err(SyncError::timeout(invocation.timeout_message));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(SyncError::tool(format!("Failed to wait for git: {e}")));
                }
            }
        };

        let output = ToolOutput::new(status.success(), collect(stdout), collect(stderr));
        debug!("git exited ok={} stderr={:?}", output.ok, output.stderr);
        Ok(output)
    }
}
