//! Delegation of targets to mage or `go run`
//!
//! A delegation runs at most once per call:
//! - No magefile: nothing to do, success
//! - Resolve the target name through discovery, then flatten it for mage
//! - Prefer the `mage` binary, fall back to `go run -tags=mage`
//! - Set aside `magefile.go` while `magefiles/` is in use
//! - Pass stdin and stdout through, drain stderr on a worker task
//! - Kill the runner at the deadline and report exit code 124

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{timeout, timeout_at, Instant};

use super::set_aside::SetAside;
use super::stderr::drain_stderr;
use crate::config::DelegateConfig;
use crate::error::DelegateError;
use crate::runner::{normalize, CommandLookup, ScriptLocation, ScriptLocator};

/// How long the stderr worker may keep draining after the runner is gone
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Which program runs the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RunnerType {
    /// mage binary found on PATH
    Mage(PathBuf),
    /// Go toolchain, used as `go run -tags=<tag>`
    GoRun(PathBuf),
}

impl RunnerType {
    pub fn name(&self) -> &str {
        match self {
            RunnerType::Mage(_) => "mage",
            RunnerType::GoRun(_) => "go run",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            RunnerType::Mage(path) | RunnerType::GoRun(path) => path,
        }
    }
}

impl fmt::Display for RunnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.path().display())
    }
}

/// Fully built process invocation
///
/// The environment holds only the additions; the parent environment is always
/// inherited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    /// Command with stdin/stdout inherited and stderr piped
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.working_dir)
            .envs(&self.env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Command line for logging
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Outcome of one delegation
///
/// `exit_code` is 0 exactly when `error` is `None`.
#[derive(Debug)]
pub struct DelegateResult {
    exit_code: i32,
    error: Option<DelegateError>,
}

impl DelegateResult {
    pub fn ok() -> Self {
        Self {
            exit_code: 0,
            error: None,
        }
    }

    /// Failed delegation; the exit code comes from the error
    pub fn failed(error: DelegateError) -> Self {
        Self {
            exit_code: error.exit_code(),
            error: Some(error),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn error(&self) -> Option<&DelegateError> {
        self.error.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl From<Result<(), DelegateError>> for DelegateResult {
    fn from(result: Result<(), DelegateError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::failed(e),
        }
    }
}

/// Hands targets off to an external runner
#[derive(Debug, Clone)]
pub struct Delegator {
    locator: ScriptLocator,
    runner: String,
    toolchain: String,
    build_tag: String,
    args_env: String,
    noise_marker: String,
    timeout: Duration,
}

impl Delegator {
    /// Delegator with default settings
    pub fn new(locator: ScriptLocator) -> Self {
        Self::from_config(locator, &DelegateConfig::default())
    }

    pub fn from_config(locator: ScriptLocator, config: &DelegateConfig) -> Self {
        Self {
            locator,
            runner: config.runner.clone(),
            toolchain: config.toolchain.clone(),
            build_tag: config.build_tag.clone(),
            args_env: config.args_env.clone(),
            noise_marker: config.noise_marker.clone(),
            timeout: config.timeout_duration(),
        }
    }

    /// Set the runner binary name or path
    pub fn with_runner(mut self, runner: impl Into<String>) -> Self {
        self.runner = runner.into();
        self
    }

    /// Set the fallback toolchain name or path
    pub fn with_toolchain(mut self, toolchain: impl Into<String>) -> Self {
        self.toolchain = toolchain.into();
        self
    }

    /// Set the default timeout used by `run`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn locator(&self) -> &ScriptLocator {
        &self.locator
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Pick the runner: mage if present, otherwise the Go toolchain
    ///
    /// # Errors
    /// * `DelegateError::ToolchainNotFound` - If neither is on PATH
    pub fn select_runner(&self) -> Result<RunnerType, DelegateError> {
        if let Ok(path) = which::which(&self.runner) {
            return Ok(RunnerType::Mage(path));
        }
        tracing::debug!("{} not found on PATH, falling back to {}", self.runner, self.toolchain);
        self.validate_toolchain().map(RunnerType::GoRun)
    }

    /// Check that the Go toolchain is available
    pub fn validate_toolchain(&self) -> Result<PathBuf, DelegateError> {
        which::which(&self.toolchain).map_err(|_| DelegateError::ToolchainNotFound {
            toolchain: self.toolchain.clone(),
        })
    }

    /// Build the process invocation for a flattened target name
    ///
    /// mage does not accept target arguments on its command line, so they
    /// travel in the arguments environment variable in every case. `go run`
    /// additionally receives them positionally.
    pub fn build_invocation(
        &self,
        runner: &RunnerType,
        location: &ScriptLocation,
        target: &str,
        args: &[String],
    ) -> Invocation {
        let root = self.locator.root().to_path_buf();
        let tags = format!("-tags={}", self.build_tag);

        let (args_list, working_dir) = match (runner, location) {
            (RunnerType::Mage(_), _) => (vec![target.to_string()], root),
            (RunnerType::GoRun(_), ScriptLocation::Directory { path, .. }) => {
                let mut list = vec!["run".to_string(), tags, ".".to_string(), target.to_string()];
                list.extend(args.iter().cloned());
                (list, path.clone())
            }
            (RunnerType::GoRun(_), _) => {
                let mut list = vec![
                    "run".to_string(),
                    tags,
                    self.locator.file_name().to_string(),
                    target.to_string(),
                ];
                list.extend(args.iter().cloned());
                (list, root)
            }
        };

        let mut env = BTreeMap::new();
        if !args.is_empty() {
            env.insert(self.args_env.clone(), args.join(" "));
        }

        Invocation {
            program: runner.path().to_path_buf(),
            args: args_list,
            working_dir,
            env,
        }
    }

    /// Delegate with the configured timeout
    pub async fn run(
        &self,
        command: &str,
        args: &[String],
        lookup: &dyn CommandLookup,
    ) -> DelegateResult {
        self.execute(Instant::now() + self.timeout, command, args, lookup)
            .await
    }

    /// Delegate `command` and wait for it until `deadline`
    pub async fn execute(
        &self,
        deadline: Instant,
        command: &str,
        args: &[String],
        lookup: &dyn CommandLookup,
    ) -> DelegateResult {
        self.try_execute(deadline, command, args, lookup).await.into()
    }

    async fn try_execute(
        &self,
        deadline: Instant,
        command: &str,
        args: &[String],
        lookup: &dyn CommandLookup,
    ) -> Result<(), DelegateError> {
        let budget = deadline.saturating_duration_since(Instant::now());

        let location = self.locator.resolve();
        if location.is_none() {
            tracing::debug!("No magefile, nothing to delegate for '{}'", command);
            return Ok(());
        }

        let declared = if lookup.has_command(command) {
            lookup.original_name(command)
        } else {
            None
        };
        let target = normalize(declared.as_deref().unwrap_or(command));

        let runner = self.select_runner()?;

        let _set_aside = match &location {
            ScriptLocation::Directory {
                conflicting_file: Some(file),
                ..
            } => Some(SetAside::acquire(file)?),
            _ => None,
        };

        let invocation = self.build_invocation(&runner, &location, &target, args);
        tracing::debug!(
            "Delegating '{}' via {}: {} (in {})",
            command,
            runner.name(),
            invocation.display(),
            invocation.working_dir.display()
        );

        let mut child = invocation
            .command()
            .spawn()
            .map_err(|source| DelegateError::SpawnFailed {
                command: command.to_string(),
                source,
            })?;

        let stderr = child.stderr.take();
        let marker = self.noise_marker.clone();
        let (tx, rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let worker = tokio::spawn(async move {
            let mut captured = String::new();
            if let Some(pipe) = stderr {
                tokio::select! {
                    _ = drain_stderr(pipe, tokio::io::stderr(), &marker, &mut captured) => {}
                    _ = stop_rx => {}
                }
            }
            // Receiver is gone only when the caller already gave up
            let _ = tx.send(captured);
        });
        let drain = StderrDrain {
            result: rx,
            stop: stop_tx,
            worker,
        };

        let status = match timeout_at(deadline, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                tracing::debug!("Deadline reached for '{}', killing runner", command);
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill runner for '{}': {}", command, e);
                }
                drain.finish(command).await;
                return Err(DelegateError::Timeout {
                    command: command.to_string(),
                    timeout: budget,
                });
            }
        };

        let captured = drain.finish(command).await;

        if status.success() {
            return Ok(());
        }

        let exit_code = exit_code_of(&status);
        let stderr = captured.trim();
        if stderr.is_empty() {
            Err(DelegateError::CommandExited {
                command: command.to_string(),
                exit_code,
                status,
            })
        } else {
            Err(DelegateError::CommandFailed {
                command: command.to_string(),
                exit_code,
                stderr: stderr.to_string(),
            })
        }
    }
}

/// Handle on the stderr worker of one running target
struct StderrDrain {
    result: oneshot::Receiver<String>,
    stop: oneshot::Sender<()>,
    worker: JoinHandle<()>,
}

impl StderrDrain {
    /// Wait for the capture once the runner is gone
    ///
    /// A descendant that inherited stderr can keep the pipe open after the
    /// runner exits. The worker gets `DRAIN_GRACE` to reach EOF, then it is
    /// told to stop and hands over what it read so far.
    async fn finish(self, command: &str) -> String {
        let StderrDrain {
            mut result,
            stop,
            worker,
        } = self;

        match timeout(DRAIN_GRACE, &mut result).await {
            Ok(Ok(captured)) => return captured,
            Ok(Err(_)) => {
                tracing::warn!("Stderr worker for '{}' ended without a result", command);
                return String::new();
            }
            Err(_) => {
                tracing::debug!("Stderr for '{}' still open after exit, stopping drain", command);
            }
        }

        let _ = stop.send(());
        match timeout(DRAIN_GRACE, result).await {
            Ok(Ok(captured)) => captured,
            _ => {
                worker.abort();
                String::new()
            }
        }
    }
}

/// Exit code of a failed runner; signals map to 128 + signal on unix
fn exit_code_of(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
