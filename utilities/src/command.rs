use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use models::PlatformError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A program plus its argument vector. No shell is involved unless the
/// program itself is one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs external programs and reports their raw exit code.
///
/// A nonzero exit is *not* an error. `Err` means the program could not be
/// started, or the wait was cancelled (`ErrorKind::Interrupted`).
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cmd: &CommandSpec, cancel: &CancellationToken) -> io::Result<i32>;
}

/// Run `cmd` once and report whether it exited with code 0.
///
/// Spawn failures and cancellation become `Err`; any nonzero exit is `Ok(false)`.
pub async fn run_succeeded(
    runner: &dyn CommandRunner,
    cmd: &CommandSpec,
    cancel: &CancellationToken,
) -> Result<bool, PlatformError> {
    match runner.run(cmd, cancel).await {
        Ok(0) => Ok(true),
        Ok(code) => {
            warn!(command = %cmd, code, "command exited nonzero");
            Ok(false)
        }
        Err(e) => Err(PlatformError::from_spawn(&cmd.program, e)),
    }
}

/// Fold a detailed outcome into the plain success flag callers print.
pub fn settle(operation: &str, outcome: Result<bool, PlatformError>) -> bool {
    match outcome {
        Ok(true) => {
            info!(operation, "succeeded");
            true
        }
        Ok(false) => {
            warn!(operation, "failed");
            false
        }
        Err(e) => {
            warn!(operation, error = %e, "failed");
            false
        }
    }
}

/* Real process implementation (tokio) */

#[derive(Debug, Default, Clone)]
pub struct RealCommandRunner;

impl RealCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for RealCommandRunner {
    async fn run(&self, cmd: &CommandSpec, cancel: &CancellationToken) -> io::Result<i32> {
        debug!(command = %cmd, "spawning");
        let child = tokio::process::Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false)
            .spawn()?;

        // The wait lives in its own task so the pipes keep draining after a
        // cancel; a child writing to a closed pipe would die of SIGPIPE.
        let wait = tokio::spawn(child.wait_with_output());
        let output = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(command = %cmd, "wait cancelled; child left running");
                return Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    format!("wait for `{}` cancelled", cmd.program),
                ));
            }
            joined = wait => joined.map_err(|e| io::Error::new(io::ErrorKind::Other, e))??,
        };

        let code = output.status.code().unwrap_or(-1);
        debug!(
            command = %cmd,
            code,
            stdout = %String::from_utf8_lossy(&output.stdout).trim_end(),
            stderr = %String::from_utf8_lossy(&output.stderr).trim_end(),
            "process exited"
        );
        Ok(code)
    }
}

/* Scripted runner for tests */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedOutcome {
    Exit(i32),
    SpawnError(io::ErrorKind),
}

/// Records every command and answers from a FIFO script. An empty script
/// answers `Exit(0)`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCommandRunner {
    inner: Arc<Mutex<ScriptedInner>>,
}

#[derive(Debug, Default)]
struct ScriptedInner {
    script: VecDeque<ScriptedOutcome>,
    calls: Vec<CommandSpec>,
}

impl ScriptedCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(outcomes: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        let runner = Self::default();
        runner
            .inner
            .lock()
            .unwrap()
            .script
            .extend(outcomes);
        runner
    }

    pub fn with_exit_codes(codes: impl IntoIterator<Item = i32>) -> Self {
        Self::with_script(codes.into_iter().map(ScriptedOutcome::Exit))
    }

    pub fn push(&self, outcome: ScriptedOutcome) {
        self.inner.lock().unwrap().script.push_back(outcome);
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.inner.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedCommandRunner {
    async fn run(&self, cmd: &CommandSpec, cancel: &CancellationToken) -> io::Result<i32> {
        let outcome = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(cmd.clone());
            inner.script.pop_front().unwrap_or(ScriptedOutcome::Exit(0))
        };
        if cancel.is_cancelled() {
            return Err(io::Error::new(
                io::ErrorKind::Interrupted,
                format!("wait for `{}` cancelled", cmd.program),
            ));
        }
        match outcome {
            ScriptedOutcome::Exit(code) => Ok(code),
            ScriptedOutcome::SpawnError(kind) => Err(io::Error::new(
                kind,
                format!("scripted spawn failure for `{}`", cmd.program),
            )),
        }
    }
}
