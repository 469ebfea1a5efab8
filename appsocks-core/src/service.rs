//! Lifecycle control of the routing service executable
//!
//! The service cannot be observed directly; every operation optimistically
//! issues its stages in order and reports which stage failed, if any.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{ServiceError, StageError};

/// File name of the routing service executable, expected beside the
/// manager's own binary.
#[cfg(windows)]
pub const SERVICE_EXECUTABLE: &str = "appsocks-svc.exe";
#[cfg(not(windows))]
pub const SERVICE_EXECUTABLE: &str = "appsocks-svc";

/// How often a bounded wait polls the child for completion.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One subcommand invocation of the service executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Install,
    Uninstall,
    Start,
    Stop,
}

impl Stage {
    /// The single positional argument passed to the service executable.
    pub fn subcommand(self) -> &'static str {
        match self {
            Stage::Install => "install",
            Stage::Uninstall => "uninstall",
            Stage::Start => "start",
            Stage::Stop => "stop",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subcommand())
    }
}

/// Invokes the service executable with one subcommand and blocks until it
/// exits. Abstracted so tests can drive the controller with a fake that
/// records invocations and scripts failures.
pub trait ProcessRunner {
    fn run(&self, executable: &Path, subcommand: &str) -> Result<(), StageError>;
}

/// Runs the real executable via [`std::process::Command`].
///
/// Without a timeout the wait is unbounded, so a hung service hangs the
/// caller. With one, expiry kills the child and surfaces as
/// [`StageError::Timeout`].
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self { timeout: None }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    fn wait_bounded(child: &mut Child, timeout: Duration) -> Result<ExitStatus, StageError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                // Reap the child so it does not linger after the kill.
                let _ = child.kill();
                let _ = child.wait();
                return Err(StageError::Timeout(timeout));
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, executable: &Path, subcommand: &str) -> Result<(), StageError> {
        // The service is driven by its subcommand alone; it gets no stdin.
        let mut command = Command::new(executable);
        command.arg(subcommand).stdin(Stdio::null());

        let status = match self.timeout {
            None => command.status()?,
            Some(timeout) => {
                let mut child = command.spawn()?;
                Self::wait_bounded(&mut child, timeout)?
            }
        };

        if status.success() {
            Ok(())
        } else {
            match status.code() {
                Some(code) => Err(StageError::Exit(code)),
                None => Err(StageError::Signaled),
            }
        }
    }
}

/// Expected location of the service executable: [`SERVICE_EXECUTABLE`] in the
/// directory containing the currently running binary.
pub fn default_executable_path() -> Result<PathBuf, ServiceError> {
    let current = env::current_exe().map_err(ServiceError::Locate)?;
    let dir = current.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(SERVICE_EXECUTABLE))
}

/// Drives the service through install/uninstall/start/stop/restart.
///
/// Each operation is an ordered stage sequence with fail-fast semantics: the
/// first failing stage aborts the rest, and stages that already completed are
/// not rolled back. A restart whose stop succeeds but whose start fails
/// leaves the service stopped; the caller surfaces that partial outcome.
pub struct ServiceController<R = SystemRunner> {
    executable: PathBuf,
    runner: R,
    op_lock: Mutex<()>,
}

impl<R: ProcessRunner> ServiceController<R> {
    pub fn with_runner(executable: PathBuf, runner: R) -> Self {
        Self {
            executable,
            runner,
            op_lock: Mutex::new(()),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Register the service, then start it.
    pub fn install(&self) -> Result<(), ServiceError> {
        self.run_stages(&[Stage::Install, Stage::Start])
    }

    /// Stop the service, then remove its registration.
    pub fn uninstall(&self) -> Result<(), ServiceError> {
        self.run_stages(&[Stage::Stop, Stage::Uninstall])
    }

    pub fn start(&self) -> Result<(), ServiceError> {
        self.run_stages(&[Stage::Start])
    }

    pub fn stop(&self) -> Result<(), ServiceError> {
        self.run_stages(&[Stage::Stop])
    }

    /// Stop the service, then start it again to pick up new configuration.
    pub fn restart(&self) -> Result<(), ServiceError> {
        self.run_stages(&[Stage::Stop, Stage::Start])
    }

    fn run_stages(&self, stages: &[Stage]) -> Result<(), ServiceError> {
        // Operations never overlap, even if the surrounding system triggers
        // them concurrently.
        let _guard = self.op_lock.lock().unwrap_or_else(|err| err.into_inner());

        if !self.executable.exists() {
            return Err(ServiceError::NotFound(self.executable.clone()));
        }

        for &stage in stages {
            tracing::debug!("Invoking {} {stage}", self.executable.display());
            self.runner
                .run(&self.executable, stage.subcommand())
                .map_err(|source| ServiceError::Stage { stage, source })?;
        }
        Ok(())
    }
}
