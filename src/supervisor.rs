use crate::environment::ServiceEnvironment;
use crate::error::{HarnessError, Result};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Lifecycle of the service subprocess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Process is running
    Running,
    /// SIGTERM sent, waiting for exit
    Stopping,
    /// Process has exited and been reaped
    Stopped,
}

/// Launches the service under test.
///
/// The supervisor itself is stateless apart from the environment it hands to
/// every process it starts; each test gets its own [`ServiceHandle`].
#[derive(Debug, Clone, Default)]
pub struct ProcessSupervisor {
    environment: ServiceEnvironment,
}

impl ProcessSupervisor {
    pub fn new(environment: ServiceEnvironment) -> Self {
        Self { environment }
    }

    /// Starts `executable` with `flags`.
    ///
    /// The child is placed in its own process group so that teardown can
    /// reach anything it forks.
    ///
    /// # Returns
    /// * `Result<ServiceHandle>` - Handle to the running process, or
    ///   `HarnessError::Startup` if the executable cannot be launched
    pub fn start(&self, executable: &Path, flags: &[String]) -> Result<ServiceHandle> {
        info!("Starting service: {} {:?}", executable.display(), flags);
        if !self.environment.is_empty() {
            debug!("Adding {} variable(s) to the service environment", self.environment.len());
        }

        let mut command = Command::new(executable);
        command.args(flags);
        command.process_group(0);
        command.kill_on_drop(true);
        command.stdin(Stdio::null());
        command.stdout(Stdio::inherit());
        command.stderr(Stdio::inherit());

        for (key, value) in self.environment.iter() {
            command.env(key, value);
        }

        let child = command.spawn().map_err(|source| HarnessError::Startup {
            executable: executable.to_path_buf(),
            source,
        })?;

        let raw_pid = child.id().ok_or_else(|| HarnessError::Startup {
            executable: executable.to_path_buf(),
            source: std::io::Error::other("process exited before its pid could be read"),
        })?;
        let pid = Pid::from_raw(raw_pid as i32);

        info!("Service started with PID: {}", pid);

        Ok(ServiceHandle {
            executable: executable.to_path_buf(),
            pid,
            child: Some(child),
            state: ServiceState::Running,
            exit_status: None,
            start_time: Instant::now(),
        })
    }

    /// Sends SIGTERM to the service and waits up to `grace` for it to exit.
    ///
    /// A process that outlives `grace` is reported as
    /// `HarnessError::ShutdownTimeout`; nothing is retried here. Dropping the
    /// handle afterwards kills the process group.
    pub async fn stop(&self, handle: &mut ServiceHandle, grace: Duration) -> Result<()> {
        handle.stop(grace).await
    }
}

/// A running (or reaped) service subprocess
#[derive(Debug)]
pub struct ServiceHandle {
    executable: PathBuf,
    pid: Pid,
    child: Option<Child>,
    state: ServiceState,
    exit_status: Option<ExitStatus>,
    start_time: Instant,
}

impl ServiceHandle {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    /// Time since the process was spawned
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Checks whether the process is still alive, reaping it if it has exited
    pub fn is_running(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };

        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                self.mark_exited(status);
                false
            }
            Err(e) => {
                warn!("Failed to poll service {}: {}", self.pid, e);
                false
            }
        }
    }

    /// Waits for the process to exit on its own
    ///
    /// # Returns
    /// * `Result<Option<ExitStatus>>` - Exit status, or None if already reaped
    pub async fn wait_for_exit(&mut self) -> Result<Option<ExitStatus>> {
        let Some(child) = self.child.as_mut() else {
            return Ok(None);
        };

        let status = child.wait().await?;
        self.mark_exited(status);
        Ok(Some(status))
    }

    async fn stop(&mut self, grace: Duration) -> Result<()> {
        if self.child.is_none() {
            debug!("Service {} already reaped", self.pid);
            return Ok(());
        }

        self.state = ServiceState::Stopping;
        info!("Stopping service {} (grace {:?})", self.pid, grace);

        match kill(self.pid, Signal::SIGTERM) {
            Ok(()) => {}
            // Exited between the check above and the signal; wait() reaps it.
            Err(Errno::ESRCH) => debug!("Service {} exited before SIGTERM", self.pid),
            Err(e) => return Err(std::io::Error::from(e).into()),
        }

        let Some(child) = self.child.as_mut() else {
            return Ok(());
        };

        match timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                self.mark_exited(status);
                Ok(())
            }
            Ok(Err(e)) => {
                error!("Error waiting for service {}: {}", self.pid, e);
                Err(e.into())
            }
            Err(_) => {
                warn!("Service {} ignored SIGTERM for {:?}", self.pid, grace);
                Err(HarnessError::ShutdownTimeout {
                    pid: self.pid.as_raw(),
                    grace,
                })
            }
        }
    }

    fn mark_exited(&mut self, status: ExitStatus) {
        info!("Service {} exited with status: {:?}", self.pid, status);
        self.exit_status = Some(status);
        self.state = ServiceState::Stopped;
        self.child = None;
    }

    fn kill_group(&self) {
        match kill(Pid::from_raw(-self.pid.as_raw()), Signal::SIGKILL) {
            Ok(()) => warn!("Sent SIGKILL to process group {}", self.pid),
            Err(Errno::ESRCH) => {}
            Err(e) => error!("Failed to SIGKILL process group {}: {}", self.pid, e),
        }
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        // A handle dropped without a clean stop (panic, ShutdownTimeout) must
        // not leave the service holding the bus name for the next test.
        if self.child.is_some() {
            warn!("Service {} dropped while {:?}, killing", self.pid, self.state);
            self.kill_group();
        }
    }
}
