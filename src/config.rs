use std::path::PathBuf;
use std::time::Duration;

use crate::environment::ServiceEnvironment;

/// Explicit path to the service executable.
pub const EXECUTABLE_VAR: &str = "LIBVIRT_DBUS";
/// Build tree root; the executable is looked up at `<root>/src/libvirt-dbus`.
pub const BUILD_ROOT_VAR: &str = "abs_top_builddir";
pub const READY_ATTEMPTS_VAR: &str = "LIBVIRT_DBUS_READY_ATTEMPTS";
pub const READY_INTERVAL_VAR: &str = "LIBVIRT_DBUS_READY_INTERVAL_MS";
pub const EVENT_TIMEOUT_VAR: &str = "LIBVIRT_DBUS_EVENT_TIMEOUT_MS";
pub const SHUTDOWN_GRACE_VAR: &str = "LIBVIRT_DBUS_SHUTDOWN_GRACE_SECS";

pub const DEFAULT_READY_ATTEMPTS: u32 = 10;
pub const DEFAULT_READY_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_millis(2000);
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// How long to poll for the service to claim its bus name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Number of ownership checks before giving up
    pub max_attempts: u32,
    /// Pause between two checks
    pub interval: Duration,
}

impl ReadinessPolicy {
    /// Upper bound on the time spent polling
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_READY_ATTEMPTS,
            interval: DEFAULT_READY_INTERVAL,
        }
    }
}

/// Configuration for one harness run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Service executable to launch
    pub executable: PathBuf,
    /// Flags passed to the executable
    pub args: Vec<String>,
    /// Extra environment for the service process
    pub environment: ServiceEnvironment,
    /// Name ownership polling policy
    pub readiness: ReadinessPolicy,
    /// Time allowed between SIGTERM and process exit
    pub shutdown_grace: Duration,
    /// Default deadline for notification waits
    pub event_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("libvirt-dbus"),
            args: vec!["--session".to_string()],
            environment: ServiceEnvironment::service_default(),
            readiness: ReadinessPolicy::default(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            event_timeout: DEFAULT_EVENT_TIMEOUT,
        }
    }
}

impl HarnessConfig {
    /// Builds the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Unparsable numeric values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(exe) = lookup(EXECUTABLE_VAR) {
            config.executable = PathBuf::from(exe);
        } else if let Some(root) = lookup(BUILD_ROOT_VAR) {
            config.executable = PathBuf::from(root).join("src").join("libvirt-dbus");
        }

        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        if let Some(attempts) = number(READY_ATTEMPTS_VAR) {
            config.readiness.max_attempts = u32::try_from(attempts).unwrap_or(u32::MAX).max(1);
        }
        if let Some(ms) = number(READY_INTERVAL_VAR) {
            config.readiness.interval = Duration::from_millis(ms);
        }
        if let Some(ms) = number(EVENT_TIMEOUT_VAR) {
            config.event_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = number(SHUTDOWN_GRACE_VAR) {
            config.shutdown_grace = Duration::from_secs(secs);
        }

        config
    }
}
