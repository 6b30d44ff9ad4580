use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use virt_dbus_harness::config::{
    EVENT_TIMEOUT_VAR, EXECUTABLE_VAR, READY_ATTEMPTS_VAR, READY_INTERVAL_VAR, SHUTDOWN_GRACE_VAR,
};
use virt_dbus_harness::environment::LOG_LEVEL_VAR;
use virt_dbus_harness::HarnessConfig;

/// Starts libvirt-dbus, waits for it on the session bus and reports what the
/// test driver exposes
#[derive(Parser)]
#[command(name = "virt-dbus-probe")]
#[command(about = "Check that libvirt-dbus starts and answers on the session bus")]
#[command(version)]
pub struct Cli {
    /// Service executable (default: $abs_top_builddir/src/libvirt-dbus)
    #[arg(long, env = EXECUTABLE_VAR)]
    pub executable: Option<PathBuf>,

    /// Ownership poll attempts
    #[arg(long, env = READY_ATTEMPTS_VAR, default_value = "10")]
    pub ready_attempts: u32,

    /// Ownership poll interval (ms)
    #[arg(long, env = READY_INTERVAL_VAR, default_value = "100")]
    pub ready_interval_ms: u64,

    /// Default notification wait (ms)
    #[arg(long, env = EVENT_TIMEOUT_VAR, default_value = "2000")]
    pub event_timeout_ms: u64,

    /// Time allowed for the service to exit after SIGTERM (seconds)
    #[arg(long, env = SHUTDOWN_GRACE_VAR, default_value = "10")]
    pub shutdown_grace_secs: u64,

    /// Service log verbosity
    #[arg(long, env = LOG_LEVEL_VAR, default_value = "3")]
    pub log_level: String,

    /// Extra flags for the service (default: --session)
    #[arg(last = true)]
    pub service_args: Vec<String>,
}

impl Cli {
    /// Layers the command line over the environment-derived configuration
    pub fn into_config(self) -> HarnessConfig {
        let mut config = HarnessConfig::from_env();

        if let Some(executable) = self.executable {
            config.executable = executable;
        }
        if !self.service_args.is_empty() {
            config.args = self.service_args;
        }

        config.readiness.max_attempts = self.ready_attempts.max(1);
        config.readiness.interval = Duration::from_millis(self.ready_interval_ms);
        config.event_timeout = Duration::from_millis(self.event_timeout_ms);
        config.shutdown_grace = Duration::from_secs(self.shutdown_grace_secs);
        config.environment.set(LOG_LEVEL_VAR, self.log_level);

        config
    }
}
