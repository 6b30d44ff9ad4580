use anyhow::Result;
use futures::future::BoxFuture;
use std::path::PathBuf;
use tracing::info;
use virt_dbus_harness::{HarnessConfig, ServiceContext};

/// Runs scenarios against a real libvirt-dbus on the session bus.
///
/// Every call to [`ServiceTestHarness::run`] starts a fresh service and tears
/// it down again, so scenarios never see each other's fixtures.
pub struct ServiceTestHarness {
    config: HarnessConfig,
}

impl ServiceTestHarness {
    /// Locates the service and the session bus.
    ///
    /// Returns `None` when either is missing; the calling test then returns
    /// early and passes without touching the bus.
    pub fn new() -> Option<Self> {
        init_tracing();

        if !session_bus_available() {
            info!("Skipping: no session bus in this environment");
            return None;
        }

        let mut config = HarnessConfig::from_env();
        match which::which(&config.executable) {
            Ok(executable) => config.executable = executable,
            Err(_) => {
                info!("Skipping: {} not found", config.executable.display());
                return None;
            }
        }

        Some(Self { config })
    }

    /// Runs `body` inside a freshly started service
    pub async fn run<T, F>(&self, body: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a mut ServiceContext) -> BoxFuture<'a, Result<T>>,
    {
        ServiceContext::scoped(self.config.clone(), body).await
    }
}

/// True when a session bus address can be found the way zbus looks for one
pub fn session_bus_available() -> bool {
    if std::env::var_os("DBUS_SESSION_BUS_ADDRESS").is_some() {
        return true;
    }

    std::env::var_os("XDG_RUNTIME_DIR")
        .map(|dir| PathBuf::from(dir).join("bus").exists())
        .unwrap_or(false)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
