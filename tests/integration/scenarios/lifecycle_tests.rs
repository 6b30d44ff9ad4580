use crate::infrastructure::{init_tracing, process_alive, session_bus_available, ServiceTestHarness};
use anyhow::Result;
use futures::FutureExt;
use nix::unistd::Pid;
use serial_test::serial;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use virt_dbus_harness::bus::SERVICE_NAME;
use virt_dbus_harness::{
    HarnessConfig, HarnessError, ReadinessPolicy, ServiceContext, ServiceState,
};
use zbus::names::BusName;

/// The name owner is the process this test started, and it is gone once the
/// test returns
#[tokio::test]
#[serial]
async fn test_service_scoped_to_test() -> Result<()> {
    let Some(harness) = ServiceTestHarness::new() else {
        return Ok(());
    };

    let pid = harness
        .run(|ctx| {
            Box::pin(async move {
                let service = ctx.service();
                assert!(service.is_running());
                assert_eq!(service.state(), ServiceState::Running);
                let pid = service.pid();

                let dbus = zbus::fdo::DBusProxy::new(ctx.connection().bus()).await?;
                let owner = dbus
                    .get_connection_unix_process_id(BusName::try_from(SERVICE_NAME)?)
                    .await?;
                assert_eq!(owner as i32, pid.as_raw(), "name owned by another process");

                Ok(pid)
            })
        })
        .await?;

    assert!(!process_alive(pid), "service {} outlived its test", pid);
    Ok(())
}

/// A failing test body is reported, and the service is still torn down
#[tokio::test]
#[serial]
async fn test_failing_body_still_tears_down() -> Result<()> {
    let Some(harness) = ServiceTestHarness::new() else {
        return Ok(());
    };

    let pid = Arc::new(AtomicI32::new(0));
    let seen = pid.clone();

    let result: Result<()> = harness
        .run(move |ctx| {
            Box::pin(async move {
                seen.store(ctx.service().pid().as_raw(), Ordering::SeqCst);
                anyhow::bail!("scenario failed mid-way")
            })
        })
        .await;

    assert!(result.is_err());
    assert!(!process_alive(Pid::from_raw(pid.load(Ordering::SeqCst))));
    Ok(())
}

/// A panicking test body still tears the service down before unwinding
#[tokio::test]
#[serial]
async fn test_panicking_body_still_tears_down() -> Result<()> {
    let Some(harness) = ServiceTestHarness::new() else {
        return Ok(());
    };

    let pid = Arc::new(AtomicI32::new(0));
    let seen = pid.clone();

    let result = AssertUnwindSafe(harness.run(move |ctx| {
        Box::pin(async move {
            seen.store(ctx.service().pid().as_raw(), Ordering::SeqCst);
            fail_scenario();
            Ok(())
        })
    }))
    .catch_unwind()
    .await;

    assert!(result.is_err(), "panic should propagate out of the scope");
    assert!(!process_alive(Pid::from_raw(pid.load(Ordering::SeqCst))));
    Ok(())
}

/// A process that never claims the name is reported unavailable after the
/// whole poll budget, and is stopped again
#[tokio::test]
#[serial]
async fn test_never_registering_service_is_unavailable() -> Result<()> {
    init_tracing();
    if !session_bus_available() {
        info!("Skipping: no session bus in this environment");
        return Ok(());
    }

    let mut config = HarnessConfig::from_env();
    config.executable = PathBuf::from("sleep");
    config.args = vec!["30".to_string()];
    config.readiness = ReadinessPolicy::default();
    config.shutdown_grace = Duration::from_secs(2);

    let started = Instant::now();
    match ServiceContext::start(config).await {
        Err(HarnessError::ServiceUnavailable { name, attempts, .. }) => {
            assert_eq!(name, SERVICE_NAME);
            assert_eq!(attempts, 10);
        }
        Err(other) => panic!("expected ServiceUnavailable, got {:?}", other),
        Ok(_) => panic!("sleep should never own {}", SERVICE_NAME),
    }

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(900), "gave up after {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);
    Ok(())
}

/// A missing executable fails at startup without touching the bus
#[tokio::test]
async fn test_missing_executable_fails_startup() -> Result<()> {
    init_tracing();

    let mut config = HarnessConfig::from_env();
    config.executable = PathBuf::from("/nonexistent/libvirt-dbus");

    match ServiceContext::start(config).await {
        Err(HarnessError::Startup { executable, .. }) => {
            assert_eq!(executable, PathBuf::from("/nonexistent/libvirt-dbus"));
        }
        Err(other) => panic!("expected a startup error, got {:?}", other),
        Ok(_) => panic!("startup should have failed"),
    }
    Ok(())
}

fn fail_scenario() {
    panic!("scenario failed mid-way");
}
