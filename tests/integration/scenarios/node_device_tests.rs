use crate::infrastructure::{assert_observed, assert_service_error, is_string, ServiceTestHarness};
use anyhow::Result;
use serial_test::serial;
use tracing::info;
use virt_dbus_harness::events::NodeDeviceEvent;
use virt_dbus_harness::{FixtureState, NotificationFilter, SignalKind};

/// Destroying a node device is announced for exactly that device
#[tokio::test]
#[serial]
async fn test_node_device_destroy_emits_deleted() -> Result<()> {
    let Some(harness) = ServiceTestHarness::new() else {
        return Ok(());
    };

    harness
        .run(|ctx| {
            Box::pin(async move {
                let mut device = ctx.fixtures().node_device_create().await?;
                ctx.subscribe(SignalKind::NodeDevice).await?;

                ctx.fixtures().destroy(&mut device).await?;
                assert_eq!(device.state(), FixtureState::Absent);

                let filter = NotificationFilter::new(SignalKind::NodeDevice)
                    .path(device.path())
                    .event(NodeDeviceEvent::Deleted);
                let notification = assert_observed(ctx.events().wait_for(&filter).await?);

                info!("Observed {:?}", notification);
                assert_eq!(&notification.path, device.path());
                assert_eq!(notification.event, NodeDeviceEvent::Deleted.code());
                Ok(())
            })
        })
        .await
}

#[tokio::test]
#[serial]
async fn test_node_device_get_xml_description() -> Result<()> {
    let Some(harness) = ServiceTestHarness::new() else {
        return Ok(());
    };

    harness
        .run(|ctx| {
            Box::pin(async move {
                let device = ctx.fixtures().node_device_create().await?;
                let proxy = ctx.connection().resolve_node_device(device.path()).await?;

                let xml = proxy.get_xml_desc(0).await?;
                assert!(xml.contains("<device>"), "unexpected description: {}", xml);
                Ok(())
            })
        })
        .await
}

#[tokio::test]
#[serial]
async fn test_node_device_list_caps() -> Result<()> {
    let Some(harness) = ServiceTestHarness::new() else {
        return Ok(());
    };

    harness
        .run(|ctx| {
            Box::pin(async move {
                let device = ctx.fixtures().node_device_create().await?;
                let proxy = ctx.connection().resolve_node_device(device.path()).await?;

                let caps = proxy.list_caps().await?;
                assert!(
                    caps.iter().any(|cap| cap == "scsi_host"),
                    "vHBA should report scsi_host, got {:?}",
                    caps
                );
                Ok(())
            })
        })
        .await
}

#[tokio::test]
#[serial]
async fn test_node_device_properties_type() -> Result<()> {
    let Some(harness) = ServiceTestHarness::new() else {
        return Ok(());
    };

    harness
        .run(|ctx| {
            Box::pin(async move {
                let device = ctx.fixtures().node_device_create().await?;
                let proxy = ctx.connection().resolve_node_device(device.path()).await?;

                let props = proxy.get_all_properties().await?;
                for name in ["Name", "Parent"] {
                    let value = props
                        .get(name)
                        .unwrap_or_else(|| panic!("property {} missing", name));
                    assert!(is_string(value), "{} should be a string, got {:?}", name, value);
                }
                Ok(())
            })
        })
        .await
}

/// A destroyed device cannot be destroyed again, and the fixture stays absent
#[tokio::test]
#[serial]
async fn test_node_device_destroy_twice_fails_remotely() -> Result<()> {
    let Some(harness) = ServiceTestHarness::new() else {
        return Ok(());
    };

    harness
        .run(|ctx| {
            Box::pin(async move {
                let mut device = ctx.fixtures().node_device_create().await?;
                ctx.fixtures().destroy(&mut device).await?;

                assert_service_error(ctx.fixtures().destroy(&mut device).await);
                assert_eq!(device.state(), FixtureState::Absent);
                Ok(())
            })
        })
        .await
}
