use crate::infrastructure::{is_string, ServiceTestHarness};
use anyhow::Result;
use serial_test::serial;
use virt_dbus_harness::bus::ROOT_PATH;
use virt_dbus_harness::{FixtureKind, HarnessError};
use zbus::zvariant::OwnedObjectPath;

#[tokio::test]
#[serial]
async fn test_interface_create() -> Result<()> {
    let Some(harness) = ServiceTestHarness::new() else {
        return Ok(());
    };

    harness
        .run(|ctx| {
            Box::pin(async move {
                let interface = ctx.fixtures().interface_create().await?;
                assert_eq!(interface.kind(), FixtureKind::Interface);
                assert!(interface.is_live());

                let proxy = ctx.connection().resolve_interface(interface.path()).await?;
                assert_eq!(proxy.name().await?, "test5");
                assert_eq!(proxy.mac().await?, "0a:0b:0c:0d:0e:0f");
                assert!(proxy.active().await?);
                Ok(())
            })
        })
        .await
}

#[tokio::test]
#[serial]
async fn test_snapshot_create() -> Result<()> {
    let Some(harness) = ServiceTestHarness::new() else {
        return Ok(());
    };

    harness
        .run(|ctx| {
            Box::pin(async move {
                let snapshot = ctx.fixtures().snapshot_create().await?;
                let proxy = ctx
                    .connection()
                    .resolve_domain_snapshot(snapshot.path())
                    .await?;

                let xml = proxy.get_xml_desc(0).await?;
                assert!(xml.contains("snapshot1"), "unexpected description: {}", xml);

                let domain = ctx.connection().test_domain().await?;
                let snapshots = domain.list_domain_snapshots(0).await?;
                assert!(snapshots.contains(snapshot.path()));
                Ok(())
            })
        })
        .await
}

#[tokio::test]
#[serial]
async fn test_storage_volume_create() -> Result<()> {
    let Some(harness) = ServiceTestHarness::new() else {
        return Ok(());
    };

    harness
        .run(|ctx| {
            Box::pin(async move {
                let mut volume = ctx.fixtures().storage_volume_create().await?;
                let proxy = ctx.connection().resolve_storage_vol(volume.path()).await?;
                assert_eq!(proxy.name().await?, "sparse.img");

                let props = proxy.get_all_properties().await?;
                for name in ["Name", "Key", "Path"] {
                    let value = props
                        .get(name)
                        .unwrap_or_else(|| panic!("property {} missing", name));
                    assert!(is_string(value), "{} should be a string", name);
                }

                ctx.fixtures().destroy(&mut volume).await?;
                assert!(!volume.is_live());
                Ok(())
            })
        })
        .await
}

/// Each kind of fixture exists at most once per test
#[tokio::test]
#[serial]
async fn test_fixture_created_once_per_test() -> Result<()> {
    let Some(harness) = ServiceTestHarness::new() else {
        return Ok(());
    };

    harness
        .run(|ctx| {
            Box::pin(async move {
                ctx.fixtures().snapshot_create().await?;

                match ctx.fixtures().snapshot_create().await {
                    Err(HarnessError::Usage(_)) => {}
                    other => panic!("expected a usage error, got {:?}", other),
                }
                Ok(())
            })
        })
        .await
}

/// The objects the test driver ships with resolve and answer
#[tokio::test]
#[serial]
async fn test_driver_objects_resolve() -> Result<()> {
    let Some(harness) = ServiceTestHarness::new() else {
        return Ok(());
    };

    harness
        .run(|ctx| {
            Box::pin(async move {
                let connection = ctx.connection();

                let root = connection
                    .resolve_connect(&OwnedObjectPath::try_from(ROOT_PATH)?)
                    .await?;
                assert!(!root.hostname().await?.is_empty());
                assert!(root.get_all_properties().await?.contains_key("Hostname"));

                let domain = connection.test_domain().await?;
                assert!(!domain.name().await?.is_empty());
                assert!(domain.get_all_properties().await?.contains_key("UUID"));

                let network = connection.test_network().await?;
                assert!(!network.name().await?.is_empty());

                let pool = connection.test_storage_pool().await?;
                assert!(pool.active().await?);

                let volume = connection.test_storage_volume().await?;
                assert!(!volume.proxy().path().await?.is_empty());
                Ok(())
            })
        })
        .await
}
