use std::collections::HashMap;
use std::ops::Deref;
use std::time::Instant;

use tokio::time::sleep;
use tracing::{debug, info};
use zbus::names::{BusName, InterfaceName};
use zbus::proxy::CacheProperties;
use zbus::zvariant::{Optional, OwnedObjectPath, OwnedValue};

use crate::config::ReadinessPolicy;
use crate::error::{HarnessError, Result};
use crate::notifications::{decode_stream, NotificationStream, SignalKind};
use crate::proxies::{
    ConnectProxy, DomainProxy, DomainSnapshotProxy, InterfaceProxy, NetworkProxy,
    NodeDeviceProxy, StoragePoolProxy, StorageVolProxy,
};

/// Well-known name the service claims on the bus
pub const SERVICE_NAME: &str = "org.libvirt";
/// Root object of the test driver connection
pub const ROOT_PATH: &str = "/org/libvirt/Test";

pub const CONNECT_INTERFACE: &str = "org.libvirt.Connect";
pub const DOMAIN_INTERFACE: &str = "org.libvirt.Domain";
pub const DOMAIN_SNAPSHOT_INTERFACE: &str = "org.libvirt.DomainSnapshot";
pub const INTERFACE_INTERFACE: &str = "org.libvirt.Interface";
pub const NETWORK_INTERFACE: &str = "org.libvirt.Network";
pub const NODE_DEVICE_INTERFACE: &str = "org.libvirt.NodeDevice";
pub const STORAGE_POOL_INTERFACE: &str = "org.libvirt.StoragePool";
pub const STORAGE_VOL_INTERFACE: &str = "org.libvirt.StorageVol";

/// Answers whether a bus name currently has an owner
#[allow(async_fn_in_trait)]
pub trait NameOwnership {
    async fn name_has_owner(&self, name: &str) -> Result<bool>;
}

impl NameOwnership for zbus::fdo::DBusProxy<'_> {
    async fn name_has_owner(&self, name: &str) -> Result<bool> {
        let name = BusName::try_from(name).map_err(zbus::Error::from)?;
        Ok(zbus::fdo::DBusProxy::name_has_owner(self, name).await?)
    }
}

/// Polls `name` until it is owned or the policy is exhausted.
///
/// The service registers its name asynchronously after the process starts,
/// and offers no readiness signal, so a short fixed-interval poll is all
/// there is. Bus errors during the poll are not retried.
pub async fn wait_for_owner<O>(bus: &O, name: &str, policy: ReadinessPolicy) -> Result<()>
where
    O: NameOwnership,
{
    let started = Instant::now();
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        if bus.name_has_owner(name).await? {
            info!("{} owned after {} attempt(s) ({:?})", name, attempt, started.elapsed());
            return Ok(());
        }
        debug!("{} not owned yet (attempt {}/{})", name, attempt, attempts);
        sleep(policy.interval).await;
    }

    Err(HarnessError::ServiceUnavailable {
        name: name.to_string(),
        attempts,
        elapsed: started.elapsed(),
    })
}

/// A typed proxy bound to one remote object
#[derive(Clone)]
pub struct ObjectReference<P> {
    bus: zbus::Connection,
    path: OwnedObjectPath,
    interface: &'static str,
    proxy: P,
}

impl<P> ObjectReference<P> {
    fn new(bus: zbus::Connection, path: OwnedObjectPath, interface: &'static str, proxy: P) -> Self {
        Self {
            bus,
            path,
            interface,
            proxy,
        }
    }

    pub fn path(&self) -> &OwnedObjectPath {
        &self.path
    }

    pub fn interface(&self) -> &'static str {
        self.interface
    }

    pub fn proxy(&self) -> &P {
        &self.proxy
    }

    /// `org.freedesktop.DBus.Properties.GetAll` for this object's interface
    pub async fn get_all_properties(&self) -> Result<HashMap<String, OwnedValue>> {
        let properties = zbus::fdo::PropertiesProxy::builder(&self.bus)
            .destination(SERVICE_NAME)?
            .path(self.path.as_str().to_owned())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        let interface = InterfaceName::try_from(self.interface).map_err(zbus::Error::from)?;
        Ok(properties.get_all(Optional::from(Some(interface))).await?)
    }
}

impl<P> Deref for ObjectReference<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.proxy
    }
}

/// Builds a resolver for one interface. No call is made and nothing about
/// the object is checked until the proxy is first used.
macro_rules! resolver {
    ($(#[$meta:meta])* $name:ident, $proxy:ident, $interface:expr) => {
        $(#[$meta])*
        pub async fn $name(&self, path: &OwnedObjectPath) -> Result<ObjectReference<$proxy<'static>>> {
            let proxy = $proxy::builder(&self.bus)
                .path(path.as_str().to_owned())?
                .cache_properties(CacheProperties::No)
                .build()
                .await?;
            Ok(ObjectReference::new(self.bus.clone(), path.clone(), $interface, proxy))
        }
    };
}

/// Session bus connection to a service that has claimed its name
#[derive(Clone)]
pub struct Connection {
    bus: zbus::Connection,
    root: ConnectProxy<'static>,
}

impl Connection {
    /// Opens the session bus and waits for the service to own its name
    pub async fn connect(policy: ReadinessPolicy) -> Result<Self> {
        let bus = zbus::Connection::session().await?;
        Self::connect_on(bus, policy).await
    }

    /// Same as [`Connection::connect`] over an already open bus
    pub async fn connect_on(bus: zbus::Connection, policy: ReadinessPolicy) -> Result<Self> {
        let dbus = zbus::fdo::DBusProxy::new(&bus).await?;
        wait_for_owner(&dbus, SERVICE_NAME, policy).await?;

        let root = ConnectProxy::builder(&bus)
            .cache_properties(CacheProperties::No)
            .build()
            .await?;

        Ok(Self { bus, root })
    }

    pub fn bus(&self) -> &zbus::Connection {
        &self.bus
    }

    /// The `org.libvirt.Connect` root object
    pub fn root(&self) -> &ConnectProxy<'static> {
        &self.root
    }

    /// Subscribes to one lifecycle signal class
    pub async fn subscribe(&self, signal: SignalKind) -> Result<NotificationStream> {
        let messages = self.root.inner().receive_signal(signal.member()).await?;
        debug!("Subscribed to {}", signal);
        Ok(decode_stream(signal, messages))
    }

    resolver!(resolve_connect, ConnectProxy, CONNECT_INTERFACE);
    resolver!(resolve_domain, DomainProxy, DOMAIN_INTERFACE);
    resolver!(resolve_domain_snapshot, DomainSnapshotProxy, DOMAIN_SNAPSHOT_INTERFACE);
    resolver!(resolve_interface, InterfaceProxy, INTERFACE_INTERFACE);
    resolver!(resolve_network, NetworkProxy, NETWORK_INTERFACE);
    resolver!(resolve_node_device, NodeDeviceProxy, NODE_DEVICE_INTERFACE);
    resolver!(resolve_storage_pool, StoragePoolProxy, STORAGE_POOL_INTERFACE);
    resolver!(resolve_storage_vol, StorageVolProxy, STORAGE_VOL_INTERFACE);

    /// First domain defined by the test driver
    pub async fn test_domain(&self) -> Result<ObjectReference<DomainProxy<'static>>> {
        let path = first(self.root.list_domains(0).await?, "domain")?;
        self.resolve_domain(&path).await
    }

    /// First network defined by the test driver
    pub async fn test_network(&self) -> Result<ObjectReference<NetworkProxy<'static>>> {
        let path = first(self.root.list_networks(0).await?, "network")?;
        self.resolve_network(&path).await
    }

    /// First storage pool defined by the test driver
    pub async fn test_storage_pool(&self) -> Result<ObjectReference<StoragePoolProxy<'static>>> {
        let path = first(self.root.list_storage_pools(0).await?, "storage pool")?;
        self.resolve_storage_pool(&path).await
    }

    /// First volume of the test storage pool
    pub async fn test_storage_volume(&self) -> Result<ObjectReference<StorageVolProxy<'static>>> {
        let pool = self.test_storage_pool().await?;
        let path = first(pool.list_storage_volumes(0).await?, "storage volume")?;
        self.resolve_storage_vol(&path).await
    }
}

fn first(paths: Vec<OwnedObjectPath>, what: &'static str) -> Result<OwnedObjectPath> {
    paths
        .into_iter()
        .next()
        .ok_or(HarnessError::MissingObject(what))
}
