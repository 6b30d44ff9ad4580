use std::collections::HashSet;

use tracing::{debug, info};
use zbus::zvariant::OwnedObjectPath;

use crate::bus::Connection;
use crate::error::{HarnessError, Result};
use crate::xmldata::{
    MINIMAL_INTERFACE_XML, MINIMAL_NODE_DEVICE_XML, MINIMAL_SNAPSHOT_XML, MINIMAL_STORAGE_VOL_XML,
    PARENT_PLACEHOLDER,
};

/// Parent devices tried, in order, for the node device fixture.
///
/// `scsi_host2` exists in newer test drivers, `test-scsi-host-vport` in older
/// ones.
pub const NODE_DEVICE_PARENTS: [&str; 2] = ["scsi_host2", "test-scsi-host-vport"];

/// Kinds of server-side resource a test can provision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureKind {
    /// Defined and started network interface
    Interface,
    /// vHBA node device
    NodeDevice,
    /// Snapshot of the test domain
    DomainSnapshot,
    /// Volume in the test storage pool
    StorageVolume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    Absent,
    Live,
}

/// A resource created for, and owned by, a single test
#[derive(Debug)]
pub struct Fixture {
    kind: FixtureKind,
    path: OwnedObjectPath,
    state: FixtureState,
}

impl Fixture {
    pub fn kind(&self) -> FixtureKind {
        self.kind
    }

    pub fn path(&self) -> &OwnedObjectPath {
        &self.path
    }

    pub fn state(&self) -> FixtureState {
        self.state
    }

    pub fn is_live(&self) -> bool {
        self.state == FixtureState::Live
    }
}

/// Remote calls fixtures are built from.
///
/// Implemented by [`Connection`]; tests substitute a recording stub.
#[allow(async_fn_in_trait)]
pub trait RemoteCalls {
    async fn list_domains(&self) -> Result<Vec<OwnedObjectPath>>;
    async fn list_storage_pools(&self) -> Result<Vec<OwnedObjectPath>>;
    async fn node_device_lookup_by_name(&self, name: &str) -> Result<OwnedObjectPath>;
    async fn node_device_create_xml(&self, xml: &str) -> Result<OwnedObjectPath>;
    async fn interface_define_xml(&self, xml: &str) -> Result<OwnedObjectPath>;
    async fn interface_create(&self, interface: &OwnedObjectPath) -> Result<()>;
    async fn snapshot_create_xml(&self, domain: &OwnedObjectPath, xml: &str) -> Result<OwnedObjectPath>;
    async fn storage_vol_create_xml(&self, pool: &OwnedObjectPath, xml: &str) -> Result<OwnedObjectPath>;
    async fn destroy(&self, kind: FixtureKind, path: &OwnedObjectPath) -> Result<()>;
}

impl RemoteCalls for Connection {
    async fn list_domains(&self) -> Result<Vec<OwnedObjectPath>> {
        Ok(self.root().list_domains(0).await?)
    }

    async fn list_storage_pools(&self) -> Result<Vec<OwnedObjectPath>> {
        Ok(self.root().list_storage_pools(0).await?)
    }

    async fn node_device_lookup_by_name(&self, name: &str) -> Result<OwnedObjectPath> {
        Ok(self.root().node_device_lookup_by_name(name).await?)
    }

    async fn node_device_create_xml(&self, xml: &str) -> Result<OwnedObjectPath> {
        Ok(self.root().node_device_create_xml(xml, 0).await?)
    }

    async fn interface_define_xml(&self, xml: &str) -> Result<OwnedObjectPath> {
        Ok(self.root().interface_define_xml(xml, 0).await?)
    }

    async fn interface_create(&self, interface: &OwnedObjectPath) -> Result<()> {
        Ok(self.resolve_interface(interface).await?.create(0).await?)
    }

    async fn snapshot_create_xml(&self, domain: &OwnedObjectPath, xml: &str) -> Result<OwnedObjectPath> {
        Ok(self.resolve_domain(domain).await?.snapshot_create_xml(xml, 0).await?)
    }

    async fn storage_vol_create_xml(&self, pool: &OwnedObjectPath, xml: &str) -> Result<OwnedObjectPath> {
        Ok(self
            .resolve_storage_pool(pool)
            .await?
            .storage_vol_create_xml(xml, 0)
            .await?)
    }

    async fn destroy(&self, kind: FixtureKind, path: &OwnedObjectPath) -> Result<()> {
        match kind {
            FixtureKind::Interface => self.resolve_interface(path).await?.destroy(0).await?,
            FixtureKind::NodeDevice => self.resolve_node_device(path).await?.destroy().await?,
            FixtureKind::DomainSnapshot => {
                self.resolve_domain_snapshot(path).await?.delete(0).await?
            }
            FixtureKind::StorageVolume => self.resolve_storage_vol(path).await?.delete(0).await?,
        }
        Ok(())
    }
}

/// Creates and destroys the per-test fixtures.
///
/// Each kind may be created once per manager, and a manager lives for one
/// test. Nothing here retries: the first failure is returned as is.
pub struct FixtureManager<R> {
    remote: R,
    created: HashSet<FixtureKind>,
}

impl<R: RemoteCalls> FixtureManager<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            created: HashSet::new(),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Defines the minimal interface and starts it
    pub async fn interface_create(&mut self) -> Result<Fixture> {
        self.claim(FixtureKind::Interface)?;

        let path = self.remote.interface_define_xml(MINIMAL_INTERFACE_XML).await?;
        self.remote.interface_create(&path).await?;

        Ok(self.live(FixtureKind::Interface, path))
    }

    /// Creates a vHBA under the first available default parent
    pub async fn node_device_create(&mut self) -> Result<Fixture> {
        self.node_device_create_under(&NODE_DEVICE_PARENTS).await
    }

    /// Creates a vHBA under the first of `candidates` the service knows.
    ///
    /// When none is found the placeholder stays in the definition and the
    /// creation call is left to fail on the service side.
    pub async fn node_device_create_under(&mut self, candidates: &[&str]) -> Result<Fixture> {
        self.claim(FixtureKind::NodeDevice)?;

        let xml = match self.probe_parent(candidates).await? {
            Some(parent) => MINIMAL_NODE_DEVICE_XML.replace(PARENT_PLACEHOLDER, parent),
            None => {
                info!("No parent among {:?}, creating without substitution", candidates);
                MINIMAL_NODE_DEVICE_XML.to_string()
            }
        };

        let path = self.remote.node_device_create_xml(&xml).await?;
        Ok(self.live(FixtureKind::NodeDevice, path))
    }

    /// Snapshots the first domain of the test driver
    pub async fn snapshot_create(&mut self) -> Result<Fixture> {
        self.claim(FixtureKind::DomainSnapshot)?;

        let domain = self
            .remote
            .list_domains()
            .await?
            .into_iter()
            .next()
            .ok_or(HarnessError::MissingObject("domain"))?;
        let path = self.remote.snapshot_create_xml(&domain, MINIMAL_SNAPSHOT_XML).await?;

        Ok(self.live(FixtureKind::DomainSnapshot, path))
    }

    /// Creates a volume in the first storage pool of the test driver
    pub async fn storage_volume_create(&mut self) -> Result<Fixture> {
        self.claim(FixtureKind::StorageVolume)?;

        let pool = self
            .remote
            .list_storage_pools()
            .await?
            .into_iter()
            .next()
            .ok_or(HarnessError::MissingObject("storage pool"))?;
        let path = self
            .remote
            .storage_vol_create_xml(&pool, MINIMAL_STORAGE_VOL_XML)
            .await?;

        Ok(self.live(FixtureKind::StorageVolume, path))
    }

    /// Tears the fixture down on the service.
    ///
    /// The call is always forwarded, so destroying twice surfaces the
    /// service's own error; the fixture only leaves `Live` on success.
    pub async fn destroy(&self, fixture: &mut Fixture) -> Result<()> {
        debug!("Destroying {:?} fixture {}", fixture.kind, fixture.path.as_str());
        self.remote.destroy(fixture.kind, &fixture.path).await?;
        fixture.state = FixtureState::Absent;
        Ok(())
    }

    /// Returns the first candidate the service can look up.
    ///
    /// Only errors raised by the service itself count as "not found";
    /// anything else (access denied, broken transport) aborts the probe.
    async fn probe_parent<'c>(&self, candidates: &[&'c str]) -> Result<Option<&'c str>> {
        for candidate in candidates {
            match self.remote.node_device_lookup_by_name(candidate).await {
                Ok(_) => {
                    debug!("Using {} as node device parent", candidate);
                    return Ok(Some(*candidate));
                }
                Err(HarnessError::Remote(e)) if e.is_service_error() => {
                    debug!("Parent candidate {} unavailable: {}", candidate, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    fn claim(&mut self, kind: FixtureKind) -> Result<()> {
        if !self.created.insert(kind) {
            return Err(HarnessError::Usage("fixture already created in this test"));
        }
        Ok(())
    }

    fn live(&self, kind: FixtureKind, path: OwnedObjectPath) -> Fixture {
        info!("Created {:?} fixture {}", kind, path.as_str());
        Fixture {
            kind,
            path,
            state: FixtureState::Live,
        }
    }
}
