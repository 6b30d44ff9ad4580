//! Typed client bindings for the service's interfaces.
//!
//! Only the calls the harness and its tests drive are bound here. Every
//! per-object proxy has no default path; it is always built for a path the
//! service handed out.

use zbus::proxy;
use zbus::zvariant::OwnedObjectPath;

#[proxy(
    interface = "org.libvirt.Connect",
    default_service = "org.libvirt",
    default_path = "/org/libvirt/Test"
)]
pub trait Connect {
    fn list_domains(&self, flags: u32) -> zbus::Result<Vec<OwnedObjectPath>>;

    fn list_networks(&self, flags: u32) -> zbus::Result<Vec<OwnedObjectPath>>;

    fn list_storage_pools(&self, flags: u32) -> zbus::Result<Vec<OwnedObjectPath>>;

    fn list_node_devices(&self, flags: u32) -> zbus::Result<Vec<OwnedObjectPath>>;

    fn list_interfaces(&self, flags: u32) -> zbus::Result<Vec<OwnedObjectPath>>;

    fn domain_lookup_by_name(&self, name: &str) -> zbus::Result<OwnedObjectPath>;

    fn network_lookup_by_name(&self, name: &str) -> zbus::Result<OwnedObjectPath>;

    fn storage_pool_lookup_by_name(&self, name: &str) -> zbus::Result<OwnedObjectPath>;

    fn node_device_lookup_by_name(&self, name: &str) -> zbus::Result<OwnedObjectPath>;

    #[zbus(name = "NodeDeviceCreateXML")]
    fn node_device_create_xml(&self, xml: &str, flags: u32) -> zbus::Result<OwnedObjectPath>;

    #[zbus(name = "InterfaceDefineXML")]
    fn interface_define_xml(&self, xml: &str, flags: u32) -> zbus::Result<OwnedObjectPath>;

    #[zbus(property)]
    fn hostname(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn version(&self) -> zbus::Result<u64>;

    #[zbus(property)]
    fn lib_version(&self) -> zbus::Result<u64>;
}

#[proxy(interface = "org.libvirt.Domain", default_service = "org.libvirt")]
pub trait Domain {
    fn create(&self, flags: u32) -> zbus::Result<()>;

    fn destroy(&self, flags: u32) -> zbus::Result<()>;

    #[zbus(name = "SnapshotCreateXML")]
    fn snapshot_create_xml(&self, xml: &str, flags: u32) -> zbus::Result<OwnedObjectPath>;

    fn list_domain_snapshots(&self, flags: u32) -> zbus::Result<Vec<OwnedObjectPath>>;

    #[zbus(name = "GetXMLDesc")]
    fn get_xml_desc(&self, flags: u32) -> zbus::Result<String>;

    #[zbus(property)]
    fn name(&self) -> zbus::Result<String>;

    #[zbus(property, name = "UUID")]
    fn uuid(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn active(&self) -> zbus::Result<bool>;
}

#[proxy(interface = "org.libvirt.DomainSnapshot", default_service = "org.libvirt")]
pub trait DomainSnapshot {
    fn delete(&self, flags: u32) -> zbus::Result<()>;

    #[zbus(name = "GetXMLDesc")]
    fn get_xml_desc(&self, flags: u32) -> zbus::Result<String>;

    fn is_current(&self, flags: u32) -> zbus::Result<bool>;
}

#[proxy(interface = "org.libvirt.Interface", default_service = "org.libvirt")]
pub trait Interface {
    fn create(&self, flags: u32) -> zbus::Result<()>;

    fn destroy(&self, flags: u32) -> zbus::Result<()>;

    fn undefine(&self) -> zbus::Result<()>;

    #[zbus(name = "GetXMLDesc")]
    fn get_xml_desc(&self, flags: u32) -> zbus::Result<String>;

    #[zbus(property)]
    fn name(&self) -> zbus::Result<String>;

    #[zbus(property, name = "MAC")]
    fn mac(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn active(&self) -> zbus::Result<bool>;
}

#[proxy(interface = "org.libvirt.Network", default_service = "org.libvirt")]
pub trait Network {
    fn create(&self) -> zbus::Result<()>;

    fn destroy(&self) -> zbus::Result<()>;

    #[zbus(name = "GetXMLDesc")]
    fn get_xml_desc(&self, flags: u32) -> zbus::Result<String>;

    #[zbus(property)]
    fn name(&self) -> zbus::Result<String>;

    #[zbus(property, name = "UUID")]
    fn uuid(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn active(&self) -> zbus::Result<bool>;
}

#[proxy(interface = "org.libvirt.NodeDevice", default_service = "org.libvirt")]
pub trait NodeDevice {
    fn destroy(&self) -> zbus::Result<()>;

    #[zbus(name = "GetXMLDesc")]
    fn get_xml_desc(&self, flags: u32) -> zbus::Result<String>;

    fn list_caps(&self) -> zbus::Result<Vec<String>>;

    #[zbus(property)]
    fn name(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn parent(&self) -> zbus::Result<String>;
}

#[proxy(interface = "org.libvirt.StoragePool", default_service = "org.libvirt")]
pub trait StoragePool {
    #[zbus(name = "StorageVolCreateXML")]
    fn storage_vol_create_xml(&self, xml: &str, flags: u32) -> zbus::Result<OwnedObjectPath>;

    fn list_storage_volumes(&self, flags: u32) -> zbus::Result<Vec<OwnedObjectPath>>;

    #[zbus(name = "GetXMLDesc")]
    fn get_xml_desc(&self, flags: u32) -> zbus::Result<String>;

    #[zbus(property)]
    fn name(&self) -> zbus::Result<String>;

    #[zbus(property, name = "UUID")]
    fn uuid(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn active(&self) -> zbus::Result<bool>;
}

#[proxy(interface = "org.libvirt.StorageVol", default_service = "org.libvirt")]
pub trait StorageVol {
    fn delete(&self, flags: u32) -> zbus::Result<()>;

    #[zbus(name = "GetXMLDesc")]
    fn get_xml_desc(&self, flags: u32) -> zbus::Result<String>;

    #[zbus(property)]
    fn name(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn key(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn path(&self) -> zbus::Result<String>;
}
