//! Minimal definitions accepted by the test driver.

/// Placeholder replaced with the probed parent device name
pub const PARENT_PLACEHOLDER: &str = "@parent@";

pub const MINIMAL_INTERFACE_XML: &str = r#"<interface type='ethernet' name='test5'>
  <start mode='onboot'/>
  <mac address='0a:0b:0c:0d:0e:0f'/>
  <mtu size='1492'/>
  <protocol family='ipv4'>
    <ip address='192.168.0.5' prefix='24'/>
    <route gateway='192.168.0.1'/>
  </protocol>
</interface>"#;

/// vHBA on top of an fc_host capable SCSI host
pub const MINIMAL_NODE_DEVICE_XML: &str = r#"<device>
  <parent>@parent@</parent>
  <capability type='scsi_host'>
    <capability type='fc_host'>
      <wwnn>2000000012341234</wwnn>
      <wwpn>1000000012341234</wwpn>
    </capability>
  </capability>
</device>"#;

pub const MINIMAL_SNAPSHOT_XML: &str = r#"<domainsnapshot>
  <name>snapshot1</name>
  <description>Test snapshot</description>
</domainsnapshot>"#;

pub const MINIMAL_STORAGE_VOL_XML: &str = r#"<volume>
  <name>sparse.img</name>
  <capacity unit='G'>2</capacity>
  <target>
    <path>/var/lib/virt/images/sparse.img</path>
  </target>
</volume>"#;
