//! End-to-end scenarios against libvirt-dbus
//!
//! Every scenario starts its own service on the session bus. They all compete
//! for the same well-known name, so each one is marked `#[serial]`. Scenarios
//! pass without doing anything when the service executable or a session bus
//! is missing.

pub mod infrastructure;

pub use infrastructure::ServiceTestHarness;
