//! Integration-test harness for libvirt-dbus.
//!
//! Starts the service on the session bus, waits for it to own `org.libvirt`,
//! drives its objects through typed proxies and turns its lifecycle signals
//! into bounded-time waits.

pub mod bus;
pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod event_loop;
pub mod events;
pub mod fixtures;
pub mod notifications;
pub mod proxies;
pub mod supervisor;
pub mod xmldata;

pub use bus::{wait_for_owner, Connection, NameOwnership, ObjectReference};
pub use config::{HarnessConfig, ReadinessPolicy};
pub use context::ServiceContext;
pub use environment::ServiceEnvironment;
pub use error::{HarnessError, RemoteError, Result};
pub use event_loop::{Completion, EventLoop, WaitOutcome};
pub use fixtures::{Fixture, FixtureKind, FixtureManager, FixtureState, RemoteCalls};
pub use notifications::{Notification, NotificationFilter, NotificationStream, SignalKind};
pub use supervisor::{ProcessSupervisor, ServiceHandle, ServiceState};
