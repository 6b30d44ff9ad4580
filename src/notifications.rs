use std::pin::Pin;

use futures::stream::{Stream, StreamExt};
use tracing::warn;
use zbus::zvariant::OwnedObjectPath;

use crate::error::Result;

/// Lifecycle signal classes broadcast on `org.libvirt.Connect`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Domain,
    Network,
    NodeDevice,
    StoragePool,
}

impl SignalKind {
    pub const ALL: [SignalKind; 4] = [
        SignalKind::Domain,
        SignalKind::Network,
        SignalKind::NodeDevice,
        SignalKind::StoragePool,
    ];

    /// D-Bus member name of the signal
    pub const fn member(self) -> &'static str {
        match self {
            SignalKind::Domain => "DomainEvent",
            SignalKind::Network => "NetworkEvent",
            SignalKind::NodeDevice => "NodeDeviceEvent",
            SignalKind::StoragePool => "StoragePoolEvent",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.member())
    }
}

/// One decoded lifecycle signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub signal: SignalKind,
    /// Object the event is about
    pub path: OwnedObjectPath,
    /// Event kind code, see [`crate::events`]
    pub event: i32,
    /// Detail code; 0 for signals that carry none
    pub detail: i32,
}

impl Notification {
    pub fn new(signal: SignalKind, path: OwnedObjectPath, event: i32, detail: i32) -> Self {
        Self {
            signal,
            path,
            event,
            detail,
        }
    }

    /// Decodes a signal body of `(o i i)`, or `(o i)` with detail 0.
    pub fn decode(signal: SignalKind, message: &zbus::Message) -> Result<Self> {
        let body = message.body();
        if let Ok((path, event, detail)) = body.deserialize::<(OwnedObjectPath, i32, i32)>() {
            return Ok(Self::new(signal, path, event, detail));
        }

        let (path, event) = body.deserialize::<(OwnedObjectPath, i32)>()?;
        Ok(Self::new(signal, path, event, 0))
    }
}

/// Stream of notifications for one registered subscription
pub type NotificationStream = Pin<Box<dyn Stream<Item = Notification> + Send>>;

/// Turns a raw signal stream into a [`NotificationStream`], dropping (and
/// logging) bodies that do not decode.
pub fn decode_stream<S>(signal: SignalKind, messages: S) -> NotificationStream
where
    S: Stream<Item = zbus::Message> + Send + 'static,
{
    Box::pin(messages.filter_map(move |message| {
        let decoded = Notification::decode(signal, &message);
        async move {
            match decoded {
                Ok(notification) => Some(notification),
                Err(e) => {
                    warn!("Dropping undecodable {} signal: {}", signal, e);
                    None
                }
            }
        }
    }))
}

/// Predicate over notifications keyed on signal, object and discriminators.
///
/// Unset fields match anything. Waits should always pin the path: the
/// service broadcasts the same signal for every object of a kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationFilter {
    signal: SignalKind,
    path: Option<OwnedObjectPath>,
    event: Option<i32>,
    detail: Option<i32>,
}

impl NotificationFilter {
    pub fn new(signal: SignalKind) -> Self {
        Self {
            signal,
            path: None,
            event: None,
            detail: None,
        }
    }

    pub fn path(mut self, path: &OwnedObjectPath) -> Self {
        self.path = Some(path.clone());
        self
    }

    pub fn event(mut self, event: impl Into<i32>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<i32>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn signal(&self) -> SignalKind {
        self.signal
    }

    pub fn matches(&self, notification: &Notification) -> bool {
        notification.signal == self.signal
            && self.path.as_ref().map_or(true, |p| *p == notification.path)
            && self.event.map_or(true, |e| e == notification.event)
            && self.detail.map_or(true, |d| d == notification.detail)
    }
}
