use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use zbus::DBusError;

/// Error name the service uses for every failure it reports itself.
pub const SERVICE_ERROR_NAME: &str = "org.libvirt.Error";

/// A fault reported by the remote side of a method call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// D-Bus error name, e.g. `org.libvirt.Error`
    pub name: String,
    /// Human readable description sent with the error
    pub message: String,
}

impl RemoteError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// True when the service itself rejected the call, as opposed to the bus
    /// daemon (access denied, unknown method, ...).
    pub fn is_service_error(&self) -> bool {
        self.name == SERVICE_ERROR_NAME
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Everything the harness can fail with
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("failed to launch {executable:?}: {source}")]
    Startup {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} was not owned on the bus after {attempts} attempts ({elapsed:?})")]
    ServiceUnavailable {
        name: String,
        attempts: u32,
        elapsed: Duration,
    },

    #[error("no matching {signal} notification within {timeout:?}")]
    WaitTimeout { signal: String, timeout: Duration },

    #[error("usage error: {0}")]
    Usage(&'static str),

    #[error("the service exposes no {0}")]
    MissingObject(&'static str),

    #[error("remote call failed: {0}")]
    Remote(RemoteError),

    #[error("bus transport error: {0}")]
    Transport(zbus::Error),

    #[error("process {pid} did not exit within {grace:?}")]
    ShutdownTimeout { pid: i32, grace: Duration },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// The remote fault carried by this error, if any
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            HarnessError::Remote(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RemoteError> for HarnessError {
    fn from(e: RemoteError) -> Self {
        HarnessError::Remote(e)
    }
}

impl From<zbus::Error> for HarnessError {
    fn from(e: zbus::Error) -> Self {
        match e {
            zbus::Error::MethodError(name, description, _) => HarnessError::Remote(RemoteError {
                name: name.to_string(),
                message: description.unwrap_or_default(),
            }),
            zbus::Error::FDO(fdo) => HarnessError::from(*fdo),
            other => HarnessError::Transport(other),
        }
    }
}

impl From<zbus::fdo::Error> for HarnessError {
    fn from(e: zbus::fdo::Error) -> Self {
        match e {
            zbus::fdo::Error::ZBus(inner) => HarnessError::from(inner),
            other => HarnessError::Remote(RemoteError {
                name: other.name().to_string(),
                message: other.description().unwrap_or_default().to_string(),
            }),
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
