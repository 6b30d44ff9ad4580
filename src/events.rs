//! Integer codes shared with the service.
//!
//! These values are part of the wire contract: signal bodies carry them as
//! plain `i32`s and they must match the service byte for byte.

/// Declares a `#[repr(i32)]` enum with lossless conversions to and from the
/// wire integer.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $name {
            $($variant = $value),+
        }

        impl $name {
            /// Wire representation of this code
            pub const fn code(self) -> i32 {
                self as i32
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> i32 {
                value as i32
            }
        }

        impl TryFrom<i32> for $name {
            type Error = i32;

            fn try_from(code: i32) -> std::result::Result<Self, i32> {
                match code {
                    $(c if c == $value => Ok($name::$variant),)+
                    other => Err(other),
                }
            }
        }
    };
}

wire_enum!(
    /// Lifecycle event kind carried by `DomainEvent`
    DomainEvent {
        Defined = 0,
        Undefined = 1,
        Started = 2,
        Suspended = 3,
        Resumed = 4,
        Stopped = 5,
        Shutdown = 6,
        PmSuspended = 7,
        Crashed = 8,
    }
);

wire_enum!(DomainEventDefinedDetail {
    Added = 0,
    Updated = 1,
    Renamed = 2,
    FromSnapshot = 3,
});

wire_enum!(DomainEventUndefinedDetail {
    Removed = 0,
    Renamed = 1,
});

wire_enum!(DomainEventStartedDetail {
    Booted = 0,
    Migrated = 1,
    Restored = 2,
    FromSnapshot = 3,
    Wakeup = 4,
});

wire_enum!(DomainEventSuspendedDetail {
    Paused = 0,
    Migrated = 1,
    IoError = 2,
    Watchdog = 3,
    Restored = 4,
    FromSnapshot = 5,
    ApiError = 6,
    Postcopy = 7,
    PostcopyFailed = 8,
});

wire_enum!(DomainEventResumedDetail {
    Unpaused = 0,
    Migrated = 1,
    FromSnapshot = 2,
    Postcopy = 3,
});

wire_enum!(DomainEventStoppedDetail {
    Shutdown = 0,
    Destroyed = 1,
    Crashed = 2,
    Migrated = 3,
    Saved = 4,
    Failed = 5,
    FromSnapshot = 6,
});

wire_enum!(
    /// Value of the domain `State` reported by `GetState`
    DomainState {
        NoState = 0,
        Running = 1,
        Blocked = 2,
        Paused = 3,
        Shutdown = 4,
        Shutoff = 5,
        Crashed = 6,
        PmSuspended = 7,
    }
);

wire_enum!(
    /// Lifecycle event kind carried by `NetworkEvent`
    NetworkEvent {
        Defined = 0,
        Undefined = 1,
        Started = 2,
        Stopped = 3,
    }
);

wire_enum!(
    /// Lifecycle event kind carried by `NodeDeviceEvent`
    NodeDeviceEvent {
        Created = 0,
        Deleted = 1,
    }
);

wire_enum!(
    /// Lifecycle event kind carried by `StoragePoolEvent`
    StoragePoolEvent {
        Defined = 0,
        Undefined = 1,
        Started = 2,
        Stopped = 3,
    }
);

wire_enum!(
    /// Flags accepted by `StoragePool.Build`
    StoragePoolBuildFlags {
        New = 0,
        Repair = 1,
        Resize = 2,
        NoOverwrite = 4,
        Overwrite = 8,
    }
);
