use nix::unistd::Pid;
use virt_dbus_harness::{HarnessError, Notification, WaitOutcome};
use zbus::zvariant::{OwnedValue, Value};

/// Asserts the wait completed before its deadline and returns what it saw
pub fn assert_observed(outcome: WaitOutcome<Notification>) -> Notification {
    assert!(
        !outcome.timed_out,
        "no matching notification within the deadline ({:?} elapsed)",
        outcome.elapsed
    );
    outcome
        .value
        .expect("completed wait should carry a notification")
}

/// Asserts the wait ran into its deadline without completing
pub fn assert_timed_out<T: std::fmt::Debug>(outcome: &WaitOutcome<T>) {
    assert!(outcome.timed_out, "wait completed unexpectedly: {:?}", outcome.value);
    assert!(outcome.value.is_none());
}

/// Asserts the result is an error reported by the service itself
pub fn assert_service_error<T: std::fmt::Debug>(result: Result<T, HarnessError>) {
    match result {
        Err(HarnessError::Remote(e)) => assert!(
            e.is_service_error(),
            "expected a service error, got remote error {}",
            e
        ),
        other => panic!("expected a service error, got {:?}", other),
    }
}

/// True while `pid` names a process that has not exited
pub fn process_alive(pid: Pid) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => stat
            .rsplit_once(')')
            .map(|(_, rest)| !rest.trim_start().starts_with('Z'))
            .unwrap_or(false),
        Err(_) => false,
    }
}

/// True when a property value is a D-Bus string
pub fn is_string(value: &OwnedValue) -> bool {
    matches!(**value, Value::Str(_))
}
