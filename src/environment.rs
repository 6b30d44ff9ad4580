use std::collections::HashMap;

/// Verbosity variable read by the service at startup.
pub const LOG_LEVEL_VAR: &str = "LIBVIRT_DEBUG";

/// Environment variables handed to the service subprocess.
///
/// Only the variables set here are added on top of the harness's own
/// environment; the harness process itself is never modified.
#[derive(Debug, Clone, Default)]
pub struct ServiceEnvironment(HashMap<String, String>);

impl ServiceEnvironment {
    /// Creates an empty environment
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// The environment the service is normally launched with: debug logging
    /// at level 3 (warnings and errors).
    pub fn service_default() -> Self {
        let mut env = Self::new();
        env.set(LOG_LEVEL_VAR, "3");
        env
    }

    /// Sets a variable, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
