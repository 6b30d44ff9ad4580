pub mod assertions;
pub mod service_harness;

pub use assertions::*;
pub use service_harness::{init_tracing, session_bus_available, ServiceTestHarness};
