//! Services backing the record editor: persistence, scratch storage and logging

pub mod scratch;
pub mod session_registry;
pub mod state_store;
pub mod tracing_setup;
