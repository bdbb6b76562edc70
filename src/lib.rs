// Record editor library - edit one JSONL record at a time as a JSON document

pub mod app;
pub mod config;
pub mod error;
pub mod host;
pub mod model;
pub mod services;

// Re-export commonly used types
pub use app::{CommandOutcome, Direction, NavigateOutcome, OpenedRecord, RecordEditor, SaveOutcome};
pub use config::Config;
pub use error::{RecordError, Result};
pub use host::{EditorHost, FocusedView, MessageLevel};
pub use model::session::{InstanceId, Session, SurfaceId};
pub use services::state_store::{JsonFileStateStore, MemoryStateStore, StateStore};
