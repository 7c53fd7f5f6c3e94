pub mod board;
pub mod config;
pub mod errors;
pub mod telemetry;

pub use errors::{DragRejection, SyncError};
