//! Typed error hierarchy for boardsync.
//!
//! Two enums cover the two failure surfaces:
//! - `SyncError`: anything that crosses the network (fetches, commands,
//!   the realtime channel)
//! - `DragRejection`: a drag gesture that is refused before it starts

use thiserror::Error;

use crate::board::access::Capability;

/// Errors from talking to the backend.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Not authenticated for {endpoint}")]
    Unauthorized { endpoint: String },

    #[error("Not permitted to call {endpoint}")]
    Forbidden { endpoint: String },

    #[error("{endpoint} not found")]
    NotFound { endpoint: String },

    #[error("Failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Realtime channel error: {0}")]
    Channel(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SyncError {
    /// Failures worth retrying or waiting out. Auth and not-found failures
    /// will not heal on their own.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Channel(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Unauthorized { .. }
            | Self::Forbidden { .. }
            | Self::NotFound { .. }
            | Self::Decode { .. }
            | Self::Other(_) => false,
        }
    }
}

/// Why a drag gesture did not leave `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DragRejection {
    #[error("Board is archived or read-only")]
    ReadOnly,

    #[error("Missing permission: {0}")]
    PermissionDenied(Capability),

    #[error("Drag item is not on this board")]
    UnknownItem,

    #[error("A drag is already in progress")]
    AlreadyDragging,
}
