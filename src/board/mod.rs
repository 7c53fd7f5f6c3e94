//! Board ordering and collaborative sync engine.
//!
//! ## Overview
//!
//! A board is a set of ordered columns, each holding ordered tasks. Several
//! users edit the same board at once. This module keeps a local copy of one
//! board that a UI can render from, lets the user rearrange it by dragging
//! with immediate feedback, confirms each drop with the backend, and folds
//! other collaborators' changes in as they arrive.
//!
//! ## Module Map
//!
//! ```text
//!  user input                                   realtime push
//!      │                                              │
//!      v                                              v
//! ┌──────────┐  drop  ┌────────────┐        ┌──────────────────┐
//! │ drag.rs  │ ─────> │ mutator.rs │        │ channel.rs       │
//! │ Drag-    │        │ Reconciling│        │ RealtimeChannel  │
//! │ Session  │        │ Mutator    │        │  (websocket)     │
//! └────┬─────┘        └─────┬──────┘        └────────┬─────────┘
//!      │ splice             │ reindex               │ ChannelMessage
//!      │                    │ + command             v
//!      │                    │  via client.rs  ┌──────────────┐
//!      v                    v                 │ realtime.rs  │
//! ┌─────────────────────────────────────┐     │ EventApplier │
//! │ cache.rs  CacheHandle / BoardCache  │ <───┴──────────────┘
//! └─────────────────────────────────────┘      invalidate / patch
//!              ^
//!              │ refetch stale collections
//!        view.rs  BoardView (owns all of the above)
//! ```
//!
//! ## Supporting Modules
//!
//! | Module     | Responsibility                                            |
//! |------------|-----------------------------------------------------------|
//! | `position` | `compare`, `reindex`: the only place positions are made   |
//! | `access`   | `PermissionCheck` seam and the shared `ArchivedFlag`      |
//! | `client`   | `BoardApi` trait + `HttpBoardApi` (reqwest)               |
//! | `notify`   | Non-blocking `Notifier` for command failures              |

pub mod access;
pub mod cache;
pub mod channel;
pub mod client;
pub mod drag;
pub mod mutator;
pub mod notify;
pub mod position;
pub mod realtime;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use access::{ArchivedFlag, Capability, DragGate, PermissionCheck, StaticPermissions};
pub use cache::{BoardCache, BoardOrder, CacheHandle, Collection};
pub use channel::{Backoff, ChannelMessage, RealtimeChannel, Subscription};
pub use client::{BoardApi, HttpBoardApi};
pub use drag::{DragItem, DragSession, DragState, DropOutcome, HoverOutcome, HoverTarget};
pub use mutator::{BoardCommand, CommandOutcome, InFlight, ReconcilingMutator};
pub use notify::{Notification, Notifier};
pub use realtime::{Effect, EventApplier};
pub use view::{BoardView, Dropped, ViewOptions};
