//! # Kanban Sync
//!
//! Board-state synchronization for a single-board kanban client.
//!
//! The local board is edited optimistically (drag-and-drop moves, column
//! renames), confirmed against a remote persistence service, and replaced
//! wholesale by the authoritative snapshot each confirmation returns. Batched
//! edits made by the board assistant arrive the same way.

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod remote;
pub mod session;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use client::KanbanClient;
pub use config::{StaleResponsePolicy, SyncConfig};
pub use domain::{
    board::{Board, Card, CardId, Column, ColumnId},
    chat::{BoardOperation, ChatMessage, ChatResponse, ChatRole},
    dnd_id::{DragId, DragKind},
    drag::MoveIntent,
};
pub use error::{Result, SyncError};
pub use remote::{BoardApi, CardUpdate, HttpBoardApi};
pub use session::{CredentialStore, MemoryCredentialStore, Session, SessionState};
pub use sync::{BoardStore, ChatMerger, ChatOutcome, MutationDispatcher};
