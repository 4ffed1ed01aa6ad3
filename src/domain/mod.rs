pub mod board;
pub mod chat;
pub mod dnd_id;
pub mod drag;

pub use board::{Board, BoardId, Card, CardId, Column, ColumnId};
pub use chat::{BoardOperation, ChatMessage, ChatResponse, ChatRole};
pub use dnd_id::{decode, encode, DragId, DragKind};
pub use drag::{resolve, resolve_drag_end, resolve_drag_start, MoveIntent};
