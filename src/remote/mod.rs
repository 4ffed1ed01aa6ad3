use crate::{
    domain::{Board, CardId, ChatMessage, ChatResponse, ColumnId},
    error::Result,
};
use async_trait::async_trait;
use serde::Serialize;

pub mod http;

pub use http::HttpBoardApi;

/// Request/response calls against the persistence and assistant service
///
/// Every mutating call returns the full authoritative board.
#[async_trait]
pub trait BoardApi: Send + Sync {
    /// GET /board
    async fn fetch_board(&self) -> Result<Board>;

    /// PUT /board/columns/{column_id}
    async fn rename_column(&self, column_id: ColumnId, title: &str) -> Result<Board>;

    /// POST /board/cards
    async fn create_card(&self, column_id: ColumnId, title: &str, details: &str) -> Result<Board>;

    /// PUT /board/cards/{card_id}
    async fn update_card(&self, card_id: CardId, update: &CardUpdate) -> Result<Board>;

    /// DELETE /board/cards/{card_id}
    async fn delete_card(&self, card_id: CardId) -> Result<Board>;

    /// PUT /board/cards/{card_id}/move
    async fn move_card(&self, card_id: CardId, column_id: ColumnId, position: usize) -> Result<Board>;

    /// POST /chat
    async fn send_chat(&self, message: &str, history: &[ChatMessage]) -> Result<ChatResponse>;
}

/// Partial card edit; absent fields are left as they are
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CardUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.details.is_none()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RenameColumnBody<'a> {
    pub title: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateCardBody<'a> {
    pub column_id: ColumnId,
    pub title: &'a str,
    pub details: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct MoveCardBody {
    pub column_id: ColumnId,
    pub position: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatBody<'a> {
    pub message: &'a str,
    pub history: &'a [ChatMessage],
}
