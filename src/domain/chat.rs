use crate::domain::board::{Board, CardId, ColumnId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One role-tagged message of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Structural edit the assistant already applied server-side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BoardOperation {
    #[serde(alias = "create")]
    CreateCard {
        column_id: ColumnId,
        title: String,
        #[serde(default)]
        details: String,
    },
    #[serde(alias = "update")]
    UpdateCard {
        card_id: CardId,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        details: Option<String>,
    },
    #[serde(alias = "move")]
    MoveCard {
        card_id: CardId,
        target_column_id: ColumnId,
        #[serde(default)]
        position: usize,
    },
    #[serde(alias = "delete")]
    DeleteCard { card_id: CardId },
    #[serde(other)]
    Unknown,
}

impl fmt::Display for BoardOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateCard { column_id, title, .. } => {
                write!(f, "create card '{}' in column {}", title, column_id)
            }
            Self::UpdateCard { card_id, .. } => write!(f, "update card {}", card_id),
            Self::MoveCard {
                card_id,
                target_column_id,
                position,
            } => write!(
                f,
                "move card {} to column {} at {}",
                card_id, target_column_id, position
            ),
            Self::DeleteCard { card_id } => write!(f, "delete card {}", card_id),
            Self::Unknown => write!(f, "unknown operation"),
        }
    }
}

/// Assistant reply with the authoritative board after the batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    #[serde(default)]
    pub board_updates: Vec<BoardOperation>,
    pub board: Board,
}
