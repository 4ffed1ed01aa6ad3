use crate::domain::board::{CardId, ColumnId};
use std::{fmt, str::FromStr};

/// Kind of entity a drag token refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragKind {
    Column,
    Card,
}

impl DragKind {
    const COLUMN_PREFIX: &'static str = "col";
    const CARD_PREFIX: &'static str = "card";

    fn prefix(self) -> &'static str {
        match self {
            Self::Column => Self::COLUMN_PREFIX,
            Self::Card => Self::CARD_PREFIX,
        }
    }
}

/// Typed entity reference carried through the drag layer as an opaque token
/// (e.g. `col-5`, `card-42`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DragId {
    pub kind: DragKind,
    pub id: i64,
}

impl DragId {
    pub fn column(id: ColumnId) -> Self {
        Self {
            kind: DragKind::Column,
            id,
        }
    }

    pub fn card(id: CardId) -> Self {
        Self {
            kind: DragKind::Card,
            id,
        }
    }

    /// Returns the card id when this token names a card
    pub fn as_card(&self) -> Option<CardId> {
        (self.kind == DragKind::Card).then_some(self.id)
    }
}

/// Encodes an entity reference into its drag token
pub fn encode(kind: DragKind, id: i64) -> String {
    format!("{}-{}", kind.prefix(), id)
}

/// Decodes a drag token, returning `None` for anything that is not exactly
/// `col-<digits>` or `card-<digits>`
pub fn decode(token: &str) -> Option<DragId> {
    let (prefix, digits) = token.split_once('-')?;
    let kind = match prefix {
        DragKind::COLUMN_PREFIX => DragKind::Column,
        DragKind::CARD_PREFIX => DragKind::Card,
        _ => return None,
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let id = digits.parse::<i64>().ok()?;
    Some(DragId { kind, id })
}

impl FromStr for DragId {
    type Err = crate::error::SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s).ok_or_else(|| crate::error::SyncError::InvalidDragToken(s.to_string()))
    }
}

impl fmt::Display for DragId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.prefix(), self.id)
    }
}
