//! Translation of drag gestures into card moves.

use crate::domain::{
    board::{Board, CardId, ColumnId},
    dnd_id::{decode, DragId, DragKind},
};

/// A card move computed from a drag gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveIntent {
    pub card_id: CardId,
    pub dest_column_id: ColumnId,
    pub dest_index: usize,
}

impl MoveIntent {
    /// Applies the move to a board snapshot
    pub fn apply(&self, board: &Board) -> Board {
        board.move_card(self.card_id, self.dest_column_id, self.dest_index)
    }
}

/// Card id of a drag-start token; column drags are not supported
pub fn resolve_drag_start(active: &str) -> Option<CardId> {
    decode(active).and_then(|id| id.as_card())
}

/// Resolves a drag-end event given as raw tokens
///
/// Returns `None` when the gesture does not translate into a move.
pub fn resolve_drag_end(board: &Board, active: &str, over: Option<&str>) -> Option<MoveIntent> {
    let over = over?;
    if active == over {
        return None;
    }
    let active = decode(active)?;
    let over = decode(over)?;
    resolve(board, active, over)
}

/// Resolves a drag-end event given as decoded tokens
pub fn resolve(board: &Board, active: DragId, over: DragId) -> Option<MoveIntent> {
    let card_id = active.as_card()?;
    if active == over {
        return None;
    }

    let (dest_column_id, dest_index) = match over.kind {
        DragKind::Column => {
            let col = board.find_column(over.id)?;
            (col.id, col.cards.len())
        }
        DragKind::Card => {
            let col = board.find_card_column(over.id)?;
            let index = col.card_index(over.id).unwrap_or(col.cards.len());
            (col.id, index)
        }
    };

    Some(MoveIntent {
        card_id,
        dest_column_id,
        dest_index,
    })
}
