use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type BoardId = i64;
pub type ColumnId = i64;
pub type CardId = i64;

/// A card on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub title: String,
    #[serde(default)]
    pub details: String,
    /// Zero-based index within the owning column
    pub position: usize,
}

impl Card {
    pub fn new(id: CardId, title: impl Into<String>, position: usize) -> Self {
        Self {
            id,
            title: title.into(),
            details: String::new(),
            position,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}

/// An ordered column of cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    pub position: usize,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Column {
    pub fn new(id: ColumnId, title: impl Into<String>, position: usize) -> Self {
        Self {
            id,
            title: title.into(),
            position,
            cards: Vec::new(),
        }
    }

    pub fn with_cards(mut self, cards: Vec<Card>) -> Self {
        self.cards = cards;
        self.renumber();
        self
    }

    /// Index of a card within this column
    pub fn card_index(&self, card_id: CardId) -> Option<usize> {
        self.cards.iter().position(|c| c.id == card_id)
    }

    fn renumber(&mut self) {
        for (i, card) in self.cards.iter_mut().enumerate() {
            card.position = i;
        }
    }
}

/// Snapshot of the whole board
///
/// Every operation here derives a new value and leaves `self` untouched, so a
/// holder of an older snapshot never observes a half-applied edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Board {
    pub fn new(id: BoardId, name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            id,
            name: name.into(),
            columns,
        }
    }

    /// Finds a column by id
    pub fn find_column(&self, column_id: ColumnId) -> Option<&Column> {
        self.columns.iter().find(|col| col.id == column_id)
    }

    /// Finds a card anywhere on the board
    pub fn find_card(&self, card_id: CardId) -> Option<&Card> {
        self.columns
            .iter()
            .flat_map(|col| col.cards.iter())
            .find(|card| card.id == card_id)
    }

    /// Finds the column currently holding a card
    pub fn find_card_column(&self, card_id: CardId) -> Option<&Column> {
        self.columns
            .iter()
            .find(|col| col.cards.iter().any(|card| card.id == card_id))
    }

    /// Moves a card to `dest_index` of `dest_column_id`
    ///
    /// The index is clamped to the destination length once the card has been
    /// taken out, and both touched columns are renumbered. Unknown cards or
    /// unknown destination columns leave the board unchanged.
    pub fn move_card(&self, card_id: CardId, dest_column_id: ColumnId, dest_index: usize) -> Board {
        let Some(source_column_id) = self.find_card_column(card_id).map(|col| col.id) else {
            return self.clone();
        };
        if self.find_column(dest_column_id).is_none() {
            return self.clone();
        }

        let mut next = self.clone();

        let source = next
            .columns
            .iter_mut()
            .find(|col| col.id == source_column_id);
        let Some(source) = source else {
            return self.clone();
        };
        let Some(from) = source.card_index(card_id) else {
            return self.clone();
        };
        let card = source.cards.remove(from);
        source.renumber();

        if let Some(dest) = next.columns.iter_mut().find(|col| col.id == dest_column_id) {
            let index = dest_index.min(dest.cards.len());
            dest.cards.insert(index, card);
            dest.renumber();
        }

        next
    }

    /// Replaces the title of a column
    pub fn rename_column(&self, column_id: ColumnId, title: &str) -> Board {
        let mut next = self.clone();
        if let Some(col) = next.columns.iter_mut().find(|col| col.id == column_id) {
            col.title = title.to_string();
        }
        next
    }

    /// Wholesale replacement with an authoritative snapshot
    pub fn upsert(&self, authoritative: Board) -> Board {
        authoritative
    }

    /// Checks the structural invariants: unique ids, dense zero-based card
    /// positions and column positions matching their index
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let mut column_ids = HashSet::new();
        let mut card_ids = HashSet::new();

        for (col_index, col) in self.columns.iter().enumerate() {
            if !column_ids.insert(col.id) {
                return Err(format!("duplicate column id {}", col.id));
            }
            if col.position != col_index {
                return Err(format!(
                    "column {} has position {} at index {}",
                    col.id, col.position, col_index
                ));
            }
            for (card_index, card) in col.cards.iter().enumerate() {
                if !card_ids.insert(card.id) {
                    return Err(format!("duplicate card id {}", card.id));
                }
                if card.position != card_index {
                    return Err(format!(
                        "card {} has position {} at index {} of column {}",
                        card.id, card.position, card_index, col.id
                    ));
                }
            }
        }

        Ok(())
    }

    /// Titles of the cards in a column, in order
    pub fn card_titles(&self, column_id: ColumnId) -> Vec<&str> {
        self.find_column(column_id)
            .map(|col| col.cards.iter().map(|c| c.title.as_str()).collect())
            .unwrap_or_default()
    }
}
