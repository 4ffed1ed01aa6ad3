use crate::{
    config::SyncConfig,
    domain::{drag, Board, Card, CardId, ColumnId, MoveIntent},
    error::{Result, SyncError},
    remote::{BoardApi, CardUpdate},
    sync::{
        debounce::Debouncer,
        store::{BoardStore, Ticket},
    },
};
use std::{
    fmt,
    future::Future,
    sync::{Arc, Mutex},
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Move,
    Rename,
    Create,
    Update,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move => write!(f, "move"),
            Self::Rename => write!(f, "rename"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Applies user mutations locally and confirms them with the server
///
/// Must be used from within a tokio runtime: remote calls run as spawned
/// tasks and the returned handles resolve once the local board has been
/// reconciled (or the failure logged). Calls in flight are never ordered
/// against each other; under [`StaleResponsePolicy::Apply`] the last response
/// to arrive wins.
///
/// [`StaleResponsePolicy::Apply`]: crate::config::StaleResponsePolicy::Apply
#[derive(Clone)]
pub struct MutationDispatcher {
    api: Arc<dyn BoardApi>,
    store: BoardStore,
    renames: Debouncer<ColumnId>,
    active_card: Arc<Mutex<Option<CardId>>>,
    config: SyncConfig,
}

impl MutationDispatcher {
    pub fn new(api: Arc<dyn BoardApi>, store: BoardStore, config: SyncConfig) -> Self {
        Self {
            api,
            store,
            renames: Debouncer::new(),
            active_card: Arc::new(Mutex::new(None)),
            config,
        }
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    /// Fetches the board and installs it as the local snapshot
    pub async fn load_board(&self) -> Result<Board> {
        let board = self.api.fetch_board().await?;
        debug!(board_id = board.id, columns = board.columns.len(), "board loaded");
        self.store.replace(board.clone());
        Ok(board)
    }

    /// Records the card being dragged; column drags are ignored
    pub fn drag_start(&self, active: &str) -> Option<CardId> {
        let card_id = drag::resolve_drag_start(active);
        *self.lock_active() = card_id;
        card_id
    }

    /// The card currently being dragged, looked up in the local board
    pub fn active_card(&self) -> Option<Card> {
        let card_id = (*self.lock_active())?;
        self.store.snapshot()?.find_card(card_id).cloned()
    }

    /// Turns a drag-end event into an optimistic move plus its remote call
    ///
    /// Returns `None` when the gesture does not resolve to a move.
    pub fn drag_end(&self, active: &str, over: Option<&str>) -> Option<JoinHandle<()>> {
        *self.lock_active() = None;
        let board = self.store.snapshot()?;
        let intent = drag::resolve_drag_end(&board, active, over)?;
        match self.move_card(intent) {
            Ok(handle) => Some(handle),
            Err(err) => {
                debug!(error = %err, "drag did not produce a move");
                None
            }
        }
    }

    /// Moves a card locally right away, then asks the server to confirm
    ///
    /// A failed confirmation leaves the optimistic move in place.
    pub fn move_card(&self, intent: MoveIntent) -> Result<JoinHandle<()>> {
        let board = self.store.snapshot().ok_or(SyncError::BoardNotLoaded)?;
        if board.find_card(intent.card_id).is_none() {
            return Err(SyncError::Validation(format!(
                "card {} is not on the board",
                intent.card_id
            )));
        }
        if board.find_column(intent.dest_column_id).is_none() {
            return Err(SyncError::Validation(format!(
                "column {} is not on the board",
                intent.dest_column_id
            )));
        }

        // the server gets the clamped index the local move actually used
        let position = intent
            .apply(&board)
            .find_column(intent.dest_column_id)
            .and_then(|col| col.card_index(intent.card_id))
            .unwrap_or(intent.dest_index);

        let ticket = self.store.apply_optimistic(|board| intent.apply(board))?;

        let api = Arc::clone(&self.api);
        Ok(self.spawn_reconciling(MutationKind::Move, ticket, async move {
            api.move_card(intent.card_id, intent.dest_column_id, position)
                .await
        }))
    }

    /// Renames a column locally on every edit; the remote call goes out once
    /// edits for that column pause for the debounce window
    pub fn rename_column(&self, column_id: ColumnId, title: &str) -> Result<()> {
        self.store
            .apply_optimistic(|board| board.rename_column(column_id, title))?;

        let api = Arc::clone(&self.api);
        let title = title.to_string();
        let kind = MutationKind::Rename;
        self.renames
            .schedule(column_id, self.config.rename_debounce, async move {
                debug!(%kind, column_id, "dispatching mutation");
                // rename responses are never reconciled into the local board
                if let Err(err) = api.rename_column(column_id, &title).await {
                    debug!(%kind, column_id, error = %err, "rename failed, keeping local title");
                }
            });
        Ok(())
    }

    /// True while a rename for `column_id` waits out its debounce window
    pub fn rename_pending(&self, column_id: ColumnId) -> bool {
        self.renames.is_pending(&column_id)
    }

    /// Creates a card; the board only changes once the server confirms
    pub fn create_card(&self, column_id: ColumnId, title: &str, details: &str) -> Result<JoinHandle<()>> {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(SyncError::Validation("card title cannot be empty".to_string()));
        }
        let details = details.trim().to_string();

        let api = Arc::clone(&self.api);
        let ticket = self.store.issue_ticket();
        Ok(self.spawn_reconciling(MutationKind::Create, ticket, async move {
            api.create_card(column_id, &title, &details).await
        }))
    }

    /// Edits a card's title and/or details; no optimistic phase
    pub fn update_card(&self, card_id: CardId, update: CardUpdate) -> Result<JoinHandle<()>> {
        if update.is_empty() {
            return Err(SyncError::Validation("card update has no fields".to_string()));
        }
        let update = CardUpdate {
            title: update.title.map(|t| t.trim().to_string()),
            details: update.details,
        };
        if update.title.as_deref() == Some("") {
            return Err(SyncError::Validation("card title cannot be empty".to_string()));
        }

        let api = Arc::clone(&self.api);
        let ticket = self.store.issue_ticket();
        Ok(self.spawn_reconciling(MutationKind::Update, ticket, async move {
            api.update_card(card_id, &update).await
        }))
    }

    /// Deletes a card; the board only changes once the server confirms
    pub fn delete_card(&self, card_id: CardId) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let ticket = self.store.issue_ticket();
        self.spawn_reconciling(MutationKind::Delete, ticket, async move {
            api.delete_card(card_id).await
        })
    }

    /// Drops pending renames and the local board at session end
    ///
    /// Calls still in flight complete, but their snapshots are not installed.
    pub fn close(&self) {
        self.renames.cancel_all();
        *self.lock_active() = None;
        self.store.clear();
    }

    fn spawn_reconciling<F>(&self, kind: MutationKind, ticket: Ticket, call: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<Board>> + Send + 'static,
    {
        let store = self.store.clone();
        let policy = self.config.stale_responses;
        debug!(%kind, "dispatching mutation");

        tokio::spawn(async move {
            match call.await {
                Ok(board) => {
                    if store.reconcile(ticket, board, policy) {
                        debug!(%kind, "board reconciled with server snapshot");
                    }
                }
                Err(err) => {
                    warn!(%kind, error = %err, "mutation failed, local board left as is");
                }
            }
        })
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<CardId>> {
        self.active_card
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
