use crate::{
    config::StaleResponsePolicy,
    domain::Board,
    error::{Result, SyncError},
};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::watch;
use tracing::debug;

/// Order in which board versions were issued, scoped to one session
///
/// Tickets taken before [`BoardStore::clear`] never match the store again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket {
    epoch: u64,
    seq: u64,
}

/// Holder of the local board
///
/// Every write replaces the whole value, so readers always see a complete
/// snapshot (or `None` before the initial load and after session end).
#[derive(Clone)]
pub struct BoardStore {
    cell: Arc<watch::Sender<Option<Board>>>,
    epoch: Arc<AtomicU64>,
    next_ticket: Arc<AtomicU64>,
    local_version: Arc<AtomicU64>,
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardStore {
    pub fn new() -> Self {
        let (cell, _) = watch::channel(None);
        Self {
            cell: Arc::new(cell),
            epoch: Arc::new(AtomicU64::new(0)),
            next_ticket: Arc::new(AtomicU64::new(1)),
            local_version: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_board(board: Board) -> Self {
        let store = Self::new();
        store.replace(board);
        store
    }

    pub fn snapshot(&self) -> Option<Board> {
        self.cell.borrow().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.borrow().is_some()
    }

    /// Receives every new snapshot, for re-rendering
    pub fn subscribe(&self) -> watch::Receiver<Option<Board>> {
        self.cell.subscribe()
    }

    /// Installs a board wholesale
    pub fn replace(&self, board: Board) {
        self.cell.send_replace(Some(board));
    }

    /// Drops the board at session end
    ///
    /// Responses to anything dispatched before this call are ignored by
    /// [`BoardStore::reconcile`].
    pub fn clear(&self) {
        self.cell.send_modify(|slot| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *slot = None;
        });
    }

    /// Derives the next board from the current one
    pub fn apply(&self, transform: impl FnOnce(&Board) -> Board) -> Result<()> {
        let mut loaded = true;
        self.cell.send_if_modified(|slot| {
            let Some(current) = slot.as_ref() else {
                loaded = false;
                return false;
            };
            let next = transform(current);
            if next == *current {
                return false;
            }
            *slot = Some(next);
            true
        });

        if loaded {
            Ok(())
        } else {
            Err(SyncError::BoardNotLoaded)
        }
    }

    /// Like [`BoardStore::apply`], and the edit becomes the local version
    /// that older responses are measured against
    pub fn apply_optimistic(&self, transform: impl FnOnce(&Board) -> Board) -> Result<Ticket> {
        let ticket = self.issue_ticket();
        self.apply(transform)?;
        self.local_version.fetch_max(ticket.seq, Ordering::SeqCst);
        Ok(ticket)
    }

    pub fn issue_ticket(&self) -> Ticket {
        Ticket {
            epoch: self.epoch.load(Ordering::SeqCst),
            seq: self.next_ticket.fetch_add(1, Ordering::SeqCst),
        }
    }

    /// Installs an authoritative snapshot returned for `ticket`
    ///
    /// Returns false when the board was not installed: no board is loaded,
    /// the session that issued the ticket has ended, or the policy judged
    /// the response stale.
    pub fn reconcile(&self, ticket: Ticket, board: Board, policy: StaleResponsePolicy) -> bool {
        self.cell.send_if_modified(|slot| {
            if slot.is_none() || self.epoch.load(Ordering::SeqCst) != ticket.epoch {
                debug!(ticket = ticket.seq, "discarding snapshot from an ended session");
                return false;
            }
            let newest = self.local_version.fetch_max(ticket.seq, Ordering::SeqCst);
            if policy == StaleResponsePolicy::DiscardStale && newest > ticket.seq {
                debug!(ticket = ticket.seq, newest, "discarding stale board snapshot");
                return false;
            }
            *slot = Some(board);
            true
        })
    }
}
