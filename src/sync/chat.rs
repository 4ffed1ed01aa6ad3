use crate::{
    config::StaleResponsePolicy,
    domain::ChatMessage,
    error::{Result, SyncError},
    remote::BoardApi,
    sync::store::BoardStore,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Assistant entry appended when a chat turn fails
pub const CHAT_FAILURE_MESSAGE: &str = "Sorry, something went wrong. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    /// The assistant replied; `board_replaced` tells whether its batch of
    /// operations swapped in a new board
    Replied { board_replaced: bool },
    /// The call failed and the apology was appended
    Failed,
    /// The conversation was cleared while the turn was pending; the reply
    /// was dropped
    Discarded,
}

#[derive(Debug, Default)]
struct Conversation {
    transcript: Vec<ChatMessage>,
    pending: bool,
    generation: u64,
}

/// Conversation with the board assistant
///
/// Operations the assistant performs are already applied server-side; the
/// local board is swapped for the returned snapshot, never patched.
#[derive(Clone)]
pub struct ChatMerger {
    api: Arc<dyn BoardApi>,
    store: BoardStore,
    policy: StaleResponsePolicy,
    conversation: Arc<Mutex<Conversation>>,
}

impl ChatMerger {
    pub fn new(api: Arc<dyn BoardApi>, store: BoardStore, policy: StaleResponsePolicy) -> Self {
        Self {
            api,
            store,
            policy,
            conversation: Arc::new(Mutex::new(Conversation::default())),
        }
    }

    /// Sends one user turn
    ///
    /// Blank messages and sends while a turn is pending are rejected before
    /// anything is appended. Remote failures are not errors here: they end
    /// up in the transcript as [`CHAT_FAILURE_MESSAGE`].
    pub async fn send(&self, text: &str) -> Result<ChatOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SyncError::Validation("chat message cannot be empty".to_string()));
        }

        let (history, generation) = {
            let mut conversation = self.lock();
            if conversation.pending {
                return Err(SyncError::ChatBusy);
            }
            let history = conversation.transcript.clone();
            conversation.transcript.push(ChatMessage::user(text));
            conversation.pending = true;
            (history, conversation.generation)
        };

        let ticket = self.store.issue_ticket();
        debug!(history = history.len(), "sending chat turn");
        let result = self.api.send_chat(text, &history).await;

        let mut conversation = self.lock();
        if conversation.generation != generation {
            debug!("conversation cleared while waiting, dropping reply");
            return Ok(ChatOutcome::Discarded);
        }

        let (reply, outcome) = match result {
            Ok(response) => {
                let board_replaced = !response.board_updates.is_empty()
                    && self.store.reconcile(ticket, response.board, self.policy);
                if board_replaced {
                    debug!(
                        operations = response.board_updates.len(),
                        "board replaced after assistant operations"
                    );
                }
                (
                    ChatMessage::assistant(response.message),
                    ChatOutcome::Replied { board_replaced },
                )
            }
            Err(err) => {
                warn!(error = %err, "chat turn failed");
                (ChatMessage::assistant(CHAT_FAILURE_MESSAGE), ChatOutcome::Failed)
            }
        };

        conversation.transcript.push(reply);
        conversation.pending = false;
        Ok(outcome)
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.lock().transcript.clone()
    }

    /// True while a turn waits for the assistant
    pub fn is_pending(&self) -> bool {
        self.lock().pending
    }

    /// Forgets the conversation, including a turn still waiting for its reply
    pub fn clear(&self) {
        let mut conversation = self.lock();
        conversation.transcript.clear();
        conversation.pending = false;
        conversation.generation += 1;
    }

    fn lock(&self) -> MutexGuard<'_, Conversation> {
        self.conversation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
