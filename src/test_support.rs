use crate::{
    domain::{Board, Card, CardId, ChatMessage, ChatResponse, ColumnId},
    error::{Result, SyncError},
    remote::{BoardApi, CardUpdate},
};
use async_trait::async_trait;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchBoard,
    RenameColumn {
        column_id: ColumnId,
        title: String,
    },
    CreateCard {
        column_id: ColumnId,
        title: String,
        details: String,
    },
    UpdateCard {
        card_id: CardId,
        update: CardUpdate,
    },
    DeleteCard {
        card_id: CardId,
    },
    MoveCard {
        card_id: CardId,
        column_id: ColumnId,
        position: usize,
    },
    SendChat {
        message: String,
        history: Vec<ChatMessage>,
    },
}

/// In-memory server: applies mutations to its own board and answers with a
/// snapshot taken when the request arrives
///
/// Responses can be failed or held back with [`FakeBoardApi::fail_next`] and
/// [`FakeBoardApi::hold_next`].
#[derive(Default)]
pub struct FakeBoardApi {
    server: Mutex<Option<Board>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<VecDeque<SyncError>>,
    gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    chat_replies: Mutex<VecDeque<ChatResponse>>,
}

impl FakeBoardApi {
    pub fn with_board(board: Board) -> Arc<Self> {
        Arc::new(Self {
            server: Mutex::new(Some(board)),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn server_board(&self) -> Board {
        self.server.lock().unwrap().clone().expect("fake server has a board")
    }

    pub fn set_server_board(&self, board: Board) {
        *self.server.lock().unwrap() = Some(board);
    }

    /// The next call fails with `error`
    pub fn fail_next(&self, error: SyncError) {
        self.failures.lock().unwrap().push_back(error);
    }

    /// The next call does not answer until the returned sender fires
    pub fn hold_next(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn reply_to_chat(&self, response: ChatResponse) {
        self.chat_replies.lock().unwrap().push_back(response);
    }

    async fn respond<T>(&self, call: Call, handle: impl FnOnce(&mut Board) -> T) -> Result<T> {
        self.calls.lock().unwrap().push(call);
        let gate = self.gates.lock().unwrap().pop_front();
        let failure = self.failures.lock().unwrap().pop_front();

        let result = match failure {
            Some(error) => Err(error),
            None => {
                let mut server = self.server.lock().unwrap();
                let board = server.as_mut().expect("fake server has a board");
                Ok(handle(board))
            }
        };

        if let Some(gate) = gate {
            let _ = gate.await;
        }
        result
    }
}

fn renumber(board: &mut Board) {
    for col in &mut board.columns {
        for (i, card) in col.cards.iter_mut().enumerate() {
            card.position = i;
        }
    }
}

#[async_trait]
impl BoardApi for FakeBoardApi {
    async fn fetch_board(&self) -> Result<Board> {
        self.respond(Call::FetchBoard, |board| board.clone()).await
    }

    async fn rename_column(&self, column_id: ColumnId, title: &str) -> Result<Board> {
        let call = Call::RenameColumn {
            column_id,
            title: title.to_string(),
        };
        self.respond(call, |board| {
            *board = board.rename_column(column_id, title);
            board.clone()
        })
        .await
    }

    async fn create_card(&self, column_id: ColumnId, title: &str, details: &str) -> Result<Board> {
        let call = Call::CreateCard {
            column_id,
            title: title.to_string(),
            details: details.to_string(),
        };
        self.respond(call, |board| {
            let next_id = board
                .columns
                .iter()
                .flat_map(|c| c.cards.iter().map(|card| card.id))
                .max()
                .unwrap_or(0)
                + 1;
            if let Some(col) = board.columns.iter_mut().find(|c| c.id == column_id) {
                let position = col.cards.len();
                col.cards
                    .push(Card::new(next_id, title, position).with_details(details));
            }
            board.clone()
        })
        .await
    }

    async fn update_card(&self, card_id: CardId, update: &CardUpdate) -> Result<Board> {
        let call = Call::UpdateCard {
            card_id,
            update: update.clone(),
        };
        self.respond(call, |board| {
            let card = board
                .columns
                .iter_mut()
                .flat_map(|c| c.cards.iter_mut())
                .find(|card| card.id == card_id);
            if let Some(card) = card {
                if let Some(title) = &update.title {
                    card.title = title.clone();
                }
                if let Some(details) = &update.details {
                    card.details = details.clone();
                }
            }
            board.clone()
        })
        .await
    }

    async fn delete_card(&self, card_id: CardId) -> Result<Board> {
        self.respond(Call::DeleteCard { card_id }, |board| {
            for col in &mut board.columns {
                col.cards.retain(|card| card.id != card_id);
            }
            renumber(board);
            board.clone()
        })
        .await
    }

    async fn move_card(&self, card_id: CardId, column_id: ColumnId, position: usize) -> Result<Board> {
        let call = Call::MoveCard {
            card_id,
            column_id,
            position,
        };
        self.respond(call, |board| {
            *board = board.move_card(card_id, column_id, position);
            board.clone()
        })
        .await
    }

    async fn send_chat(&self, message: &str, history: &[ChatMessage]) -> Result<ChatResponse> {
        let call = Call::SendChat {
            message: message.to_string(),
            history: history.to_vec(),
        };
        let scripted = self.chat_replies.lock().unwrap().pop_front();
        self.respond(call, |board| match scripted {
            Some(reply) => {
                *board = reply.board.clone();
                reply
            }
            None => ChatResponse {
                message: String::new(),
                board_updates: Vec::new(),
                board: board.clone(),
            },
        })
        .await
    }
}
