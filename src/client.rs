use crate::{
    config::SyncConfig,
    domain::Board,
    error::Result,
    remote::{BoardApi, HttpBoardApi},
    session::{CredentialStore, Session, SessionState},
    sync::{BoardStore, ChatMerger, MutationDispatcher},
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Session, board store, dispatcher and chat wired to one HTTP collaborator
pub struct KanbanClient {
    session: Session,
    api: Arc<HttpBoardApi>,
    dispatcher: MutationDispatcher,
    chat: ChatMerger,
}

impl KanbanClient {
    pub fn new(config: SyncConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let session = Session::new(credentials);
        let api = Arc::new(HttpBoardApi::new(&config, session.clone())?);
        let store = BoardStore::new();

        let board_api: Arc<dyn BoardApi> = api.clone();
        let chat = ChatMerger::new(Arc::clone(&board_api), store.clone(), config.stale_responses);
        let dispatcher = MutationDispatcher::new(board_api, store, config);

        Ok(Self {
            session,
            api,
            dispatcher,
            chat,
        })
    }

    /// Resolves the session and, when authenticated, loads the board
    pub async fn start(&self) -> Result<Option<Board>> {
        match self.session.bootstrap(self.api.as_ref()).await {
            SessionState::Authenticated { username } => {
                info!(%username, "session restored");
                self.dispatcher.load_board().await.map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Records a successful login and loads the board
    pub async fn login_succeeded(&self, username: &str, token: &str) -> Result<Board> {
        self.session.login_succeeded(username, token);
        self.dispatcher.load_board().await
    }

    pub fn logout(&self) {
        self.session.logout();
        self.end_session();
    }

    /// Drops local state whenever the session becomes unauthenticated,
    /// including when the server rejects the credential mid-session
    pub fn watch_session(&self) -> JoinHandle<()> {
        let mut events = self.session.subscribe();
        let dispatcher = self.dispatcher.clone();
        let chat = self.chat.clone();
        tokio::spawn(async move {
            while events.changed().await.is_ok() {
                let unauthenticated =
                    *events.borrow_and_update() == SessionState::Unauthenticated;
                if unauthenticated {
                    dispatcher.close();
                    chat.clear();
                }
            }
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &BoardStore {
        self.dispatcher.store()
    }

    pub fn dispatcher(&self) -> &MutationDispatcher {
        &self.dispatcher
    }

    pub fn chat(&self) -> &ChatMerger {
        &self.chat
    }

    fn end_session(&self) {
        self.dispatcher.close();
        self.chat.clear();
    }
}
