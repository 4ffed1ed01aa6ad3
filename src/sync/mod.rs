pub mod chat;
pub mod debounce;
pub mod dispatcher;
pub mod store;

pub use chat::{ChatMerger, ChatOutcome, CHAT_FAILURE_MESSAGE};
pub use debounce::Debouncer;
pub use dispatcher::{MutationDispatcher, MutationKind};
pub use store::{BoardStore, Ticket};
