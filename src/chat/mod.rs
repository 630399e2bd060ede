//! Chat log, its persistence, and the per-session conversation context.

pub mod context;
pub mod history;
pub mod message;
pub mod store;

pub use context::ConversationContext;
pub use history::{HistoryFile, LoadOutcome};
pub use message::{ChatMessage, Role};
pub use store::{MessageStore, WELCOME_QUICK_REPLIES, WELCOME_TEXT};
