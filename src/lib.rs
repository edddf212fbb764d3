pub mod api_keys;
pub mod clipboard;
pub mod config;
pub mod error_handling;
pub mod extract;
pub mod format;
pub mod history;
pub mod input;
pub mod logging;
pub mod menu;
pub mod providers;
pub mod session;

pub use config::Config;
pub use history::{HistoryError, HistoryStore};
pub use providers::{CompletionError, CompletionProvider};
pub use session::{AssistantSession, Flow, SessionOptions};
