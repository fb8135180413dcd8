//! Conversation state for each chat user.

pub mod manager;
pub mod state;

pub use manager::SessionManager;
pub use state::{CalendarCursor, SessionMode, SessionState};
