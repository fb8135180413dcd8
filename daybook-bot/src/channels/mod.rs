pub mod actions;
pub mod dispatcher;
pub mod telegram;

pub use actions::{ActionParseError, MenuAction};
pub use dispatcher::{NoteCommand, NoteDispatcher, Outcome};
