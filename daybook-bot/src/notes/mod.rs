//! Daily notes — dated markdown files with a frontmatter / tasks / body layout
//!
//! Notes are plain files under `Daily/` so they stay editable from Obsidian
//! or any text editor; the bot only rewrites the lines it owns.

pub mod date_id;
pub mod document;
pub mod error;
pub mod file_ops;
pub mod store;

pub use date_id::{DateId, LogicalClock};
pub use document::{NoteDocument, Task};
pub use error::NoteError;
pub use store::NoteStore;
