//! Inline-menu screens: layout, escaping and per-mode rendering.

pub mod calendar;
pub mod keyboard;
pub mod markdown;
pub mod render;

pub use keyboard::{Button, Keyboard, View};
pub use render::{render, RenderContext};
