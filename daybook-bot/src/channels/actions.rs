//! Inline-button callback protocol.
//!
//! Callback data is a colon-delimited path such as `menu:tasks`,
//! `task:toggle:3` or `cal:select:05-Feb-2025`. It is parsed into a
//! `MenuAction` at the edge; anything else is rejected with an
//! `ActionParseError` before it reaches the session.

use std::fmt;
use std::str::FromStr;

use crate::notes::DateId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    OpenRating,
    OpenTasks,
    OpenNote,
    OpenCalendar,
    /// Flip the task with this document index
    ToggleTask(usize),
    AddTask,
    TaskPage(usize),
    TaskBack,
    CancelTask,
    TaskNoop,
    PrevMonth,
    NextMonth,
    SelectDate(DateId),
    Today,
    CalendarBack,
    CalendarNoop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionParseError {
    Empty,
    Unknown(String),
    InvalidArgument { action: String, value: String },
}

impl fmt::Display for ActionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionParseError::Empty => write!(f, "empty callback data"),
            ActionParseError::Unknown(raw) => write!(f, "unknown action: {}", raw),
            ActionParseError::InvalidArgument { action, value } => {
                write!(f, "invalid argument for {}: {:?}", action, value)
            }
        }
    }
}

impl std::error::Error for ActionParseError {}

impl MenuAction {
    pub fn parse(raw: &str) -> Result<Self, ActionParseError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ActionParseError::Empty);
        }

        let parts: Vec<&str> = raw.split(':').collect();
        let action = match parts.as_slice() {
            ["menu", "rating"] => MenuAction::OpenRating,
            ["menu", "tasks"] => MenuAction::OpenTasks,
            ["menu", "note"] => MenuAction::OpenNote,
            ["menu", "calendar"] => MenuAction::OpenCalendar,
            ["task", "toggle", n] => MenuAction::ToggleTask(parse_index("task:toggle", n)?),
            ["task", "add"] => MenuAction::AddTask,
            ["task", "page", n] => MenuAction::TaskPage(parse_index("task:page", n)?),
            ["task", "back"] => MenuAction::TaskBack,
            ["task", "cancel"] => MenuAction::CancelTask,
            ["task", "noop"] => MenuAction::TaskNoop,
            ["cal", "prev"] => MenuAction::PrevMonth,
            ["cal", "next"] => MenuAction::NextMonth,
            ["cal", "select", date] => {
                let date = DateId::parse(date).map_err(|_| ActionParseError::InvalidArgument {
                    action: "cal:select".to_string(),
                    value: date.to_string(),
                })?;
                MenuAction::SelectDate(date)
            }
            ["cal", "today"] => MenuAction::Today,
            ["cal", "back"] => MenuAction::CalendarBack,
            ["cal", "noop"] => MenuAction::CalendarNoop,
            _ => return Err(ActionParseError::Unknown(raw.to_string())),
        };
        Ok(action)
    }

    /// Buttons that only label something and never change state
    pub fn is_noop(&self) -> bool {
        matches!(self, MenuAction::TaskNoop | MenuAction::CalendarNoop)
    }
}

fn parse_index(action: &str, value: &str) -> Result<usize, ActionParseError> {
    value.parse().map_err(|_| ActionParseError::InvalidArgument {
        action: action.to_string(),
        value: value.to_string(),
    })
}

impl FromStr for MenuAction {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuAction::OpenRating => write!(f, "menu:rating"),
            MenuAction::OpenTasks => write!(f, "menu:tasks"),
            MenuAction::OpenNote => write!(f, "menu:note"),
            MenuAction::OpenCalendar => write!(f, "menu:calendar"),
            MenuAction::ToggleTask(index) => write!(f, "task:toggle:{}", index),
            MenuAction::AddTask => write!(f, "task:add"),
            MenuAction::TaskPage(page) => write!(f, "task:page:{}", page),
            MenuAction::TaskBack => write!(f, "task:back"),
            MenuAction::CancelTask => write!(f, "task:cancel"),
            MenuAction::TaskNoop => write!(f, "task:noop"),
            MenuAction::PrevMonth => write!(f, "cal:prev"),
            MenuAction::NextMonth => write!(f, "cal:next"),
            MenuAction::SelectDate(date) => write!(f, "cal:select:{}", date),
            MenuAction::Today => write!(f, "cal:today"),
            MenuAction::CalendarBack => write!(f, "cal:back"),
            MenuAction::CalendarNoop => write!(f, "cal:noop"),
        }
    }
}
