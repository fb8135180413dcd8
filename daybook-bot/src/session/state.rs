//! Per-user conversation state.
//!
//! Transitions are plain methods on `SessionState`; the dispatcher performs
//! the file side effects and only calls a transition once they succeed, so a
//! failed operation leaves the session where it was.

use chrono::Datelike;
use strum::AsRefStr;

use crate::notes::DateId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SessionMode {
    Idle,
    WaitingRating,
    TasksView {
        page: usize,
    },
    /// Waiting for the text of a new task; `page` is where the list returns to
    WaitingNewTask {
        page: usize,
    },
    CalendarView,
}

/// Month shown by the calendar screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCursor {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

impl CalendarCursor {
    pub fn containing(date: &DateId) -> Self {
        let d = date.date();
        Self {
            year: d.year(),
            month: d.month(),
        }
    }

    pub fn prev(self) -> Self {
        if self.month <= 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(self) -> Self {
        if self.month >= 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user_id: u64,
    pub mode: SessionMode,
    /// Note that text, rating and task operations target
    pub active_date: DateId,
    pub calendar: CalendarCursor,
    /// Last message the bot sent to this user; callbacks that arrive without
    /// their message edit this one
    pub last_message_id: Option<i32>,
}

impl SessionState {
    pub fn new(user_id: u64, today: DateId) -> Self {
        Self {
            user_id,
            mode: SessionMode::Idle,
            active_date: today,
            calendar: CalendarCursor::containing(&today),
            last_message_id: None,
        }
    }

    /// Current task page; 0 outside the task screens
    pub fn task_page(&self) -> usize {
        match self.mode {
            SessionMode::TasksView { page } | SessionMode::WaitingNewTask { page } => page,
            _ => 0,
        }
    }

    pub fn open_rating(&mut self) {
        self.mode = SessionMode::WaitingRating;
    }

    pub fn open_tasks(&mut self) {
        self.mode = SessionMode::TasksView { page: 0 };
    }

    pub fn open_calendar(&mut self) {
        self.mode = SessionMode::CalendarView;
    }

    pub fn show_task_page(&mut self, page: usize) {
        self.mode = SessionMode::TasksView { page };
    }

    /// Stay on (or return to) the task list at the current page
    pub fn return_to_tasks(&mut self) {
        self.mode = SessionMode::TasksView {
            page: self.task_page(),
        };
    }

    pub fn begin_add_task(&mut self) {
        self.mode = SessionMode::WaitingNewTask {
            page: self.task_page(),
        };
    }

    pub fn prev_month(&mut self) {
        self.calendar = self.calendar.prev();
        self.mode = SessionMode::CalendarView;
    }

    pub fn next_month(&mut self) {
        self.calendar = self.calendar.next();
        self.mode = SessionMode::CalendarView;
    }

    pub fn select_date(&mut self, date: DateId) {
        self.active_date = date;
        self.mode = SessionMode::Idle;
    }

    pub fn jump_to_today(&mut self, today: DateId) {
        self.active_date = today;
        self.calendar = CalendarCursor::containing(&today);
        self.mode = SessionMode::CalendarView;
    }

    pub fn back(&mut self) {
        self.mode = SessionMode::Idle;
    }

    /// Back to idle, forgetting the task page and last message but keeping
    /// the active date and calendar cursor
    pub fn reset(&mut self) {
        self.mode = SessionMode::Idle;
        self.last_message_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionState {
        SessionState::new(42, DateId::from_ymd(2025, 2, 5).unwrap())
    }

    #[test]
    fn test_new_session_defaults() {
        let s = session();
        assert_eq!(s.mode, SessionMode::Idle);
        assert_eq!(s.active_date.to_string(), "05-Feb-2025");
        assert_eq!(s.calendar, CalendarCursor { year: 2025, month: 2 });
        assert_eq!(s.task_page(), 0);
        assert!(s.last_message_id.is_none());
    }

    #[test]
    fn test_cursor_wraps_year() {
        let jan = CalendarCursor { year: 2025, month: 1 };
        assert_eq!(jan.prev(), CalendarCursor { year: 2024, month: 12 });
        let dec = CalendarCursor { year: 2025, month: 12 };
        assert_eq!(dec.next(), CalendarCursor { year: 2026, month: 1 });
        assert_eq!(dec.prev().next(), dec);
    }

    #[test]
    fn test_add_task_returns_to_same_page() {
        let mut s = session();
        s.open_tasks();
        s.show_task_page(2);
        s.begin_add_task();
        assert_eq!(s.mode, SessionMode::WaitingNewTask { page: 2 });
        s.return_to_tasks();
        assert_eq!(s.mode, SessionMode::TasksView { page: 2 });
        s.open_tasks();
        assert_eq!(s.task_page(), 0);
    }

    #[test]
    fn test_calendar_navigation() {
        let mut s = session();
        s.open_calendar();
        s.prev_month();
        s.prev_month();
        assert_eq!(s.calendar, CalendarCursor { year: 2024, month: 12 });
        assert_eq!(s.mode, SessionMode::CalendarView);

        let date = DateId::from_ymd(2024, 12, 24).unwrap();
        s.select_date(date);
        assert_eq!(s.mode, SessionMode::Idle);
        assert_eq!(s.active_date, date);

        let today = DateId::from_ymd(2025, 2, 5).unwrap();
        s.open_calendar();
        s.jump_to_today(today);
        assert_eq!(s.active_date, today);
        assert_eq!(s.calendar, CalendarCursor { year: 2025, month: 2 });
        assert_eq!(s.mode, SessionMode::CalendarView);
    }

    #[test]
    fn test_reset_keeps_date_and_cursor() {
        let mut s = session();
        s.next_month();
        s.last_message_id = Some(10);
        s.show_task_page(1);
        s.reset();
        assert_eq!(s.mode, SessionMode::Idle);
        assert!(s.last_message_id.is_none());
        assert_eq!(s.calendar, CalendarCursor { year: 2025, month: 3 });
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(SessionMode::TasksView { page: 3 }.as_ref(), "tasks_view");
        assert_eq!(SessionMode::WaitingRating.as_ref(), "waiting_rating");
    }
}
