//! Transport-independent event handling for the owner's chat.
//!
//! Every entry point checks the owner first. File I/O runs synchronously;
//! the Telegram layer calls in from a blocking task.

use std::collections::HashSet;

use crate::channels::actions::MenuAction;
use crate::menu::render::{self, RenderContext};
use crate::menu::View;
use crate::notes::document::{add_task, parse_tasks, set_rating, toggle_task};
use crate::notes::{DateId, LogicalClock, NoteDocument, NoteError, NoteStore};
use crate::session::{SessionManager, SessionMode, SessionState};

/// Commands accepted from the chat, independent of the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteCommand {
    Start,
    Today,
    /// Raw argument, validated by the dispatcher
    Get(String),
    Reset,
}

/// What the transport should do in response to an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Show this screen (edit in place for callbacks, new message otherwise)
    Reply(View),
    /// Short popup on the pressed button; the message stays as it is
    Alert(String),
    /// Nothing to show
    Ignored,
    /// Event from someone other than the owner; `None` drops it silently
    Rejected(Option<View>),
}

/// Routes chat events for the owner through the session state machine and
/// the note store
pub struct NoteDispatcher {
    store: NoteStore,
    sessions: SessionManager,
    clock: LogicalClock,
    owner_id: u64,
}

impl NoteDispatcher {
    pub fn new(store: NoteStore, clock: LogicalClock, owner_id: u64) -> Self {
        Self {
            store,
            sessions: SessionManager::new(),
            clock,
            owner_id,
        }
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    fn is_owner(&self, user_id: u64) -> bool {
        user_id == self.owner_id
    }

    /// Free text from the chat
    pub fn handle_text(&self, user_id: u64, text: &str) -> Outcome {
        if !self.is_owner(user_id) {
            log::warn!("[DISPATCH] Unauthorized text message from user {}", user_id);
            return Outcome::Rejected(Some(render::unauthorized()));
        }

        let text = text.trim();
        if text.is_empty() {
            return Outcome::Ignored;
        }

        let today = self.clock.today();
        let session = self.sessions.get(user_id, today);
        let date = session.active_date;
        log::debug!(
            "[DISPATCH] Text from user {} in mode {}",
            user_id,
            session.mode.as_ref()
        );

        match session.mode {
            SessionMode::WaitingRating => self.submit_rating(user_id, &date, text),
            SessionMode::WaitingNewTask { .. } => self.submit_task(user_id, &date, text),
            SessionMode::Idle | SessionMode::TasksView { .. } | SessionMode::CalendarView => {
                match self.store.append(&date, text) {
                    Ok(()) => {
                        log::info!("[DISPATCH] Appended {} chars to {}", text.len(), date);
                        Outcome::Reply(render::note_appended(&date))
                    }
                    Err(e) => failed("append to note", e),
                }
            }
        }
    }

    fn submit_rating(&self, user_id: u64, date: &DateId, text: &str) -> Outcome {
        let value = match text.parse::<i64>() {
            Ok(v) if (0..=10).contains(&v) => v,
            _ => {
                log::debug!("[DISPATCH] Rejected rating input {:?}", text);
                return Outcome::Reply(render::rating_invalid());
            }
        };

        if let Err(e) = self.store.update(date, |content| set_rating(content, value)) {
            return failed("set rating", e);
        }

        log::info!("[DISPATCH] Rating for {} set to {}", date, value);
        self.sessions.update(user_id, *date, |s| s.back());
        Outcome::Reply(render::rating_saved(date, value))
    }

    fn submit_task(&self, user_id: u64, date: &DateId, text: &str) -> Outcome {
        let content = match self.store.update(date, |content| add_task(content, text)) {
            Ok(content) => content,
            Err(e) => return failed("add task", e),
        };

        log::info!("[DISPATCH] Added task to {}", date);
        let session = self.sessions.update(user_id, *date, |s| {
            s.return_to_tasks();
            s.clone()
        });
        Outcome::Reply(self.render_session(&session, Some(&content)))
    }

    /// Inline button press carrying `data` as callback payload
    pub fn handle_menu(&self, user_id: u64, data: &str) -> Outcome {
        if !self.is_owner(user_id) {
            log::warn!("[DISPATCH] Unauthorized callback {:?} from user {}", data, user_id);
            return Outcome::Rejected(Some(render::unauthorized()));
        }

        let action = match MenuAction::parse(data) {
            Ok(action) => action,
            Err(e) => {
                log::warn!("[DISPATCH] Ignoring callback: {}", e);
                return Outcome::Ignored;
            }
        };
        if action.is_noop() {
            return Outcome::Ignored;
        }

        let today = self.clock.today();
        let date = self.sessions.get(user_id, today).active_date;
        log::debug!("[DISPATCH] Action {} from user {}", action, user_id);

        match action {
            MenuAction::OpenRating => {
                let content = match self.store.read(&date) {
                    Ok(content) => content,
                    Err(e) => return failed("read note", e),
                };
                let session = self.transition(user_id, today, SessionState::open_rating);
                Outcome::Reply(self.render_session(&session, content.as_deref()))
            }
            MenuAction::OpenTasks => self.show_tasks(user_id, today, &date, |s, _| s.open_tasks()),
            MenuAction::TaskPage(page) => self.show_tasks(user_id, today, &date, |s, count| {
                s.show_task_page(render::clamp_page(page, count))
            }),
            MenuAction::CancelTask => {
                self.show_tasks(user_id, today, &date, |s, _| s.return_to_tasks())
            }
            MenuAction::ToggleTask(index) => {
                match self.store.update(&date, |content| toggle_task(content, index, &today)) {
                    Ok(content) => {
                        log::info!("[DISPATCH] Toggled task {} in {}", index, date);
                        let session = self.transition(user_id, today, SessionState::return_to_tasks);
                        Outcome::Reply(self.render_session(&session, Some(&content)))
                    }
                    Err(e) => {
                        log::warn!("[DISPATCH] Toggle of task {} in {} failed: {}", index, date, e);
                        Outcome::Alert("Could not toggle this task. Reopen the task list and try again.".to_string())
                    }
                }
            }
            MenuAction::AddTask => {
                let session = self.transition(user_id, today, SessionState::begin_add_task);
                Outcome::Reply(self.render_session(&session, None))
            }
            MenuAction::OpenNote => match self.store.read_or_create(&date) {
                Ok(content) => {
                    self.transition(user_id, today, SessionState::back);
                    Outcome::Reply(render::note_view(&date, &content))
                }
                Err(e) => failed("open note", e),
            },
            MenuAction::OpenCalendar => {
                let session = self.transition(user_id, today, SessionState::open_calendar);
                Outcome::Reply(self.render_session(&session, None))
            }
            MenuAction::PrevMonth => {
                let session = self.transition(user_id, today, SessionState::prev_month);
                Outcome::Reply(self.render_session(&session, None))
            }
            MenuAction::NextMonth => {
                let session = self.transition(user_id, today, SessionState::next_month);
                Outcome::Reply(self.render_session(&session, None))
            }
            MenuAction::Today => {
                let session = self.transition(user_id, today, |s| s.jump_to_today(today));
                Outcome::Reply(self.render_session(&session, None))
            }
            MenuAction::SelectDate(selected) => {
                if let Err(e) = self.store.ensure_created(&selected) {
                    return failed("create note", e);
                }
                log::info!("[DISPATCH] User {} switched to {}", user_id, selected);
                let session = self.transition(user_id, today, |s| s.select_date(selected));
                Outcome::Reply(self.render_session(&session, None))
            }
            MenuAction::TaskBack | MenuAction::CalendarBack => {
                let session = self.transition(user_id, today, SessionState::back);
                Outcome::Reply(self.render_session(&session, None))
            }
            MenuAction::TaskNoop | MenuAction::CalendarNoop => Outcome::Ignored,
        }
    }

    pub fn handle_command(&self, user_id: u64, command: NoteCommand) -> Outcome {
        if !self.is_owner(user_id) {
            log::warn!("[DISPATCH] Unauthorized command {:?} from user {}", command, user_id);
            return match command {
                NoteCommand::Start => Outcome::Rejected(Some(render::unauthorized())),
                _ => Outcome::Rejected(None),
            };
        }

        let today = self.clock.today();
        match command {
            NoteCommand::Start => {
                let session = self.transition(user_id, today, SessionState::back);
                log::info!("[DISPATCH] Session started for user {}", user_id);
                Outcome::Reply(render::welcome(&session.active_date))
            }
            NoteCommand::Reset => {
                self.sessions.reset(user_id);
                let session = self.sessions.get(user_id, today);
                log::info!("[SESSION] Reset session for user {}", user_id);
                Outcome::Reply(render::main_menu(&session.active_date))
            }
            NoteCommand::Today => match self.store.read(&today) {
                Ok(Some(content)) => Outcome::Reply(render::note_view(&today, &content)),
                Ok(None) => Outcome::Reply(render::note_empty(&today)),
                Err(e) => failed("read note", e),
            },
            NoteCommand::Get(arg) => {
                let date = match DateId::parse(arg.trim()) {
                    Ok(date) => date,
                    Err(_) => return Outcome::Reply(render::get_usage()),
                };
                match self.store.read(&date) {
                    Ok(Some(content)) => Outcome::Reply(render::note_view(&date, &content)),
                    Ok(None) => Outcome::Reply(render::note_not_found(&date)),
                    Err(e) => failed("read note", e),
                }
            }
        }
    }

    /// Record the id of a message just sent to the owner
    pub fn remember_message(&self, user_id: u64, message_id: i32) {
        if !self.is_owner(user_id) {
            return;
        }
        self.sessions.update(user_id, self.clock.today(), |s| {
            s.last_message_id = Some(message_id)
        });
    }

    /// Last message sent to the owner, the edit target for callbacks that
    /// arrive without their originating message
    pub fn last_message_id(&self, user_id: u64) -> Option<i32> {
        if !self.is_owner(user_id) {
            return None;
        }
        self.sessions.peek(user_id).and_then(|s| s.last_message_id)
    }

    fn transition<F: FnOnce(&mut SessionState)>(&self, user_id: u64, today: DateId, f: F) -> SessionState {
        self.sessions.update(user_id, today, |s| {
            f(s);
            s.clone()
        })
    }

    /// Read (creating if needed) the active note, apply `f` with the task
    /// count, then render the task list
    fn show_tasks<F>(&self, user_id: u64, today: DateId, date: &DateId, f: F) -> Outcome
    where
        F: FnOnce(&mut SessionState, usize),
    {
        let content = match self.store.read_or_create(date) {
            Ok(content) => content,
            Err(e) => return failed("load tasks", e),
        };
        let count = parse_tasks(&content).len();
        let session = self.transition(user_id, today, |s| f(s, count));
        Outcome::Reply(self.render_session(&session, Some(&content)))
    }

    fn render_session(&self, session: &SessionState, content: Option<&str>) -> View {
        let document = content.and_then(|c| match NoteDocument::parse(c) {
            Ok(doc) => Some(doc),
            Err(e) => {
                log::warn!("[DISPATCH] Note {} is not in three-section form: {}", session.active_date, e);
                None
            }
        });

        let existing_dates = if session.mode == SessionMode::CalendarView {
            self.store.existing_dates().unwrap_or_else(|e| {
                log::error!("[DISPATCH] Failed to list notes: {}", e);
                HashSet::new()
            })
        } else {
            HashSet::new()
        };

        render::render(
            session,
            &RenderContext {
                document: document.as_ref(),
                existing_dates: &existing_dates,
            },
        )
    }
}

fn failed(operation: &str, error: NoteError) -> Outcome {
    match error {
        NoteError::Io { .. } => log::error!("[DISPATCH] Failed to {}: {}", operation, error),
        _ => log::warn!("[DISPATCH] Failed to {}: {}", operation, error),
    }
    Outcome::Reply(render::failure())
}
