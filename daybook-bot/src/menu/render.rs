//! Screen rendering. Pure functions from session + note snapshot to a `View`.

use std::collections::HashSet;

use super::calendar::{month_name, month_weeks, WEEKDAY_LABELS};
use super::keyboard::{Button, Keyboard, View};
use super::markdown::{bold, code_block, escape_markdown_v2};
use crate::channels::actions::MenuAction;
use crate::notes::document::get_rating;
use crate::notes::{DateId, NoteDocument, Task};
use crate::session::{CalendarCursor, SessionMode, SessionState};

pub const TASKS_PER_PAGE: usize = 5;
/// Characters of note text shown by the note screen
pub const NOTE_PREVIEW_CHARS: usize = 3800;

/// What a screen may need besides the session itself
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Parsed note for the active date; `None` when absent or malformed
    pub document: Option<&'a NoteDocument>,
    /// Date-ids that have a note on disk
    pub existing_dates: &'a HashSet<String>,
}

/// Pick the screen for the session's current mode
pub fn render(session: &SessionState, ctx: &RenderContext<'_>) -> View {
    let date = &session.active_date;
    match session.mode {
        SessionMode::Idle => main_menu(date),
        SessionMode::WaitingRating => rating_prompt(date, ctx.document.and_then(|d| d.rating())),
        SessionMode::TasksView { page } => {
            let tasks = ctx.document.map(|d| d.tasks()).unwrap_or_default();
            tasks_view(date, &tasks, page)
        }
        SessionMode::WaitingNewTask { .. } => add_task_prompt(),
        SessionMode::CalendarView => calendar_view(session.calendar, date, ctx.existing_dates),
    }
}

pub fn main_menu_keyboard() -> Keyboard {
    Keyboard::new()
        .row(vec![
            Button::new("📊 Rating", MenuAction::OpenRating),
            Button::new("✅ Tasks", MenuAction::OpenTasks),
        ])
        .row(vec![
            Button::new("📝 Note", MenuAction::OpenNote),
            Button::new("📅 Calendar", MenuAction::OpenCalendar),
        ])
}

pub fn main_menu(date: &DateId) -> View {
    let text = format!(
        "📅 Active date: {}\n\n{}",
        bold(&date.to_string()),
        escape_markdown_v2("Send text to add it to the note, or choose an action:")
    );
    View::new(text, main_menu_keyboard())
}

pub fn welcome(date: &DateId) -> View {
    let text = format!(
        "👋 {}\n\n📅 Active date: {}\n\n{}",
        escape_markdown_v2("Welcome to your daybook!"),
        bold(&date.to_string()),
        escape_markdown_v2("Every message you send is added to the active note. Use the menu below for rating, tasks and the calendar.")
    );
    View::new(text, main_menu_keyboard())
}

pub fn rating_prompt(date: &DateId, current: Option<i64>) -> View {
    let current = current
        .map(|r| r.to_string())
        .unwrap_or_else(|| "not set".to_string());
    let text = format!(
        "📊 Rate {} from 0 to 10\n{}",
        bold(&date.to_string()),
        escape_markdown_v2(&format!("Current rating: {}", current))
    );
    View::text_only(text)
}

pub fn rating_invalid() -> View {
    View::text_only(escape_markdown_v2("⚠️ Please send a whole number from 0 to 10."))
}

pub fn rating_saved(date: &DateId, value: i64) -> View {
    let text = format!(
        "✅ Rating {} saved for {}",
        escape_markdown_v2(&value.to_string()),
        bold(&date.to_string())
    );
    View::new(text, main_menu_keyboard())
}

pub fn note_appended(date: &DateId) -> View {
    let text = format!("✅ Added to {}", bold(&date.to_string()));
    View::new(text, main_menu_keyboard())
}

pub fn total_pages(task_count: usize) -> usize {
    task_count.div_ceil(TASKS_PER_PAGE)
}

/// Page index that actually has tasks on it (0 for an empty list)
pub fn clamp_page(page: usize, task_count: usize) -> usize {
    page.min(total_pages(task_count).saturating_sub(1))
}

pub fn tasks_keyboard(tasks: &[Task], page: usize) -> Keyboard {
    let pages = total_pages(tasks.len());
    let page = clamp_page(page, tasks.len());
    let mut keyboard = Keyboard::new();

    for task in tasks.iter().skip(page * TASKS_PER_PAGE).take(TASKS_PER_PAGE) {
        let glyph = if task.completed { "☑" } else { "☐" };
        keyboard.push_row(vec![Button::new(
            format!("{} {}", glyph, task.text),
            MenuAction::ToggleTask(task.index),
        )]);
    }

    keyboard.push_row(vec![Button::new("➕ Add task", MenuAction::AddTask)]);

    if pages > 1 {
        let mut nav = Vec::new();
        if page > 0 {
            nav.push(Button::new("◀", MenuAction::TaskPage(page - 1)));
        }
        nav.push(Button::new(format!("{}/{}", page + 1, pages), MenuAction::TaskNoop));
        if page + 1 < pages {
            nav.push(Button::new("▶", MenuAction::TaskPage(page + 1)));
        }
        keyboard.push_row(nav);
    }

    keyboard.push_row(vec![Button::new("◀ Back", MenuAction::TaskBack)]);
    keyboard
}

pub fn tasks_view(date: &DateId, tasks: &[Task], page: usize) -> View {
    let done = tasks.iter().filter(|t| t.completed).count();
    let mut text = format!("✅ Tasks for {}", bold(&date.to_string()));
    if tasks.is_empty() {
        text.push_str(&format!("\n\n{}", escape_markdown_v2("No tasks yet.")));
    } else {
        text.push_str(&format!(
            "\n\n{}",
            escape_markdown_v2(&format!("Done {} of {}. Tap a task to toggle it.", done, tasks.len()))
        ));
    }
    View::new(text, tasks_keyboard(tasks, page))
}

pub fn add_task_prompt() -> View {
    let keyboard = Keyboard::new().row(vec![Button::new("❌ Cancel", MenuAction::CancelTask)]);
    View::new(escape_markdown_v2("➕ Send the text of the new task."), keyboard)
}

pub fn calendar_keyboard(
    cursor: CalendarCursor,
    active: &DateId,
    existing_dates: &HashSet<String>,
) -> Keyboard {
    let mut keyboard = Keyboard::new().row(vec![
        Button::new("◀", MenuAction::PrevMonth),
        Button::new(
            format!("{} {}", month_name(cursor.month), cursor.year),
            MenuAction::CalendarNoop,
        ),
        Button::new("▶", MenuAction::NextMonth),
    ]);

    keyboard.push_row(
        WEEKDAY_LABELS
            .iter()
            .map(|label| Button::new(*label, MenuAction::CalendarNoop))
            .collect(),
    );

    for week in month_weeks(cursor.year, cursor.month) {
        let row = week
            .iter()
            .map(|&day| match DateId::from_ymd(cursor.year, cursor.month, day) {
                Some(date) if day != 0 => {
                    Button::new(day_label(day, &date, active, existing_dates), MenuAction::SelectDate(date))
                }
                _ => Button::new(" ", MenuAction::CalendarNoop),
            })
            .collect();
        keyboard.push_row(row);
    }

    keyboard.push_row(vec![
        Button::new("📅 Today", MenuAction::Today),
        Button::new("◀ Back", MenuAction::CalendarBack),
    ]);
    keyboard
}

fn day_label(day: u32, date: &DateId, active: &DateId, existing_dates: &HashSet<String>) -> String {
    if date == active {
        format!("[{}]", day)
    } else if existing_dates.contains(&date.to_string()) {
        format!("*{}*", day)
    } else {
        day.to_string()
    }
}

pub fn calendar_view(cursor: CalendarCursor, active: &DateId, existing_dates: &HashSet<String>) -> View {
    let text = format!(
        "📅 Pick a date\n{}",
        escape_markdown_v2(&format!("Active: {}. Days with notes are marked *d*.", active))
    );
    View::new(text, calendar_keyboard(cursor, active, existing_dates))
}

pub fn note_view(date: &DateId, content: &str) -> View {
    let rating = get_rating(content)
        .map(|r| r.to_string())
        .unwrap_or_else(|| "not set".to_string());

    let mut preview: String = content.chars().take(NOTE_PREVIEW_CHARS).collect();
    if content.chars().count() > NOTE_PREVIEW_CHARS {
        preview.push_str("...");
    }

    let text = format!(
        "📝 {}\n{}\n\n{}",
        bold(&date.to_string()),
        escape_markdown_v2(&format!("Rating: {}", rating)),
        code_block(&preview)
    );
    View::new(text, main_menu_keyboard())
}

pub fn note_empty(date: &DateId) -> View {
    View::text_only(format!("📭 {} {}", escape_markdown_v2("No note yet for"), bold(&date.to_string())))
}

pub fn note_not_found(date: &DateId) -> View {
    View::text_only(format!("🔍 {} {}", escape_markdown_v2("No note found for"), bold(&date.to_string())))
}

pub fn get_usage() -> View {
    View::text_only(escape_markdown_v2("Usage: /get DD-Mon-YYYY, for example /get 05-Feb-2025"))
}

pub fn failure() -> View {
    View::text_only(escape_markdown_v2("⚠️ Something went wrong. Please try again."))
}

pub fn unauthorized() -> View {
    View::text_only(escape_markdown_v2("⛔ Unauthorized access."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feb5() -> DateId {
        DateId::from_ymd(2025, 2, 5).unwrap()
    }

    fn tasks(n: usize) -> Vec<Task> {
        (0..n)
            .map(|i| Task {
                text: format!("task {}", i),
                completed: i % 2 == 1,
                index: i,
                source_line: 10 + i,
            })
            .collect()
    }

    fn toggled_indices(keyboard: &Keyboard) -> Vec<usize> {
        keyboard
            .buttons()
            .filter_map(|b| match b.action {
                MenuAction::ToggleTask(i) => Some(i),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_main_menu_grid() {
        let kb = main_menu_keyboard();
        assert_eq!(kb.rows.len(), 2);
        assert!(kb.rows.iter().all(|r| r.len() == 2));
        assert_eq!(kb.rows[0][0].action, MenuAction::OpenRating);
        assert_eq!(kb.rows[0][1].action, MenuAction::OpenTasks);
        assert_eq!(kb.rows[1][0].action, MenuAction::OpenNote);
        assert_eq!(kb.rows[1][1].action, MenuAction::OpenCalendar);
    }

    #[test]
    fn test_pagination_twelve_tasks() {
        let all = tasks(12);
        assert_eq!(total_pages(all.len()), 3);

        let first = tasks_keyboard(&all, 0);
        assert_eq!(toggled_indices(&first), vec![0, 1, 2, 3, 4]);
        assert!(first.find(&MenuAction::TaskPage(1)).is_some());
        assert!(!first.buttons().any(|b| b.label == "◀"));
        assert_eq!(first.find(&MenuAction::TaskNoop).unwrap().label, "1/3");

        let last = tasks_keyboard(&all, 2);
        assert_eq!(toggled_indices(&last), vec![10, 11]);
        assert!(last.find(&MenuAction::TaskPage(1)).is_some());
        assert!(!last.buttons().any(|b| b.label == "▶"));
        assert_eq!(last.find(&MenuAction::TaskNoop).unwrap().label, "3/3");
    }

    #[test]
    fn test_single_page_has_no_pagination_row() {
        let kb = tasks_keyboard(&tasks(5), 0);
        assert!(kb.find(&MenuAction::TaskNoop).is_none());
        // five tasks, add, back
        assert_eq!(kb.rows.len(), 7);
        assert_eq!(kb.rows.last().unwrap()[0].action, MenuAction::TaskBack);
    }

    #[test]
    fn test_page_out_of_range_is_clamped() {
        let kb = tasks_keyboard(&tasks(7), 9);
        assert_eq!(toggled_indices(&kb), vec![5, 6]);
        assert_eq!(clamp_page(3, 0), 0);
    }

    #[test]
    fn test_task_glyphs() {
        let kb = tasks_keyboard(&tasks(2), 0);
        assert_eq!(kb.rows[0][0].label, "☐ task 0");
        assert_eq!(kb.rows[1][0].label, "☑ task 1");
    }

    #[test]
    fn test_calendar_cell_identity() {
        let cursor = CalendarCursor { year: 2025, month: 2 };
        let active = DateId::from_ymd(2025, 2, 10).unwrap();
        let kb = calendar_keyboard(cursor, &active, &HashSet::new());

        let cell = kb.find(&MenuAction::SelectDate(feb5())).unwrap();
        assert_eq!(cell.label, "5");
        assert_eq!(cell.action.to_string(), "cal:select:05-Feb-2025");
    }

    #[test]
    fn test_calendar_layout() {
        let cursor = CalendarCursor { year: 2025, month: 2 };
        let kb = calendar_keyboard(cursor, &feb5(), &HashSet::new());

        assert_eq!(kb.rows[0][1].label, "February 2025");
        assert_eq!(kb.rows[0][0].action, MenuAction::PrevMonth);
        assert_eq!(kb.rows[0][2].action, MenuAction::NextMonth);
        assert_eq!(kb.rows[1].len(), 7);
        assert_eq!(kb.rows[1][0].label, "Mo");
        // header, weekdays, 5 weeks, footer
        assert_eq!(kb.rows.len(), 8);
        assert_eq!(kb.rows[2][0].label, " ");
        assert_eq!(kb.rows[2][0].action, MenuAction::CalendarNoop);
        let footer = kb.rows.last().unwrap();
        assert_eq!(footer[0].action, MenuAction::Today);
        assert_eq!(footer[1].action, MenuAction::CalendarBack);
    }

    #[test]
    fn test_calendar_decorations() {
        let cursor = CalendarCursor { year: 2025, month: 2 };
        let existing: HashSet<String> = ["05-Feb-2025", "06-Feb-2025"].iter().map(|s| s.to_string()).collect();
        let kb = calendar_keyboard(cursor, &feb5(), &existing);

        // Active wins over "has note"
        assert_eq!(kb.find(&MenuAction::SelectDate(feb5())).unwrap().label, "[5]");
        let feb6 = DateId::from_ymd(2025, 2, 6).unwrap();
        assert_eq!(kb.find(&MenuAction::SelectDate(feb6)).unwrap().label, "*6*");
        let feb7 = DateId::from_ymd(2025, 2, 7).unwrap();
        assert_eq!(kb.find(&MenuAction::SelectDate(feb7)).unwrap().label, "7");
    }

    #[test]
    fn test_render_by_mode() {
        let mut session = SessionState::new(1, feb5());
        let content = "---\nRating: 4\n---\n- [ ] one\n- [x] two\n---\n";
        let doc = NoteDocument::parse(content).unwrap();
        let existing = HashSet::new();
        let ctx = RenderContext {
            document: Some(&doc),
            existing_dates: &existing,
        };

        assert_eq!(render(&session, &ctx).keyboard, Some(main_menu_keyboard()));

        session.open_rating();
        let view = render(&session, &ctx);
        assert!(view.text.contains("Current rating: 4"));
        assert!(view.keyboard.is_none());

        session.open_tasks();
        let view = render(&session, &ctx);
        assert_eq!(toggled_indices(view.keyboard.as_ref().unwrap()), vec![0, 1]);

        session.begin_add_task();
        let view = render(&session, &ctx);
        assert!(view.keyboard.unwrap().find(&MenuAction::CancelTask).is_some());

        session.open_calendar();
        let view = render(&session, &ctx);
        assert!(view.keyboard.unwrap().find(&MenuAction::Today).is_some());
    }

    #[test]
    fn test_note_view_preview() {
        let content = "---\nRating: 7\n---\n---\nshort";
        let view = note_view(&feb5(), content);
        assert!(view.text.contains("Rating: 7"));
        assert!(view.text.contains("```\n---\nRating: 7"));
        assert!(!view.text.contains("..."));

        let long = format!("---\n---\n---\n{}", "a".repeat(5000));
        let view = note_view(&feb5(), &long);
        assert!(view.text.contains("Rating: not set"));
        assert!(view.text.contains("...\n```"));
    }

    #[test]
    fn test_dynamic_text_is_escaped() {
        let view = main_menu(&feb5());
        assert!(view.text.contains("*05\\-Feb\\-2025*"));
    }
}
