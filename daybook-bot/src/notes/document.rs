//! Structured view of a daily note.
//!
//! A daily note is three `---` delimited sections in fixed order:
//!
//! ```text
//! ---
//! date: 2025-02-05
//! Rating: 7
//! ---
//! - [ ] open task
//! - [x] done task  [completion:: 2025-02-05]
//! ---
//! free text body
//! ```
//!
//! `NoteDocument` is parsed from the file text for a single operation and
//! re-serialized afterwards. Lines the operation does not touch come back
//! byte-for-byte, including `\r` line endings.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use super::date_id::DateId;
use super::error::NoteError;

/// Frontmatter key holding the day rating
pub const RATING_KEY: &str = "Rating";

const DELIMITER: &str = "---";
const COMPLETION_MARKER: &str = "[completion::";

// Leading checklist marker; group 1 is the checkbox state
static TASK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*- \[([ xX])\]").unwrap());
static COMPLETION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[completion::[^\]]*\]").unwrap());

/// A checklist item from the tasks section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Text after the marker, completion annotation removed
    pub text: String,
    pub completed: bool,
    /// 0-based position among tasks in file order
    pub index: usize,
    /// 1-based line number in the whole file
    pub source_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDocument {
    /// Lines before the opening delimiter (normally none)
    preamble: Vec<String>,
    frontmatter: Vec<String>,
    tasks: Vec<String>,
    /// Everything after the third delimiter, further `---` lines included
    body: Vec<String>,
    delimiters: [String; 3],
}

impl NoteDocument {
    pub fn parse(content: &str) -> Result<Self, NoteError> {
        let lines: Vec<&str> = content.split('\n').collect();
        let found: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| is_delimiter(line))
            .map(|(i, _)| i)
            .take(3)
            .collect();

        let [open, close, end] = match found.as_slice() {
            [a, b, c] => [*a, *b, *c],
            _ => return Err(NoteError::MalformedDocument),
        };

        let owned = |range: &[&str]| range.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Ok(Self {
            preamble: owned(&lines[..open]),
            frontmatter: owned(&lines[open + 1..close]),
            tasks: owned(&lines[close + 1..end]),
            body: owned(&lines[end + 1..]),
            delimiters: [
                lines[open].to_string(),
                lines[close].to_string(),
                lines[end].to_string(),
            ],
        })
    }

    pub fn frontmatter_lines(&self) -> &[String] {
        &self.frontmatter
    }

    pub fn task_lines(&self) -> &[String] {
        &self.tasks
    }

    pub fn body_lines(&self) -> &[String] {
        &self.body
    }

    /// 1-based file line number of the first tasks-section line
    fn tasks_start_line(&self) -> usize {
        self.preamble.len() + self.frontmatter.len() + 3
    }

    fn line_ending(&self) -> &'static str {
        if self.delimiters[0].ends_with('\r') {
            "\r"
        } else {
            ""
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        let start = self.tasks_start_line();
        self.tasks
            .iter()
            .enumerate()
            .filter_map(|(offset, line)| parse_task_line(line).map(|t| (offset, t)))
            .enumerate()
            .map(|(index, (offset, (text, completed)))| Task {
                text,
                completed,
                index,
                source_line: start + offset,
            })
            .collect()
    }

    /// Flip the checkbox of task `index`, returning the task in its new state.
    pub fn toggle_task(&mut self, index: usize, today: &DateId) -> Result<Task, NoteError> {
        let tasks = self.tasks();
        let task = tasks.get(index).ok_or(NoteError::IndexOutOfRange {
            index,
            count: tasks.len(),
        })?;

        let line_no = task.source_line;
        let line = line_no
            .checked_sub(self.tasks_start_line())
            .and_then(|offset| self.tasks.get_mut(offset))
            .ok_or(NoteError::MalformedTaskLine { line: line_no })?;

        let toggled = toggle_line(line, today).ok_or(NoteError::MalformedTaskLine { line: line_no })?;
        *line = toggled;

        Ok(Task {
            text: task.text.clone(),
            completed: !task.completed,
            index,
            source_line: line_no,
        })
    }

    /// Insert `- [ ] text` after the last task line.
    ///
    /// With no tasks yet, the line goes after a leading blank line when the
    /// section has one, otherwise at the section start.
    pub fn add_task(&mut self, text: &str) {
        let text = single_line(text);
        let new_line = format!("- [ ] {}{}", text, self.line_ending());

        let last_task = self.tasks.iter().rposition(|line| parse_task_line(line).is_some());
        let at = match last_task {
            Some(i) => i + 1,
            None if self.tasks.first().is_some_and(|l| is_blank(l)) => 1,
            None => 0,
        };
        self.tasks.insert(at, new_line);
    }

    /// Rating from the frontmatter; absent or unparsable values read as `None`.
    pub fn rating(&self) -> Option<i64> {
        self.frontmatter
            .iter()
            .find_map(|line| rating_value(line))
            .and_then(|value| value.trim().parse().ok())
    }

    /// Write `Rating: <value>`. Range policy belongs to the caller.
    pub fn set_rating(&mut self, value: i64) {
        let mut found = false;
        for line in self.frontmatter.iter_mut() {
            if rating_value(line).is_some() {
                let indent_len = line.len() - line.trim_start().len();
                let eol = if line.ends_with('\r') { "\r" } else { "" };
                *line = format!("{}{}: {}{}", &line[..indent_len], RATING_KEY, value, eol);
                found = true;
            }
        }
        if found {
            return;
        }

        let new_line = format!("{}: {}{}", RATING_KEY, value, self.line_ending());
        match self.frontmatter.last() {
            Some(last) if is_blank(last) => {
                let at = self.frontmatter.len() - 1;
                self.frontmatter.insert(at, new_line);
            }
            _ => self.frontmatter.push(new_line),
        }
    }
}

impl fmt::Display for NoteDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [open, close, end] = &self.delimiters;
        let joined = self
            .preamble
            .iter()
            .chain(std::iter::once(open))
            .chain(self.frontmatter.iter())
            .chain(std::iter::once(close))
            .chain(self.tasks.iter())
            .chain(std::iter::once(end))
            .chain(self.body.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        f.write_str(&joined)
    }
}

/// Tasks of `content`, or an empty list when the document is malformed.
pub fn parse_tasks(content: &str) -> Vec<Task> {
    match NoteDocument::parse(content) {
        Ok(doc) => doc.tasks(),
        Err(e) => {
            log::warn!("[NOTES] Cannot parse tasks: {}", e);
            Vec::new()
        }
    }
}

pub fn toggle_task(content: &str, index: usize, today: &DateId) -> Result<String, NoteError> {
    let mut doc = NoteDocument::parse(content)?;
    doc.toggle_task(index, today)?;
    Ok(doc.to_string())
}

pub fn add_task(content: &str, text: &str) -> Result<String, NoteError> {
    let mut doc = NoteDocument::parse(content)?;
    doc.add_task(text);
    Ok(doc.to_string())
}

pub fn get_rating(content: &str) -> Option<i64> {
    NoteDocument::parse(content).ok()?.rating()
}

pub fn set_rating(content: &str, value: i64) -> Result<String, NoteError> {
    let mut doc = NoteDocument::parse(content)?;
    doc.set_rating(value);
    Ok(doc.to_string())
}

fn is_delimiter(line: &str) -> bool {
    line.strip_suffix('\r').unwrap_or(line) == DELIMITER
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn rating_value(line: &str) -> Option<&str> {
    line.trim()
        .strip_prefix(RATING_KEY)
        .and_then(|rest| rest.strip_prefix(':'))
}

/// `(text, completed)` for a checklist line
fn parse_task_line(line: &str) -> Option<(String, bool)> {
    let caps = TASK_RE.captures(line)?;
    let completed = caps.get(1)?.as_str() != " ";
    let rest = line[caps.get(0)?.end()..].trim();
    let text = match rest.find(COMPLETION_MARKER) {
        Some(pos) => rest[..pos].trim(),
        None => rest,
    };
    Some((text.to_string(), completed))
}

fn toggle_line(line: &str, today: &DateId) -> Option<String> {
    let (content, eol) = match line.strip_suffix('\r') {
        Some(stripped) => (stripped, "\r"),
        None => (line, ""),
    };

    let caps = TASK_RE.captures(content)?;
    let mark = caps.get(1)?;
    let completing = mark.as_str() == " ";

    let flipped = format!(
        "{}{}{}",
        &content[..mark.start()],
        if completing { 'x' } else { ' ' },
        &content[mark.end()..]
    );
    let stripped = COMPLETION_RE.replace(&flipped, "");

    if completing {
        Some(format!(
            "{}  {} {}]{}",
            stripped.trim_end(),
            COMPLETION_MARKER,
            today.iso(),
            eol
        ))
    } else {
        Some(format!("{}{}", stripped, eol))
    }
}

/// Collapse multi-line input so one task stays one line.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
