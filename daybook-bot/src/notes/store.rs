//! NoteStore — dated markdown notes on disk
//!
//! Daily notes live at `<notes_dir>/Daily/<DD-Mon-YYYY>.md`. New notes are
//! rendered from `<notes_dir>/<template_subdir>/Daily.md`, or from a built-in
//! skeleton when that template is missing.
//!
//! Writes rewrite the whole file. Two writers on the same date race and the
//! last one wins; nothing here serializes them.

use super::date_id::DateId;
use super::document::RATING_KEY;
use super::error::NoteError;
use super::file_ops;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DAILY_SUBDIR: &str = "Daily";
pub const DAILY_TEMPLATE_FILE: &str = "Daily.md";
/// Replaced with the date-id when a note is rendered from the template
pub const DATE_PLACEHOLDER: &str = "{{date}}";

pub struct NoteStore {
    notes_dir: PathBuf,
    daily_dir: PathBuf,
    template_path: PathBuf,
}

impl NoteStore {
    pub fn new(notes_dir: PathBuf, template_subdir: &str) -> Self {
        let daily_dir = notes_dir.join(DAILY_SUBDIR);
        let template_path = notes_dir.join(template_subdir).join(DAILY_TEMPLATE_FILE);
        Self {
            notes_dir,
            daily_dir,
            template_path,
        }
    }

    /// Get the notes directory path
    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    pub fn daily_dir(&self) -> &Path {
        &self.daily_dir
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn note_path(&self, date: &DateId) -> PathBuf {
        self.daily_dir.join(date.file_name())
    }

    /// Full note text, or `None` when no note exists for `date`
    pub fn read(&self, date: &DateId) -> Result<Option<String>, NoteError> {
        let path = self.note_path(date);
        file_ops::read_note(&path).map_err(|e| NoteError::io(path, e))
    }

    pub fn write(&self, date: &DateId, content: &str) -> Result<(), NoteError> {
        let path = self.note_path(date);
        file_ops::write_note(&path, content).map_err(|e| NoteError::io(path, e))
    }

    /// Create the note for `date` if missing. Returns true when a file was created.
    pub fn ensure_created(&self, date: &DateId) -> Result<bool, NoteError> {
        if self.read(date)?.is_some() {
            return Ok(false);
        }

        let content = self.render_new_note(date)?;
        self.write(date, &content)?;
        log::info!("[NOTES] Created daily note {}", date);
        Ok(true)
    }

    /// Read the note, creating it first when absent
    pub fn read_or_create(&self, date: &DateId) -> Result<String, NoteError> {
        self.ensure_created(date)?;
        self.read(date)?
            .ok_or_else(|| NoteError::io(self.note_path(date), std::io::ErrorKind::NotFound.into()))
    }

    /// Append `text` and a line break to the end of the note (the body section).
    /// A note whose last line is unterminated gets a line break first, so the
    /// closing `---` stays a delimiter.
    pub fn append(&self, date: &DateId, text: &str) -> Result<(), NoteError> {
        self.update(date, |content| {
            let separator = if content.is_empty() || content.ends_with('\n') {
                ""
            } else {
                "\n"
            };
            Ok(format!("{}{}{}\n", content, separator, text))
        })?;
        Ok(())
    }

    /// Read-modify-write of a whole note; the note is created first when absent.
    /// Returns the written content.
    pub fn update<F>(&self, date: &DateId, mutate: F) -> Result<String, NoteError>
    where
        F: FnOnce(&str) -> Result<String, NoteError>,
    {
        let content = self.read_or_create(date)?;
        let updated = mutate(&content)?;
        self.write(date, &updated)?;
        Ok(updated)
    }

    /// Date-ids of every note present under `Daily/`
    pub fn existing_dates(&self) -> Result<HashSet<String>, NoteError> {
        let stems = file_ops::list_note_stems(&self.daily_dir)
            .map_err(|e| NoteError::io(&self.daily_dir, e))?;
        log::debug!("[NOTES] Found {} existing daily notes", stems.len());
        Ok(stems.into_iter().collect())
    }

    fn render_new_note(&self, date: &DateId) -> Result<String, NoteError> {
        match file_ops::read_note(&self.template_path) {
            Ok(Some(template)) => Ok(template.replace(DATE_PLACEHOLDER, &date.to_string())),
            Ok(None) => {
                log::warn!(
                    "[NOTES] Daily template not found at {:?}, using built-in skeleton",
                    self.template_path
                );
                Ok(skeleton_note(date))
            }
            Err(e) => Err(NoteError::io(&self.template_path, e)),
        }
    }
}

/// Built-in three-section note used when no template file exists
pub fn skeleton_note(date: &DateId) -> String {
    [
        "---".to_string(),
        format!("date: {}", date.iso()),
        format!("title: {}", date),
        "tags: [daily]".to_string(),
        format!("{}: ", RATING_KEY),
        "---".to_string(),
        String::new(),
        "- [ ] Plan the day".to_string(),
        "- [ ] Review the day".to_string(),
        String::new(),
        "---".to_string(),
        String::new(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::document::{get_rating, parse_tasks, NoteDocument};
    use std::fs;
    use tempfile::tempdir;

    const TEMPLATE: &str = "---\ntitle: {{date}}\nRating: \n---\n\n- [ ] Morning pages\n\n---\n# {{date}}\n";

    fn feb5() -> DateId {
        DateId::from_ymd(2025, 2, 5).unwrap()
    }

    fn store_with_template(root: &Path) -> NoteStore {
        fs::create_dir_all(root.join("Templates")).unwrap();
        fs::write(root.join("Templates/Daily.md"), TEMPLATE).unwrap();
        NoteStore::new(root.to_path_buf(), "Templates")
    }

    #[test]
    fn test_read_absent_note() {
        let dir = tempdir().unwrap();
        let store = NoteStore::new(dir.path().to_path_buf(), "Templates");
        assert!(store.read(&feb5()).unwrap().is_none());
    }

    #[test]
    fn test_ensure_created_from_template() {
        let dir = tempdir().unwrap();
        let store = store_with_template(dir.path());

        assert!(store.ensure_created(&feb5()).unwrap());

        let path = dir.path().join("Daily/05-Feb-2025.md");
        assert!(path.exists());
        assert_eq!(path.file_stem().unwrap().to_string_lossy(), feb5().to_string());

        let content = store.read(&feb5()).unwrap().unwrap();
        assert_eq!(content, TEMPLATE.replace("{{date}}", "05-Feb-2025"));
        assert!(!content.contains(DATE_PLACEHOLDER));
    }

    #[test]
    fn test_ensure_created_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let store = store_with_template(dir.path());
        store.write(&feb5(), "---\n---\n---\nmine\n").unwrap();

        assert!(!store.ensure_created(&feb5()).unwrap());
        assert_eq!(store.read(&feb5()).unwrap().unwrap(), "---\n---\n---\nmine\n");
    }

    #[test]
    fn test_ensure_created_fallback_skeleton() {
        let dir = tempdir().unwrap();
        let store = NoteStore::new(dir.path().to_path_buf(), "Templates");

        assert!(store.ensure_created(&feb5()).unwrap());
        let content = store.read(&feb5()).unwrap().unwrap();

        let doc = NoteDocument::parse(&content).unwrap();
        assert!(doc.frontmatter_lines().contains(&"tags: [daily]".to_string()));
        assert!(doc.frontmatter_lines().contains(&"title: 05-Feb-2025".to_string()));
        assert_eq!(parse_tasks(&content).len(), 2);
        assert_eq!(get_rating(&content), None);
        assert!(doc.body_lines().iter().all(|l| l.is_empty()));
    }

    #[test]
    fn test_append_creates_and_appends_to_body() {
        let dir = tempdir().unwrap();
        let store = store_with_template(dir.path());

        store.append(&feb5(), "first thought").unwrap();
        store.append(&feb5(), "second thought").unwrap();

        let content = store.read(&feb5()).unwrap().unwrap();
        assert!(content.ends_with("first thought\nsecond thought\n"));

        let doc = NoteDocument::parse(&content).unwrap();
        assert!(doc.body_lines().contains(&"second thought".to_string()));
        assert_eq!(parse_tasks(&content).len(), 1);
    }

    #[test]
    fn test_append_after_unterminated_delimiter() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Templates")).unwrap();
        fs::write(
            dir.path().join("Templates/Daily.md"),
            "---\ntitle: {{date}}\n---\n- [ ] a\n- [ ] b\n---",
        )
        .unwrap();
        let store = NoteStore::new(dir.path().to_path_buf(), "Templates");

        store.ensure_created(&feb5()).unwrap();
        assert_eq!(parse_tasks(&store.read(&feb5()).unwrap().unwrap()).len(), 2);

        store.append(&feb5(), "hello").unwrap();
        let content = store.read(&feb5()).unwrap().unwrap();
        assert!(content.ends_with("- [ ] b\n---\nhello\n"));
        assert_eq!(parse_tasks(&content).len(), 2);

        let doc = NoteDocument::parse(&content).unwrap();
        assert_eq!(doc.body_lines(), &["hello".to_string(), String::new()]);
    }

    #[test]
    fn test_update_rewrites_whole_file() {
        let dir = tempdir().unwrap();
        let store = store_with_template(dir.path());

        let written = store
            .update(&feb5(), |content| Ok(content.replace("Morning pages", "Evening walk")))
            .unwrap();
        assert_eq!(store.read(&feb5()).unwrap().unwrap(), written);
        assert_eq!(parse_tasks(&written)[0].text, "Evening walk");
    }

    #[test]
    fn test_update_error_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let store = store_with_template(dir.path());
        store.ensure_created(&feb5()).unwrap();
        let before = store.read(&feb5()).unwrap().unwrap();

        let result = store.update(&feb5(), |_| Err(NoteError::MalformedDocument));
        assert!(matches!(result, Err(NoteError::MalformedDocument)));
        assert_eq!(store.read(&feb5()).unwrap().unwrap(), before);
    }

    #[test]
    fn test_existing_dates() {
        let dir = tempdir().unwrap();
        let store = store_with_template(dir.path());
        assert!(store.existing_dates().unwrap().is_empty());

        store.ensure_created(&feb5()).unwrap();
        store.ensure_created(&DateId::from_ymd(2025, 3, 1).unwrap()).unwrap();

        let dates = store.existing_dates().unwrap();
        assert_eq!(dates.len(), 2);
        assert!(dates.contains("05-Feb-2025"));
        assert!(dates.contains("01-Mar-2025"));
    }

    #[test]
    fn test_io_failure_is_reported() {
        let dir = tempdir().unwrap();
        // A file where the Daily directory should be
        fs::write(dir.path().join("Daily"), "not a dir").unwrap();
        let store = NoteStore::new(dir.path().to_path_buf(), "Templates");

        assert!(matches!(store.ensure_created(&feb5()), Err(NoteError::Io { .. })));
        assert!(matches!(store.read(&feb5()), Err(NoteError::Io { .. })));
    }
}
