//! File operations for daily notes
//!
//! Whole-file reads and writes plus directory listing. Every mutation in the
//! note store is read-modify-write through these helpers.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Write a note file (creates parent directories as needed)
pub fn write_note(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Read a note file, returning `None` if not found
pub fn read_note(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// File stems of the `.md` files directly inside `dir` (hidden files skipped)
pub fn list_note_stems(dir: &Path) -> io::Result<Vec<String>> {
    let mut stems = Vec::new();

    if !dir.is_dir() {
        return Ok(stems);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().map(|e| e != "md").unwrap_or(true) {
            continue;
        }
        if let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) {
            if !stem.starts_with('.') {
                stems.push(stem);
            }
        }
    }

    stems.sort();
    Ok(stems)
}
