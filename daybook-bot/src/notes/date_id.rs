//! Canonical date identity for daily notes.
//!
//! A `DateId` renders as `DD-Mon-YYYY` (e.g. `05-Feb-2025`). That string is
//! the note filename stem, the calendar cell identity and the session's
//! active date, so every producer goes through `Display` here.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike, Utc};
use std::fmt;
use std::str::FromStr;

use super::error::NoteError;

/// strftime pattern for date-ids
pub const DATE_ID_FORMAT: &str = "%d-%b-%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateId(NaiveDate);

impl DateId {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(DateId)
    }

    /// Strict parse: the input must re-format byte-identically, so
    /// `5-Feb-2025` or `05-feb-2025` are rejected.
    pub fn parse(raw: &str) -> Result<Self, NoteError> {
        let date = NaiveDate::parse_from_str(raw, DATE_ID_FORMAT)
            .map_err(|_| NoteError::InvalidDateId(raw.to_string()))?;
        let id = DateId(date);
        if id.to_string() != raw {
            return Err(NoteError::InvalidDateId(raw.to_string()));
        }
        Ok(id)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// `YYYY-MM-DD`, the format used by completion annotations
    pub fn iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    pub fn file_name(&self) -> String {
        format!("{}.md", self)
    }
}

impl fmt::Display for DateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_ID_FORMAT))
    }
}

impl FromStr for DateId {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateId::parse(s)
    }
}

/// Computes "logical today": wall-clock time at a fixed UTC offset, where
/// hours before `day_start_hour` still belong to the previous day.
#[derive(Debug, Clone, Copy)]
pub struct LogicalClock {
    offset: FixedOffset,
    day_start_hour: u32,
}

impl LogicalClock {
    pub fn new(utc_offset_hours: i32, day_start_hour: u32) -> Option<Self> {
        if day_start_hour > 23 {
            return None;
        }
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600)?;
        Some(Self {
            offset,
            day_start_hour,
        })
    }

    pub fn today_at(&self, now: DateTime<Utc>) -> DateId {
        let local = now.with_timezone(&self.offset);
        let adjusted = if local.hour() < self.day_start_hour {
            local - Duration::days(1)
        } else {
            local
        };
        DateId(adjusted.date_naive())
    }

    pub fn today(&self) -> DateId {
        self.today_at(Utc::now())
    }
}
