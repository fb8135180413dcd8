use std::env;
use std::path::PathBuf;

use crate::notes::LogicalClock;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const BOT_TOKEN: &str = "BOT_TOKEN";
    /// Telegram user id of the only user the bot answers
    pub const ROOT_ID: &str = "ROOT_ID";
    pub const NOTES_DIR: &str = "NOTES_DIR";
    pub const TEMPLATE_SUBDIR: &str = "TEMPLATE_SUBDIR";
    /// Whole hours east of UTC used to compute "today"
    pub const TIMEZONE_OFFSET_HOURS: &str = "TIMEZONE_OFFSET_HOURS";
    /// Local hour at which a new day begins; earlier hours belong to yesterday
    pub const DAY_START_HOUR: &str = "DAY_START_HOUR";
}

/// Default values
pub mod defaults {
    pub const TEMPLATE_SUBDIR: &str = "Templates";
    pub const TIMEZONE_OFFSET_HOURS: i32 = 3;
    pub const DAY_START_HOUR: u32 = 7;
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    pub root_id: u64,
    pub notes_dir: PathBuf,
    pub template_subdir: String,
    pub timezone_offset_hours: i32,
    pub day_start_hour: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| format!("{} is not set", key))
        };

        let bot_token = required(env_vars::BOT_TOKEN)?;

        let root_raw = required(env_vars::ROOT_ID)?;
        let root_id = root_raw
            .parse::<u64>()
            .map_err(|_| format!("{} must be a numeric user id, got {:?}", env_vars::ROOT_ID, root_raw))?;

        let notes_dir = PathBuf::from(required(env_vars::NOTES_DIR)?);
        if !notes_dir.is_dir() {
            return Err(format!(
                "{} does not point to an existing directory: {:?}",
                env_vars::NOTES_DIR,
                notes_dir
            ));
        }

        let template_subdir = lookup(env_vars::TEMPLATE_SUBDIR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| defaults::TEMPLATE_SUBDIR.to_string());

        let timezone_offset_hours = match lookup(env_vars::TIMEZONE_OFFSET_HOURS) {
            Some(raw) => raw
                .trim()
                .parse::<i32>()
                .ok()
                .filter(|h| (-12..=14).contains(h))
                .ok_or_else(|| {
                    format!(
                        "{} must be a whole number of hours between -12 and 14, got {:?}",
                        env_vars::TIMEZONE_OFFSET_HOURS,
                        raw
                    )
                })?,
            None => defaults::TIMEZONE_OFFSET_HOURS,
        };

        let day_start_hour = match lookup(env_vars::DAY_START_HOUR) {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|h| *h <= 23)
                .ok_or_else(|| {
                    format!("{} must be an hour between 0 and 23, got {:?}", env_vars::DAY_START_HOUR, raw)
                })?,
            None => defaults::DAY_START_HOUR,
        };

        Ok(Self {
            bot_token,
            root_id,
            notes_dir,
            template_subdir,
            timezone_offset_hours,
            day_start_hour,
        })
    }

    pub fn clock(&self) -> Result<LogicalClock, String> {
        LogicalClock::new(self.timezone_offset_hours, self.day_start_hour).ok_or_else(|| {
            format!(
                "invalid clock settings: offset {}h, day start {}h",
                self.timezone_offset_hours, self.day_start_hour
            )
        })
    }
}
