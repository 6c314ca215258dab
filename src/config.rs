use std::{env, path::PathBuf};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_PATH: &str = "data/storage.json";
/// Same order of magnitude as browser local storage limits.
pub const DEFAULT_STORAGE_QUOTA: usize = 5 * 1024 * 1024;
pub const DEFAULT_REMINDER_HOUR: u32 = 20;
/// Exports are pretty-printed, so a file of a full journal is several
/// times larger than its stored form.
pub const IMPORT_LIMIT_FACTOR: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub storage_quota: usize,
    pub reminder_hour: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            storage_quota: DEFAULT_STORAGE_QUOTA,
            reminder_hour: DEFAULT_REMINDER_HOUR,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let reminder_hour = parse_or(&lookup, "APP_REMINDER_HOUR", defaults.reminder_hour);
        let reminder_hour = if reminder_hour < 24 {
            reminder_hour
        } else {
            warn!(reminder_hour, "APP_REMINDER_HOUR out of range, using default");
            defaults.reminder_hour
        };

        Self {
            port: parse_or(&lookup, "PORT", defaults.port),
            data_path: lookup("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            storage_quota: parse_or(&lookup, "APP_STORAGE_QUOTA", defaults.storage_quota),
            reminder_hour,
        }
    }

    /// Largest import body accepted; big enough to take back any export of
    /// a journal that fits the storage quota.
    pub fn import_body_limit(&self) -> usize {
        self.storage_quota.saturating_mul(IMPORT_LIMIT_FACTOR)
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "invalid value, using default");
            default
        }),
        None => default,
    }
}
