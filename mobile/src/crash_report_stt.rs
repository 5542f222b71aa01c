use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stored `crash_log` value when no crash is pending
pub const CRASH_TIMESTAMP_EMPTY_DEFAULT: i64 = -1;

/// Last crash, persisted next to the settings so the next launch can report it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashPreferences {
    #[serde(default = "default_crash_log")]
    pub crash_log: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub cause: Option<String>,
}

fn default_crash_log() -> i64 {
    CRASH_TIMESTAMP_EMPTY_DEFAULT
}

impl Default for CrashPreferences {
    fn default() -> Self {
        Self {
            crash_log: CRASH_TIMESTAMP_EMPTY_DEFAULT,
            message: None,
            cause: None,
        }
    }
}

/// Crash recorded by a previous run that has not been shown yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCrash {
    pub timestamp: i64,
    pub stack: String,
    pub message: Option<String>,
    pub cause: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CrashReport {
    pub log_dir: PathBuf,
    pub preferences_path: PathBuf,
    /// Database receiving a `stack_traces` row per crash, if any
    pub db_path: Option<String>,
}
