pub use crate::crash_report_stt::*;
use crate::models::NewStackTrace;
use crate::Config;
use anyhow::{Context, Result};
use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

pub const CRASH_PREFERENCES_FILE: &str = "crash_preferences.json";

impl CrashPreferences {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).context("Failed to read crash preferences")?;
        let preferences: CrashPreferences =
            serde_json::from_str(&contents).context("Failed to parse crash preferences JSON")?;

        Ok(preferences)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize crash preferences")?;
        fs::write(path, json).context("Failed to write crash preferences")?;
        Ok(())
    }
}

/// Text of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

impl CrashReport {
    pub fn new(config: &Config) -> Self {
        Self {
            log_dir: config.log_dir.clone(),
            preferences_path: config.config_dir.join(CRASH_PREFERENCES_FILE),
            db_path: Some(config.db_path()),
        }
    }

    pub fn crash_log_path(&self, timestamp: i64) -> PathBuf {
        self.log_dir.join(format!("crashLog_{}", timestamp))
    }

    /// Return the crash left by the previous run, if any, and install the
    /// panic hook for this one.
    pub fn initialize(&self) -> Option<PendingCrash> {
        let pending = self.pending_crash();
        self.install_hook();
        pending
    }

    fn pending_crash(&self) -> Option<PendingCrash> {
        let preferences = match CrashPreferences::load(&self.preferences_path) {
            Ok(preferences) => preferences,
            Err(e) => {
                tracing::warn!("Ignoring unreadable crash preferences: {:#}", e);
                return None;
            }
        };

        if preferences.crash_log == CRASH_TIMESTAMP_EMPTY_DEFAULT {
            return None;
        }

        match fs::read_to_string(self.crash_log_path(preferences.crash_log)) {
            Ok(stack) => Some(PendingCrash {
                timestamp: preferences.crash_log,
                stack,
                message: preferences.message,
                cause: preferences.cause,
            }),
            Err(e) => {
                tracing::error!("Failed to read crash log {}: {}", preferences.crash_log, e);
                if fs::remove_dir_all(&self.log_dir).is_ok() {
                    tracing::error!("Crash handler crashed -----> deleted crash logs");
                }
                if let Err(e) = self.acknowledge() {
                    tracing::error!("Failed to reset crash preferences: {:#}", e);
                }
                None
            }
        }
    }

    fn install_hook(&self) {
        let report = self.clone();
        let default_hook = std::panic::take_hook();

        std::panic::set_hook(Box::new(move |panic_info| {
            let message = panic_message(panic_info.payload());
            let cause = panic_info.location().map(|l| l.to_string());
            report.record_crash(&message, cause.as_deref());
            default_hook(panic_info);
        }));

        tracing::info!("Crash handler installed, logs in {:?}", self.log_dir);
    }

    /// Write the crash log, remember it for the next launch and store the
    /// trace in the database. Returns the crash timestamp.
    pub fn record_crash(&self, message: &str, cause: Option<&str>) -> i64 {
        let now = chrono::Utc::now();
        let timestamp = now.timestamp_millis();
        let stack = format_stack(&now.to_rfc3339(), message, cause);

        if let Err(e) = self.write_crash_log(timestamp, &stack) {
            tracing::error!("Failed to write crash log: {:#}", e);
        }

        let preferences = CrashPreferences {
            crash_log: timestamp,
            message: Some(message.to_string()),
            cause: cause.map(str::to_string),
        };
        if let Err(e) = preferences.save(&self.preferences_path) {
            tracing::error!("Failed to save crash preferences: {:#}", e);
        }

        // The process may be going down, so this write is not deferred
        if let Some(db_path) = &self.db_path {
            let trace = NewStackTrace {
                trace: stack,
                message: Some(message.to_string()),
                cause: cause.map(str::to_string),
                timestamp,
            };
            let result = crate::db::establish_connection_at(db_path)
                .and_then(|mut conn| crate::db_stack_trace::insert_trace(&mut conn, &trace));
            if let Err(e) = result {
                tracing::error!("Failed to save stack trace to database: {:#}", e);
            }
        }

        timestamp
    }

    fn write_crash_log(&self, timestamp: i64, stack: &str) -> Result<()> {
        fs::create_dir_all(&self.log_dir).context("Failed to create crash log directory")?;
        let path = self.crash_log_path(timestamp);
        fs::write(&path, stack).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    /// Forget the pending crash once it has been shown
    pub fn acknowledge(&self) -> Result<()> {
        CrashPreferences::default().save(&self.preferences_path)
    }

    /// Store a trace in the database on a background thread
    pub fn save_trace_to_database(&self, trace: NewStackTrace) -> thread::JoinHandle<()> {
        let db_path = self.db_path.clone();
        thread::spawn(move || {
            tracing::debug!("Thread started");
            let Some(db_path) = db_path else {
                tracing::warn!("No database configured for stack traces");
                return;
            };
            let result = crate::db::establish_connection_at(&db_path)
                .and_then(|mut conn| crate::db_stack_trace::insert_trace(&mut conn, &trace));
            match result {
                Ok(()) => tracing::debug!("Trace saved to database"),
                Err(e) => tracing::error!("Failed to save stack trace: {:#}", e),
            }
        })
    }
}

fn format_stack(time: &str, message: &str, cause: Option<&str>) -> String {
    let current = thread::current();
    let thread_name = current.name().unwrap_or("<unnamed>");
    let backtrace = std::backtrace::Backtrace::force_capture();

    let mut stack = format!(
        "{}\nthread '{}' panicked at {}:\n{}\n\nstack backtrace:\n{}",
        time,
        thread_name,
        cause.unwrap_or("<unknown>"),
        message,
        backtrace
    );

    let logs = crate::log_capture::recent_logs();
    if !logs.is_empty() {
        stack.push_str("\n\nrecent log:\n");
        stack.push_str(&logs.join("\n"));
    }

    stack
}
