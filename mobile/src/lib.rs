pub mod adb;
pub mod android_packagemanager;
pub mod app_op;
pub mod crash_report;
pub mod crash_report_stt;
pub mod db;
pub mod db_foss;
pub mod db_stack_trace;
pub mod foss_parser;
pub mod foss_parser_stt;
pub mod log_capture;
pub mod models;
pub mod package_info;
mod schema;

pub use app_op::AppOp;
pub use crash_report::{CrashReport, PendingCrash};
pub use db_foss::{FossStore, MemoryFossStore, SqliteFossStore};
pub use foss_parser::{FossParser, PendingWrite, ToggleOutcome};
pub use models::LicenseRecord;
pub use package_info::{MetaData, MetaValue, PackageInfo};

use anyhow::{Context, Result};
#[cfg(not(target_os = "android"))]
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Config {
    pub config_dir: PathBuf,
    pub db_dir: PathBuf,
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// adb serial used when none is given on the command line
    #[serde(default)]
    pub device: String,
    #[serde(default = "default_true")]
    pub crash_reporting: bool,
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "Error".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            device: String::new(),
            crash_reporting: true,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        #[cfg(target_os = "android")]
        {
            // Android-specific paths
            let config_dir = PathBuf::from("/data/data/app.simple.inure/files");
            let db_dir = PathBuf::from("/data/data/app.simple.inure/databases");
            let log_dir = PathBuf::from("/data/data/app.simple.inure/files/logs");

            tracing::info!(
                "Android config paths - config_dir: {:?}, db_dir: {:?}, log_dir: {:?}",
                config_dir,
                db_dir,
                log_dir
            );

            Self::from_dirs(config_dir, db_dir, log_dir)
        }

        #[cfg(not(target_os = "android"))]
        {
            let proj_dirs = ProjectDirs::from("app", "simple", "inure")
                .context("Failed to get project directories")?;

            let config_dir = proj_dirs.config_dir().to_path_buf();
            let db_dir = config_dir.join("dbs");
            let log_dir = proj_dirs.data_local_dir().join("logs");

            Self::from_dirs(config_dir, db_dir, log_dir)
        }
    }

    /// Use explicit directories, creating them if they don't exist
    pub fn from_dirs(config_dir: PathBuf, db_dir: PathBuf, log_dir: PathBuf) -> Result<Self> {
        for dir in [&config_dir, &db_dir, &log_dir] {
            fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
        }

        Ok(Config {
            config_dir,
            db_dir,
            log_dir,
        })
    }

    pub fn db_path(&self) -> String {
        self.db_dir
            .join(db::DEFAULT_DB_FILE)
            .to_string_lossy()
            .to_string()
    }

    pub fn load_settings(&self) -> Result<Settings> {
        let settings_path = self.config_dir.join("settings.txt");

        if !settings_path.exists() {
            return Ok(Settings::default());
        }

        let contents =
            fs::read_to_string(&settings_path).context("Failed to read settings file")?;

        let settings: Settings =
            serde_json::from_str(&contents).context("Failed to parse settings JSON")?;

        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let settings_path = self.config_dir.join("settings.txt");

        let json =
            serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;

        fs::write(&settings_path, json).context("Failed to write settings file")?;

        tracing::info!("Settings saved to {:?}", settings_path);
        Ok(())
    }
}

/// Point the database at the config's db file and load the FOSS list.
pub fn init_common(config: &Config) -> Arc<FossParser> {
    let db_path = config.db_path();
    db::set_db_path(db_path.clone());

    let parser = Arc::new(FossParser::new(Arc::new(SqliteFossStore::new(db_path))));
    parser.initialize();
    parser
}

/// Check if a package ID has at least 2 domain levels (e.g., com.example)
pub fn is_valid_package_id(package_id: &str) -> bool {
    package_id.split('.').count() >= 2 && !package_id.split('.').any(str::is_empty)
}
