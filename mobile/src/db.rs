use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use anyhow::{Context, Result};
use diesel::prelude::*;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub const DEFAULT_DB_FILE: &str = "inure.db";

static DB_PATH: Mutex<Option<String>> = Mutex::new(None);

/// Database files that already had their migrations applied in this process
fn migrated_paths() -> &'static Mutex<HashSet<String>> {
    static MIGRATED: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    MIGRATED.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Set the database path to use for connections
pub fn set_db_path(path: String) {
    if let Ok(mut db_path) = DB_PATH.lock() {
        *db_path = Some(path);
    }
}

/// Database path set through [`set_db_path`], or the default file name
pub fn db_path() -> String {
    DB_PATH
        .lock()
        .ok()
        .and_then(|p| p.clone())
        .unwrap_or_else(|| DEFAULT_DB_FILE.to_string())
}

pub fn establish_connection() -> Result<SqliteConnection> {
    establish_connection_at(&db_path())
}

/// Open a connection to the SQLite file at `path`, running pending migrations
/// the first time the file is opened by this process.
pub fn establish_connection_at(path: &str) -> Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(path)
        .with_context(|| format!("Error connecting to {}", path))?;

    // Enable WAL mode for better concurrent access
    diesel::sql_query("PRAGMA journal_mode=WAL;")
        .execute(&mut conn)
        .ok();

    // Wait for the write worker instead of failing with "database is locked"
    diesel::sql_query("PRAGMA busy_timeout=30000;")
        .execute(&mut conn)
        .ok();

    let mut migrated = migrated_paths()
        .lock()
        .map_err(|_| anyhow::anyhow!("Migration registry lock poisoned"))?;
    if !migrated.contains(path) {
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("Failed to run database migrations: {}", e))?;
        migrated.insert(path.to_string());
        tracing::debug!("Applied migrations to {}", path);
    }

    Ok(conn)
}

/// Flush (delete all records from) the foss table
pub fn flush_foss(conn: &mut SqliteConnection) -> Result<usize> {
    let count = diesel::sql_query("DELETE FROM foss")
        .execute(conn)
        .context("Failed to flush foss table")?;
    tracing::info!("Flushed foss table. Deleted {} rows.", count);
    Ok(count)
}

/// Flush (delete all records from) the stack_traces table
pub fn flush_stack_traces(conn: &mut SqliteConnection) -> Result<usize> {
    let count = diesel::sql_query("DELETE FROM stack_traces")
        .execute(conn)
        .context("Failed to flush stack_traces table")?;
    tracing::info!("Flushed stack_traces table. Deleted {} rows.", count);
    Ok(count)
}
