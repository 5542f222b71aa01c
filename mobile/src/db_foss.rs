use crate::models::LicenseRecord;
use anyhow::{Context, Result};
use diesel::prelude::*;
use std::collections::HashMap;
use std::sync::Mutex;

/// Persisted FOSS markings keyed by package name.
///
/// Implementations must be usable from the FOSS write worker thread and from
/// whichever thread runs `FossParser::initialize`.
pub trait FossStore: Send + Sync {
    /// Full scan of every stored marking
    fn get_all_foss_markings(&self) -> Result<Vec<LicenseRecord>>;

    /// Insert or replace the marking for `record.package_name`
    fn insert_foss(&self, record: &LicenseRecord) -> Result<()>;
}

/// Get FOSS marking from database by package name
pub fn get_foss_marking(
    conn: &mut SqliteConnection,
    pkg_name: &str,
) -> Result<Option<LicenseRecord>> {
    use crate::schema::foss::dsl::*;

    let result = foss
        .filter(package_name.eq(pkg_name))
        .select(LicenseRecord::as_select())
        .first(conn)
        .optional()
        .context("Failed to query FOSS marking")?;

    Ok(result)
}

/// Get all FOSS markings from database
pub fn get_all_foss_markings(conn: &mut SqliteConnection) -> Result<Vec<LicenseRecord>> {
    use crate::schema::foss::dsl::*;

    let results = foss
        .select(LicenseRecord::as_select())
        .load(conn)
        .context("Failed to query all FOSS markings")?;

    Ok(results)
}

/// Insert or replace the FOSS marking for a package
pub fn insert_foss(conn: &mut SqliteConnection, record: &LicenseRecord) -> Result<()> {
    use crate::schema::foss::dsl::*;

    diesel::replace_into(foss)
        .values(record)
        .execute(conn)
        .with_context(|| format!("Failed to upsert FOSS marking for {}", record.package_name))?;

    tracing::info!(
        "Upserted FOSS marking: {} (is_foss: {}, license: {})",
        record.package_name,
        record.is_foss,
        record.license
    );

    Ok(())
}

/// Delete the FOSS marking for a package
pub fn delete_foss_marking(conn: &mut SqliteConnection, pkg_name: &str) -> Result<usize> {
    use crate::schema::foss::dsl::*;

    let count = diesel::delete(foss.filter(package_name.eq(pkg_name)))
        .execute(conn)
        .context("Failed to delete FOSS marking")?;

    Ok(count)
}

/// [`FossStore`] backed by the SQLite database at `db_path`.
/// Opens a fresh connection per call.
#[derive(Debug, Clone)]
pub struct SqliteFossStore {
    db_path: String,
}

impl SqliteFossStore {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl FossStore for SqliteFossStore {
    fn get_all_foss_markings(&self) -> Result<Vec<LicenseRecord>> {
        let mut conn = crate::db::establish_connection_at(&self.db_path)?;
        get_all_foss_markings(&mut conn)
    }

    fn insert_foss(&self, record: &LicenseRecord) -> Result<()> {
        let mut conn = crate::db::establish_connection_at(&self.db_path)?;
        insert_foss(&mut conn, record)
    }
}

/// In-memory [`FossStore`], for hosts without writable storage and for tests
#[derive(Debug, Default)]
pub struct MemoryFossStore {
    records: Mutex<HashMap<String, LicenseRecord>>,
}

impl MemoryFossStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<LicenseRecord>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.records.lock() {
            for record in records {
                map.insert(record.package_name.clone(), record);
            }
        }
        store
    }

    pub fn get(&self, package_name: &str) -> Option<LicenseRecord> {
        self.records
            .lock()
            .ok()
            .and_then(|map| map.get(package_name).cloned())
    }
}

impl FossStore for MemoryFossStore {
    fn get_all_foss_markings(&self) -> Result<Vec<LicenseRecord>> {
        let map = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("FOSS memory store lock poisoned"))?;
        Ok(map.values().cloned().collect())
    }

    fn insert_foss(&self, record: &LicenseRecord) -> Result<()> {
        let mut map = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("FOSS memory store lock poisoned"))?;
        map.insert(record.package_name.clone(), record.clone());
        Ok(())
    }
}
