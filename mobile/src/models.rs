use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// License marking for one package. One row per package name, last write wins.
#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[diesel(table_name = super::schema::foss)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LicenseRecord {
    pub package_name: String,
    pub license: String,
    pub is_foss: bool,
}

/// License value stored for packages that were unmarked
pub const NON_FOSS_LICENSE: &str = "0";

impl LicenseRecord {
    pub fn foss(package_name: &str, license: &str) -> Self {
        Self {
            package_name: package_name.to_string(),
            license: license.to_string(),
            is_foss: true,
        }
    }

    pub fn non_foss(package_name: &str) -> Self {
        Self {
            package_name: package_name.to_string(),
            license: NON_FOSS_LICENSE.to_string(),
            is_foss: false,
        }
    }
}

// crash stack traces
#[derive(Queryable, Selectable, Serialize, Clone, Debug)]
#[diesel(table_name = super::schema::stack_traces)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StackTrace {
    pub id: i32,
    pub trace: String,
    pub message: Option<String>,
    pub cause: Option<String>,
    pub timestamp: i64,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = super::schema::stack_traces)]
pub struct NewStackTrace {
    pub trace: String,
    pub message: Option<String>,
    pub cause: Option<String>,
    pub timestamp: i64,
}
