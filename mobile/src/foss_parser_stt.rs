use crate::db_foss::FossStore;
use crate::models::LicenseRecord;
use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;

/// Package name → license. A present key means the package is FOSS,
/// the license may still be empty.
pub type PackageVersions = HashMap<String, String>;

/// Result of parsing the bundled seed resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedParse {
    /// Complete `(package, license)` pairs in document order
    pub entries: Vec<(String, String)>,
    /// Set when parsing stopped early; `entries` holds what came before it
    pub error: Option<String>,
}

/// What `toggle_foss` did
#[derive(Debug)]
pub enum ToggleOutcome {
    /// Package declares itself open source in its manifest; nothing to toggle
    SelfDeclared,
    /// Package was FOSS and an unmark has been queued
    Unmarked(PendingWrite),
    /// A mark with this license has been queued
    Marked { license: String, write: PendingWrite },
    /// Package declares nothing and no license was supplied
    LicenseRequired,
}

/// Queued mark/unmark for the write worker
pub(crate) struct WriteTask {
    pub record: LicenseRecord,
    pub done: Sender<anyhow::Result<()>>,
}

/// Handle for a write submitted to the FOSS write worker.
/// Dropping it leaves the write running in the background.
#[derive(Debug)]
pub struct PendingWrite {
    pub(crate) package_name: String,
    pub(crate) rx: Receiver<anyhow::Result<()>>,
}

/// FOSS status resolver over the bundled seed, the persisted overrides and
/// each package's embedded meta-data.
pub struct FossParser {
    pub(crate) seed: String,
    pub(crate) store: Arc<dyn FossStore>,
    pub(crate) packages: Arc<RwLock<Arc<PackageVersions>>>,
    pub(crate) write_lock: Arc<Mutex<()>>,
    pub(crate) queue: Mutex<Option<Sender<WriteTask>>>,
    pub(crate) worker: Mutex<Option<JoinHandle<()>>>,
}
