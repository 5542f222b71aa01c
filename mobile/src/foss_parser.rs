pub use crate::foss_parser_stt::*;
use crate::db_foss::FossStore;
use crate::models::LicenseRecord;
use crate::package_info::PackageInfo;
use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread;

/// Bundled list of known FOSS packages and their licenses
pub const BUNDLED_PACKAGE_VERSIONS: &str = include_str!("../resources/package_versions.xml");

const STRING_TAG: &[u8] = b"string";
const NAME_ATTRIBUTE: &str = "name";

/// Parse a `<resources><string name="pkg">license</string>...</resources>`
/// document. Entries missing the name or the text are skipped. On a malformed
/// document everything parsed before the error is kept.
pub fn parse_package_versions(xml: &str) -> SeedParse {
    let mut parse = SeedParse::default();

    if let Err(e) = read_package_versions(xml, &mut parse.entries) {
        tracing::error!(
            "Stopped parsing package versions after {} entries: {:#}",
            parse.entries.len(),
            e
        );
        parse.error = Some(format!("{:#}", e));
    }

    parse
}

fn read_package_versions(xml: &str, entries: &mut Vec<(String, String)>) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut key: Option<String> = None;
    let mut value: Option<String> = None;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("Malformed XML at byte {}", reader.buffer_position()))?;

        match event {
            Event::Start(e) if e.name().as_ref() == STRING_TAG => {
                key = match e.try_get_attribute(NAME_ATTRIBUTE)? {
                    Some(attr) => Some(attr.unescape_value()?.into_owned()),
                    None => None,
                };
                value = None;
            }
            Event::Text(e) => {
                value = Some(e.unescape()?.into_owned());
            }
            Event::CData(e) => {
                value = Some(String::from_utf8(e.into_inner().into_owned())?);
            }
            Event::End(e) if e.name().as_ref() == STRING_TAG => {
                if let (Some(k), Some(v)) = (key.take(), value.take()) {
                    entries.push((k, v));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

fn apply_record(packages: &mut PackageVersions, record: LicenseRecord) {
    if record.is_foss {
        packages.insert(record.package_name, record.license);
    } else {
        packages.remove(&record.package_name);
    }
}

fn read_snapshot(packages: &RwLock<Arc<PackageVersions>>) -> Arc<PackageVersions> {
    packages
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

fn publish(packages: &RwLock<Arc<PackageVersions>>, next: PackageVersions) {
    *packages.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
}

/// Apply one mark/unmark to the mapping, then persist it. Runs on the write worker.
fn apply_write(
    packages: &RwLock<Arc<PackageVersions>>,
    write_lock: &Mutex<()>,
    store: &dyn FossStore,
    record: &LicenseRecord,
) -> Result<()> {
    let _guard = write_lock.lock().unwrap_or_else(PoisonError::into_inner);

    let mut next = (*read_snapshot(packages)).clone();
    apply_record(&mut next, record.clone());
    publish(packages, next);

    store.insert_foss(record)
}

impl PendingWrite {
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Block until the worker has applied and persisted the write
    pub fn wait(self) -> Result<()> {
        self.rx.recv().map_err(|_| {
            anyhow::anyhow!(
                "FOSS write worker stopped before writing {}",
                self.package_name
            )
        })?
    }
}

impl FossParser {
    /// Resolver seeded with the bundled package list
    pub fn new(store: Arc<dyn FossStore>) -> Self {
        Self::with_seed(BUNDLED_PACKAGE_VERSIONS, store)
    }

    pub fn with_seed(seed: impl Into<String>, store: Arc<dyn FossStore>) -> Self {
        let parser = Self {
            seed: seed.into(),
            store,
            packages: Arc::new(RwLock::new(Arc::new(HashMap::new()))),
            write_lock: Arc::new(Mutex::new(())),
            queue: Mutex::new(None),
            worker: Mutex::new(None),
        };
        parser.start_worker();
        parser
    }

    fn start_worker(&self) {
        let (tx, rx) = channel::<WriteTask>();
        let packages = self.packages.clone();
        let write_lock = self.write_lock.clone();
        let store = self.store.clone();

        let spawned = thread::Builder::new()
            .name("foss-writer".to_string())
            .spawn(move || Self::run_worker(rx, packages, write_lock, store));

        match spawned {
            Ok(handle) => {
                if let Ok(mut queue) = self.queue.lock() {
                    *queue = Some(tx);
                }
                if let Ok(mut worker) = self.worker.lock() {
                    *worker = Some(handle);
                }
            }
            Err(e) => {
                log::error!("Failed to start FOSS write worker: {}", e);
            }
        }
    }

    fn run_worker(
        rx: Receiver<WriteTask>,
        packages: Arc<RwLock<Arc<PackageVersions>>>,
        write_lock: Arc<Mutex<()>>,
        store: Arc<dyn FossStore>,
    ) {
        log::info!("FOSS write worker started");

        for task in rx {
            let result = apply_write(&packages, &write_lock, store.as_ref(), &task.record);
            match &result {
                Ok(()) => {
                    log::debug!(
                        "Saved FOSS marking for {} (is_foss: {})",
                        task.record.package_name,
                        task.record.is_foss
                    );
                }
                Err(e) => {
                    log::error!(
                        "Failed to save FOSS marking for {}: {:#}",
                        task.record.package_name,
                        e
                    );
                }
            }
            // The caller may have dropped its PendingWrite
            let _ = task.done.send(result);
        }

        log::info!("FOSS write worker stopped");
    }

    /// Rebuild the mapping from the seed list, then replay every persisted
    /// marking on top of it. Replaces whatever was loaded before.
    pub fn initialize(&self) {
        let seed = parse_package_versions(&self.seed);
        let seed_count = seed.entries.len();
        let mut packages: PackageVersions = seed.entries.into_iter().collect();

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        match self.store.get_all_foss_markings() {
            Ok(records) => {
                let count = records.len();
                for record in records {
                    apply_record(&mut packages, record);
                }
                tracing::debug!("Applied {} persisted FOSS markings", count);
            }
            Err(e) => {
                tracing::error!(
                    "Failed to read FOSS markings, using the bundled list only: {:#}",
                    e
                );
            }
        }

        let total = packages.len();
        publish(&self.packages, packages);

        tracing::info!(
            "FOSS list initialized: {} bundled entries, {} FOSS packages",
            seed_count,
            total
        );
    }

    /// Current package → license mapping
    pub fn snapshot(&self) -> Arc<PackageVersions> {
        read_snapshot(&self.packages)
    }

    /// Listed in the mapping, or self-declared open source
    pub fn is_foss(&self, info: &PackageInfo) -> bool {
        self.snapshot().contains_key(&info.package_name) || info.declares_open_source()
    }

    /// Self-declared open source, regardless of the mapping
    pub fn is_embedded_foss(&self, info: &PackageInfo) -> bool {
        info.declares_open_source()
    }

    /// Mapped license when present and non-empty, else the declared one
    pub fn get_license(&self, info: &PackageInfo) -> Option<String> {
        match self.snapshot().get(&info.package_name) {
            Some(license) if !license.is_empty() => Some(license.clone()),
            _ => info.declared_license().map(str::to_string),
        }
    }

    /// `true` when no bundled or persisted entry exists, so the user has to
    /// decide the package's status manually.
    pub fn is_user_overridden(&self, package_name: &str) -> bool {
        !self.snapshot().contains_key(package_name)
    }

    pub fn mark_foss(&self, package_name: &str, license: &str) -> Result<PendingWrite> {
        self.submit(LicenseRecord::foss(package_name, license))
    }

    pub fn unmark_foss(&self, package_name: &str) -> Result<PendingWrite> {
        self.submit(LicenseRecord::non_foss(package_name))
    }

    fn submit(&self, record: LicenseRecord) -> Result<PendingWrite> {
        let (done, rx) = channel();
        let package_name = record.package_name.clone();

        let queue = self
            .queue
            .lock()
            .map_err(|_| anyhow::anyhow!("FOSS write queue lock poisoned"))?;
        let tx = queue.as_ref().context("FOSS write worker is not running")?;
        tx.send(WriteTask { record, done })
            .map_err(|_| anyhow::anyhow!("FOSS write worker stopped"))?;

        Ok(PendingWrite { package_name, rx })
    }

    /// Flip a package between FOSS and non-FOSS. Packages that are neither
    /// listed nor self-declared need a license from the caller.
    pub fn toggle_foss(&self, info: &PackageInfo, license: Option<&str>) -> Result<ToggleOutcome> {
        if self.is_embedded_foss(info) {
            return Ok(ToggleOutcome::SelfDeclared);
        }

        if self.is_foss(info) {
            return Ok(ToggleOutcome::Unmarked(self.unmark_foss(&info.package_name)?));
        }

        match license {
            Some(license) => Ok(ToggleOutcome::Marked {
                license: license.to_string(),
                write: self.mark_foss(&info.package_name, license)?,
            }),
            None => Ok(ToggleOutcome::LicenseRequired),
        }
    }

    /// Keep only FOSS packages, preserving order
    pub fn filter_foss<'a>(&self, packages: &'a [PackageInfo]) -> Vec<&'a PackageInfo> {
        let mapping = self.snapshot();
        packages
            .iter()
            .filter(|p| mapping.contains_key(&p.package_name) || p.declares_open_source())
            .collect()
    }
}

impl Drop for FossParser {
    fn drop(&mut self) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.take();
        }
        if let Ok(mut worker) = self.worker.lock() {
            if let Some(handle) = worker.take() {
                if handle.join().is_err() {
                    log::warn!("FOSS write worker panicked");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_foss::{MemoryFossStore, SqliteFossStore};
    use crate::package_info::{MetaData, MetaValue, OPEN_SOURCE, OPEN_SOURCE_LICENSE};

    const SEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
    <string name="com.foo">MIT</string>
    <string name="org.example.notes">GPL-3.0-only</string>
    <string name="net.example.reader">Apache-2.0</string>
</resources>"#;

    struct FailingStore;

    impl FossStore for FailingStore {
        fn get_all_foss_markings(&self) -> Result<Vec<LicenseRecord>> {
            Err(anyhow::anyhow!("disk I/O error"))
        }

        fn insert_foss(&self, _record: &LicenseRecord) -> Result<()> {
            Err(anyhow::anyhow!("disk I/O error"))
        }
    }

    fn parser_with(records: Vec<LicenseRecord>) -> (FossParser, Arc<MemoryFossStore>) {
        let store = Arc::new(MemoryFossStore::with_records(records));
        let parser = FossParser::with_seed(SEED, store.clone());
        parser.initialize();
        (parser, store)
    }

    fn self_declared(package_name: &str, license: Option<&str>) -> PackageInfo {
        let mut meta = MetaData::new().with(OPEN_SOURCE, MetaValue::Bool(true));
        if let Some(license) = license {
            meta.insert(OPEN_SOURCE_LICENSE, MetaValue::Str(license.to_string()));
        }
        PackageInfo::with_meta_data(package_name, meta)
    }

    #[test]
    fn test_parse_package_versions() {
        let parse = parse_package_versions(SEED);
        assert_eq!(parse.error, None);
        assert_eq!(
            parse.entries,
            vec![
                ("com.foo".to_string(), "MIT".to_string()),
                ("org.example.notes".to_string(), "GPL-3.0-only".to_string()),
                ("net.example.reader".to_string(), "Apache-2.0".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_skips_incomplete_entries() {
        let xml = r#"<resources>
            <string>NoName</string>
            <string name="com.empty"></string>
            <string name="com.selfclosing"/>
            <string name="com.ok">BSD-3-Clause</string>
            <string name="com.cdata"><![CDATA[GPL-2.0 & later]]></string>
            <string name="com.escaped">A &amp; B</string>
        </resources>"#;

        let parse = parse_package_versions(xml);
        assert_eq!(parse.error, None);
        assert_eq!(
            parse.entries,
            vec![
                ("com.ok".to_string(), "BSD-3-Clause".to_string()),
                ("com.cdata".to_string(), "GPL-2.0 & later".to_string()),
                ("com.escaped".to_string(), "A & B".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_keeps_entries_before_error() {
        let xml = r#"<resources>
            <string name="com.first">MIT</string>
            <string name="com.second">GPL-3.0-only</wrong>
            <string name="com.third">Apache-2.0</string>
        </resources>"#;

        let parse = parse_package_versions(xml);
        assert!(parse.error.is_some());
        assert_eq!(parse.entries, vec![("com.first".to_string(), "MIT".to_string())]);
    }

    #[test]
    fn test_bundled_seed_parses() {
        let parse = parse_package_versions(BUNDLED_PACKAGE_VERSIONS);
        assert_eq!(parse.error, None);
        assert!(parse
            .entries
            .iter()
            .any(|(name, license)| name == "org.fdroid.fdroid" && license == "GPL-3.0-or-later"));
    }

    #[test]
    fn test_seed_packages_are_foss() {
        let (parser, _store) = parser_with(vec![]);

        for (name, license) in parse_package_versions(SEED).entries {
            let info = PackageInfo::new(&name);
            assert!(parser.is_foss(&info), "{} should be FOSS", name);
            assert_eq!(parser.get_license(&info), Some(license));
            assert!(!parser.is_user_overridden(&name));
        }
    }

    #[test]
    fn test_override_suppresses_seed_entry() {
        let (parser, _store) = parser_with(vec![LicenseRecord::non_foss("com.foo")]);

        let bare = PackageInfo::new("com.foo");
        assert!(!parser.is_foss(&bare));
        assert_eq!(parser.is_foss(&bare), parser.is_embedded_foss(&bare));
        assert_eq!(parser.get_license(&bare), None);
        assert!(parser.is_user_overridden("com.foo"));

        // Only the package's own declaration is left
        let declared = self_declared("com.foo", Some("MIT"));
        assert!(parser.is_foss(&declared));
        assert_eq!(parser.is_foss(&declared), parser.is_embedded_foss(&declared));
        assert_eq!(parser.get_license(&declared), Some("MIT".to_string()));
    }

    #[test]
    fn test_override_adds_and_replaces() {
        let (parser, _store) = parser_with(vec![
            LicenseRecord::foss("com.foo", "MIT-0"),
            LicenseRecord::foss("io.user.added", "Unlicense"),
        ]);

        assert_eq!(
            parser.get_license(&PackageInfo::new("com.foo")),
            Some("MIT-0".to_string())
        );
        assert!(parser.is_foss(&PackageInfo::new("io.user.added")));
        assert_eq!(parser.snapshot().len(), 4);
    }

    #[test]
    fn test_empty_license_falls_back_to_meta_data() {
        let (parser, _store) = parser_with(vec![LicenseRecord::foss("com.bar", "")]);

        let meta = MetaData::new().with(OPEN_SOURCE_LICENSE, MetaValue::Str("Apache-2.0".to_string()));
        let info = PackageInfo::with_meta_data("com.bar", meta);

        // Known FOSS, license taken from the manifest
        assert!(parser.is_foss(&info));
        assert!(!parser.is_user_overridden("com.bar"));
        assert_eq!(parser.get_license(&info), Some("Apache-2.0".to_string()));

        // Known FOSS, license unknown
        let bare = PackageInfo::new("com.bar");
        assert!(parser.is_foss(&bare));
        assert_eq!(parser.get_license(&bare), None);
    }

    #[test]
    fn test_unknown_package() {
        let (parser, _store) = parser_with(vec![]);
        let info = PackageInfo::new("com.closed.source");

        assert!(!parser.is_foss(&info));
        assert!(!parser.is_embedded_foss(&info));
        assert_eq!(parser.get_license(&info), None);
        assert!(parser.is_user_overridden("com.closed.source"));
    }

    #[test]
    fn test_embedded_foss_ignores_mapping() {
        let (parser, _store) = parser_with(vec![]);
        assert!(!parser.is_embedded_foss(&PackageInfo::new("com.foo")));
        assert!(parser.is_embedded_foss(&self_declared("com.unlisted", None)));
        assert!(parser.is_foss(&self_declared("com.unlisted", None)));
    }

    #[test]
    fn test_mark_then_get_license() {
        let (parser, store) = parser_with(vec![]);

        parser.mark_foss("io.example.app", "MPL-2.0").unwrap().wait().unwrap();

        let info = PackageInfo::new("io.example.app");
        assert!(parser.is_foss(&info));
        assert_eq!(parser.get_license(&info), Some("MPL-2.0".to_string()));
        assert_eq!(
            store.get("io.example.app"),
            Some(LicenseRecord::foss("io.example.app", "MPL-2.0"))
        );
    }

    #[test]
    fn test_unmark_then_user_overridden() {
        let (parser, store) = parser_with(vec![]);

        parser.mark_foss("io.example.app", "MPL-2.0").unwrap().wait().unwrap();
        parser.unmark_foss("io.example.app").unwrap().wait().unwrap();

        assert!(parser.is_user_overridden("io.example.app"));
        assert!(!parser.is_foss(&PackageInfo::new("io.example.app")));
        let record = store.get("io.example.app").unwrap();
        assert!(!record.is_foss);
        assert_eq!(record.license, "0");
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (parser, _store) = parser_with(vec![
            LicenseRecord::non_foss("org.example.notes"),
            LicenseRecord::foss("io.user.added", "ISC"),
        ]);

        let first = parser.snapshot();
        parser.initialize();
        let second = parser.snapshot();

        assert_eq!(*first, *second);
    }

    #[test]
    fn test_initialize_replays_persisted_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foss.db").to_string_lossy().to_string();

        {
            let parser = FossParser::with_seed(SEED, Arc::new(SqliteFossStore::new(path.clone())));
            parser.initialize();
            parser.mark_foss("io.example.app", "EUPL-1.2").unwrap().wait().unwrap();
            parser.unmark_foss("com.foo").unwrap().wait().unwrap();
        }

        let parser = FossParser::with_seed(SEED, Arc::new(SqliteFossStore::new(path)));
        assert!(parser.snapshot().is_empty());
        parser.initialize();

        assert_eq!(
            parser.get_license(&PackageInfo::new("io.example.app")),
            Some("EUPL-1.2".to_string())
        );
        assert!(!parser.is_foss(&PackageInfo::new("com.foo")));
        assert!(parser.is_foss(&PackageInfo::new("net.example.reader")));
    }

    #[test]
    fn test_store_failures_are_surfaced() {
        let parser = FossParser::with_seed(SEED, Arc::new(FailingStore));

        // Read failure leaves the bundled list in place
        parser.initialize();
        assert_eq!(parser.snapshot().len(), 3);

        // Write failure reaches the caller, the in-memory update still lands
        let result = parser.mark_foss("io.example.app", "MIT").unwrap().wait();
        assert!(result.is_err());
        assert!(parser.is_foss(&PackageInfo::new("io.example.app")));
    }

    #[test]
    fn test_toggle_foss() {
        let (parser, _store) = parser_with(vec![]);

        let listed = PackageInfo::new("com.foo");
        match parser.toggle_foss(&listed, None).unwrap() {
            ToggleOutcome::Unmarked(write) => {
                assert_eq!(write.package_name(), "com.foo");
                write.wait().unwrap();
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(!parser.is_foss(&listed));

        assert!(matches!(
            parser.toggle_foss(&listed, None).unwrap(),
            ToggleOutcome::LicenseRequired
        ));

        match parser.toggle_foss(&listed, Some("0BSD")).unwrap() {
            ToggleOutcome::Marked { license, write } => {
                assert_eq!(license, "0BSD");
                write.wait().unwrap();
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(parser.get_license(&listed), Some("0BSD".to_string()));

        assert!(matches!(
            parser
                .toggle_foss(&self_declared("com.declared", Some("MIT")), None)
                .unwrap(),
            ToggleOutcome::SelfDeclared
        ));
    }

    #[test]
    fn test_filter_foss() {
        let (parser, _store) = parser_with(vec![]);
        let packages = vec![
            PackageInfo::new("com.closed"),
            PackageInfo::new("net.example.reader"),
            self_declared("com.declared", None),
            PackageInfo::new("com.other"),
        ];

        let names: Vec<&str> = parser
            .filter_foss(&packages)
            .into_iter()
            .map(|p| p.package_name.as_str())
            .collect();
        assert_eq!(names, vec!["net.example.reader", "com.declared"]);
    }

    #[test]
    fn test_concurrent_reads_during_writes() {
        let (parser, _store) = parser_with(vec![]);
        let parser = Arc::new(parser);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let parser = parser.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        // Seed entries stay visible through every swap
                        assert!(parser.is_foss(&PackageInfo::new("org.example.notes")));
                    }
                })
            })
            .collect();

        let writes: Vec<PendingWrite> = (0..50)
            .map(|i| parser.mark_foss(&format!("io.example.app{}", i), "MIT").unwrap())
            .collect();
        for write in writes {
            write.wait().unwrap();
        }
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(parser.snapshot().len(), 53);
    }

    #[test]
    fn test_initialize_between_queued_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foss.db").to_string_lossy().to_string();
        let parser = Arc::new(FossParser::with_seed(
            SEED,
            Arc::new(SqliteFossStore::new(path)),
        ));
        parser.initialize();

        let reloader = {
            let parser = parser.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    parser.initialize();
                }
            })
        };

        let writes: Vec<PendingWrite> = (0..30)
            .map(|i| parser.mark_foss(&format!("io.example.app{}", i), "MIT").unwrap())
            .collect();
        let unmark = parser.unmark_foss("com.foo").unwrap();
        for write in writes {
            write.wait().unwrap();
        }
        unmark.wait().unwrap();
        reloader.join().unwrap();

        let snapshot = parser.snapshot();
        for i in 0..30 {
            assert_eq!(
                snapshot.get(&format!("io.example.app{}", i)).map(String::as_str),
                Some("MIT")
            );
        }
        assert!(!snapshot.contains_key("com.foo"));
        assert_eq!(snapshot.len(), 32);

        // A fresh reload from the database agrees with the live mapping
        parser.initialize();
        assert_eq!(*parser.snapshot(), *snapshot);
    }

    #[test]
    fn test_removed_markings_restore_bundled_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foss.db").to_string_lossy().to_string();
        let parser = FossParser::with_seed(SEED, Arc::new(SqliteFossStore::new(path.clone())));
        parser.initialize();

        parser.unmark_foss("com.foo").unwrap().wait().unwrap();
        parser.unmark_foss("org.example.notes").unwrap().wait().unwrap();
        parser.mark_foss("io.example.app", "MIT").unwrap().wait().unwrap();
        assert_eq!(parser.snapshot().len(), 2);

        let conn = &mut crate::db::establish_connection_at(&path).unwrap();
        assert_eq!(crate::db_foss::delete_foss_marking(conn, "com.foo").unwrap(), 1);
        parser.initialize();
        assert!(parser.is_foss(&PackageInfo::new("com.foo")));
        assert!(!parser.is_foss(&PackageInfo::new("org.example.notes")));

        assert_eq!(crate::db::flush_foss(conn).unwrap(), 2);
        parser.initialize();
        assert_eq!(parser.snapshot().len(), 3);
        assert!(!parser.is_foss(&PackageInfo::new("io.example.app")));
    }

    #[test]
    fn test_dropped_pending_write_still_lands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foss.db").to_string_lossy().to_string();
        {
            let parser = FossParser::with_seed(SEED, Arc::new(SqliteFossStore::new(path.clone())));
            parser.initialize();
            drop(parser.mark_foss("io.example.app", "GPL-3.0-only").unwrap());
        }

        let conn = &mut crate::db::establish_connection_at(&path).unwrap();
        assert_eq!(
            crate::db_foss::get_foss_marking(conn, "io.example.app").unwrap(),
            Some(LicenseRecord::foss("io.example.app", "GPL-3.0-only"))
        );
    }
}
