use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use crate::error::StoreError;
use crate::model::{
    owned_list, Database, Expense, Processing, Trade, DEFAULT_EXPENSE_CATEGORIES,
    DEFAULT_FINISHED_GOODS, DEFAULT_RAW_MATERIALS, DEFAULT_WORKERS,
};
use crate::store::RecordStore;

pub const STORE_FILE: &str = "ecorecycle_db_v1.json";
pub const SETTINGS_FILE: &str = "ecorecycle_settings.json";
pub const DATA_DIR_ENV: &str = "ECORECYCLE_DATA";
const LOCK_FILE: &str = ".ecorecycle.lock";

/// Data directory priority: explicit flag, `ECORECYCLE_DATA`, then the
/// platform data directory.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf, StoreError> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join("ecorecycle"))
        .ok_or(StoreError::NoDataDir)
}

/// Store blob as found on disk. Reference lists written by older versions
/// may be absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDatabase {
    #[serde(default)]
    transactions: Vec<Trade>,
    #[serde(default)]
    processing: Vec<Processing>,
    #[serde(default)]
    expenses: Vec<Expense>,
    #[serde(default)]
    raw_materials: Option<Vec<String>>,
    #[serde(default)]
    finished_goods: Option<Vec<String>>,
    #[serde(default)]
    expense_categories: Option<Vec<String>>,
    #[serde(default)]
    workers: Option<Vec<String>>,
}

impl StoredDatabase {
    fn migrate(self, origin: &Path) -> Database {
        let mut repaired = Vec::new();
        let mut list = |value: Option<Vec<String>>, name: &'static str, defaults: &[&str]| {
            value.unwrap_or_else(|| {
                repaired.push(name);
                owned_list(defaults)
            })
        };
        let db = Database {
            raw_materials: list(self.raw_materials, "rawMaterials", DEFAULT_RAW_MATERIALS),
            finished_goods: list(self.finished_goods, "finishedGoods", DEFAULT_FINISHED_GOODS),
            expense_categories: list(
                self.expense_categories,
                "expenseCategories",
                DEFAULT_EXPENSE_CATEGORIES,
            ),
            workers: list(self.workers, "workers", DEFAULT_WORKERS),
            transactions: self.transactions,
            processing: self.processing,
            expenses: self.expenses,
        };
        if !repaired.is_empty() {
            log::info!(
                "{}: filled missing lists with defaults: {}",
                origin.display(),
                repaired.join(", ")
            );
        }
        db
    }
}

/// Parse a store blob, repairing missing reference lists.
pub fn parse_database(text: &str, origin: &Path) -> Result<Database, StoreError> {
    let stored: StoredDatabase =
        serde_json::from_str(text).map_err(|source| StoreError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
    Ok(stored.migrate(origin))
}

pub fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_FILE)
}

/// Load the store, or the built-in defaults when no store exists yet.
pub fn load_database(data_dir: &Path) -> Result<Database, StoreError> {
    let path = store_path(data_dir);
    match fs::read_to_string(&path) {
        Ok(text) => parse_database(&text, &path),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Database::default()),
        Err(err) => Err(StoreError::io(path, err)),
    }
}

pub fn save_database(data_dir: &Path, db: &Database) -> Result<(), StoreError> {
    write_json_atomic(&store_path(data_dir), db)
}

/// Write a full copy of the store to an arbitrary file.
pub fn write_backup(path: &Path, db: &Database) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(db)?;
    fs::write(path, json).map_err(|err| StoreError::io(path, err))
}

pub fn read_backup(path: &Path) -> Result<Database, StoreError> {
    let text = fs::read_to_string(path).map_err(|err| StoreError::io(path, err))?;
    parse_database(&text, path)
}

/// Serialize `value` next to `path` and rename it into place.
pub(crate) fn write_json_atomic<T: serde::Serialize>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::io(path, io::Error::other("path has no parent")))?;
    fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;

    let json = serde_json::to_string_pretty(value)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = parent.join(format!(".{file_name}.tmp-{}-{nanos}", std::process::id()));
    let written = (|| -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()
    })();
    if let Err(err) = written.and_then(|()| replace_file(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::io(path, err));
    }
    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }
    Ok(())
}

/// On Unix the rename replaces atomically. Windows refuses to rename over an
/// existing file, so remove it first there.
fn replace_file(temp_path: &Path, path: &Path) -> io::Result<()> {
    match fs::rename(temp_path, path) {
        Ok(()) => Ok(()),
        Err(err) => {
            #[cfg(windows)]
            {
                if err.kind() == io::ErrorKind::AlreadyExists
                    || err.kind() == io::ErrorKind::PermissionDenied
                {
                    fs::remove_file(path)?;
                    return fs::rename(temp_path, path);
                }
            }
            Err(err)
        }
    }
}

/// Exclusive lock on the data directory. Released on drop.
#[derive(Debug)]
pub struct StoreLock {
    _file: File,
}

pub fn acquire_store_lock(data_dir: &Path) -> Result<StoreLock, StoreError> {
    use fs2::FileExt;

    fs::create_dir_all(data_dir).map_err(|err| StoreError::io(data_dir, err))?;
    let lock_path = data_dir.join(LOCK_FILE);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|err| StoreError::io(&lock_path, err))?;
    file.try_lock_exclusive()
        .map_err(|_| StoreError::Locked(data_dir.to_path_buf()))?;
    Ok(StoreLock { _file: file })
}

/// A locked data directory with its loaded record store.
#[derive(Debug)]
pub struct Workspace {
    dir: PathBuf,
    pub store: RecordStore,
    _lock: StoreLock,
}

impl Workspace {
    pub fn open(dir: PathBuf) -> Result<Self, StoreError> {
        let lock = acquire_store_lock(&dir)?;
        let db = load_database(&dir)?;
        log::debug!(
            "loaded {} trades, {} conversions, {} expenses from {}",
            db.transactions.len(),
            db.processing.len(),
            db.expenses.len(),
            dir.display()
        );
        Ok(Self {
            dir,
            store: RecordStore::new(db),
            _lock: lock,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist the current snapshot. On failure the in-memory store is kept
    /// as is.
    pub fn save(&self) -> Result<(), StoreError> {
        save_database(&self.dir, self.store.database()).inspect_err(|err| {
            log::warn!("failed to persist store: {err}");
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod tests {
    use super::*;
    use crate::aggregate::summarize;
    use crate::model::{PaymentMethod, ReferenceList, TradeSide};
    use crate::period::{EntryStamp, Period};
    use crate::stock::project_stock;
    use crate::store::{ProcessingDraft, TradeDraft};

    pub(crate) fn create_temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("{prefix}-{}-{nanos}", std::process::id()));
        fs::create_dir_all(&dir).unwrap_or_else(|err| {
            panic!("failed to create temp dir {}: {err}", dir.display());
        });
        dir
    }

    fn stamp(id: i64) -> EntryStamp {
        EntryStamp {
            id_hint: id,
            date: "2024-03-15".to_string(),
            time: "10:00".to_string(),
        }
    }

    #[test]
    fn missing_store_loads_defaults() {
        let dir = create_temp_dir("ecorecycle-empty");
        let db = load_database(&dir).unwrap();
        assert_eq!(db, Database::default());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn round_trip_preserves_stock_and_totals() {
        let dir = create_temp_dir("ecorecycle-roundtrip");
        let mut store = RecordStore::default();
        store
            .add_trade(
                TradeDraft {
                    side: TradeSide::Buy,
                    material: "Bottles (Dirty)".to_string(),
                    qty: 120.0,
                    price: 2.5,
                    client: String::new(),
                    method: PaymentMethod::Cash,
                },
                &stamp(1),
                "Supplier",
            )
            .unwrap();
        store
            .add_processing(
                ProcessingDraft {
                    from: "Bottles (Dirty)".to_string(),
                    qty_in: 100.0,
                    to: "Flakes (Clean)".to_string(),
                    qty_out: 88.5,
                },
                &stamp(2),
            )
            .unwrap();
        store
            .add_trade(
                TradeDraft {
                    side: TradeSide::Sell,
                    material: "Flakes (Clean)".to_string(),
                    qty: 50.0,
                    price: 9.0,
                    client: "Plastmash".to_string(),
                    method: PaymentMethod::Deferred,
                },
                &stamp(3),
                "Supplier",
            )
            .unwrap();
        store.settle(3, "2024-03-15");
        store.add_reference(ReferenceList::Workers, "Sorter 3");

        save_database(&dir, store.database()).unwrap();
        let loaded = load_database(&dir).unwrap();
        assert_eq!(&loaded, store.database());

        let period = Period::month("2024-03").unwrap();
        assert_eq!(project_stock(&loaded), project_stock(store.database()));
        assert_eq!(summarize(&loaded, &period), summarize(store.database(), &period));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_lists_are_repaired_on_read() {
        let blob = r#"{"transactions":[],"processing":[],"expenses":[],"workers":["Solo"],"rawMaterials":null}"#;
        let db = parse_database(blob, Path::new("blob.json")).unwrap();
        assert_eq!(db.workers, vec!["Solo".to_string()]);
        assert_eq!(db.raw_materials, owned_list(DEFAULT_RAW_MATERIALS));
        assert_eq!(db.expense_categories, owned_list(DEFAULT_EXPENSE_CATEGORIES));

        let bare = parse_database("{}", Path::new("blob.json")).unwrap();
        assert_eq!(bare, Database::default());
    }

    #[test]
    fn corrupt_store_is_a_parse_error() {
        let dir = create_temp_dir("ecorecycle-corrupt");
        fs::write(store_path(&dir), "{ not json").unwrap();
        let err = load_database(&dir).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn second_lock_on_same_directory_is_refused() {
        let dir = create_temp_dir("ecorecycle-lock");
        let first = acquire_store_lock(&dir).unwrap();
        let err = acquire_store_lock(&dir).unwrap_err();
        assert!(matches!(err, StoreError::Locked(_)));
        drop(first);
        assert!(acquire_store_lock(&dir).is_ok());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn backup_restores_into_equal_store() {
        let dir = create_temp_dir("ecorecycle-backup");
        let mut db = Database::default();
        db.workers.push("Night guard".to_string());
        let path = dir.join("backup.json");
        write_backup(&path, &db).unwrap();
        assert_eq!(read_backup(&path).unwrap(), db);
        let _ = fs::remove_dir_all(&dir);
    }
}
