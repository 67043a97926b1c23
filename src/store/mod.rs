//! Flat-file record store.
//!
//! Every collection lives in its own pretty-printed JSON array under the data
//! directory and is rewritten in full on each commit. Each collection has its own
//! async mutex: a [`TableGuard`] holds it for the whole read-modify-write cycle, so
//! two operations touching the same collection never interleave. Operations that
//! lock several collections take them in declaration order of [`RecordStore`]
//! (products, warehouses, stock, transfers, alerts).

use crate::config::AppConfig;
use crate::models::{AlertItem, Product, StockItem, Transfer, Warehouse};
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed collection {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode collection {collection}: {source}")]
    Encode {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("data directory {} is not usable: {source}", path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A record persisted in one of the store's collections.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// File stem of the collection, e.g. `stock` for `stock.json`.
    const COLLECTION: &'static str;

    fn id(&self) -> i64;

    fn table(store: &RecordStore) -> &Table<Self>;
}

impl Record for Product {
    const COLLECTION: &'static str = "products";

    fn id(&self) -> i64 {
        self.id
    }

    fn table(store: &RecordStore) -> &Table<Self> {
        &store.products
    }
}

impl Record for Warehouse {
    const COLLECTION: &'static str = "warehouses";

    fn id(&self) -> i64 {
        self.id
    }

    fn table(store: &RecordStore) -> &Table<Self> {
        &store.warehouses
    }
}

impl Record for StockItem {
    const COLLECTION: &'static str = "stock";

    fn id(&self) -> i64 {
        self.id
    }

    fn table(store: &RecordStore) -> &Table<Self> {
        &store.stock
    }
}

impl Record for Transfer {
    const COLLECTION: &'static str = "transfers";

    fn id(&self) -> i64 {
        self.id
    }

    fn table(store: &RecordStore) -> &Table<Self> {
        &store.transfers
    }
}

impl Record for AlertItem {
    const COLLECTION: &'static str = "alerts";

    fn id(&self) -> i64 {
        self.id
    }

    fn table(store: &RecordStore) -> &Table<Self> {
        &store.alerts
    }
}

/// Next id for a collection: one past the largest existing id, or 1 when empty.
pub fn next_id<T: Record>(rows: &[T]) -> i64 {
    rows.iter().map(Record::id).max().map_or(1, |max| max + 1)
}

/// One JSON collection file plus the lock serializing access to it.
pub struct Table<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Table<T> {
    fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(format!("{}.json", T::COLLECTION)),
            lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the collection for read-only use.
    pub async fn load(&self) -> Result<Vec<T>, StoreError> {
        let _permit = self.lock.lock().await;
        read_collection(&self.path).await
    }

    /// Replaces the whole collection.
    pub async fn save(&self, rows: &[T]) -> Result<(), StoreError> {
        let _permit = self.lock.lock().await;
        write_collection(&self.path, rows).await
    }

    /// Locks the collection and loads it for a read-modify-write cycle. The lock
    /// is held until the guard is committed or dropped.
    pub async fn lock(&self) -> Result<TableGuard<'_, T>, StoreError> {
        let permit = self.lock.lock().await;
        let rows = read_collection(&self.path).await?;
        Ok(TableGuard {
            _permit: permit,
            path: &self.path,
            rows,
        })
    }
}

/// Exclusive, loaded view of a collection. Mutations only reach disk on
/// [`TableGuard::commit`]; dropping the guard discards them.
pub struct TableGuard<'a, T> {
    _permit: MutexGuard<'a, ()>,
    path: &'a Path,
    rows: Vec<T>,
}

impl<'a, T: Record> TableGuard<'a, T> {
    pub fn next_id(&self) -> i64 {
        next_id(&self.rows)
    }

    pub fn find(&self, id: i64) -> Option<&T> {
        self.rows.iter().find(|row| row.id() == id)
    }

    pub fn find_mut(&mut self, id: i64) -> Option<&mut T> {
        self.rows.iter_mut().find(|row| row.id() == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.find(id).is_some()
    }

    /// Builds a record with the next free id and appends it.
    pub fn insert_with(&mut self, build: impl FnOnce(i64) -> T) -> &T {
        let id = self.next_id();
        self.rows.push(build(id));
        &self.rows[self.rows.len() - 1]
    }

    pub fn remove(&mut self, id: i64) -> Option<T> {
        let index = self.rows.iter().position(|row| row.id() == id)?;
        Some(self.rows.remove(index))
    }

    /// Writes the collection back and releases the lock.
    pub async fn commit(self) -> Result<(), StoreError> {
        write_collection(self.path, &self.rows).await
    }
}

impl<T> Deref for TableGuard<'_, T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.rows
    }
}

impl<T> DerefMut for TableGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.rows
    }
}

/// The five collections backing the dashboard.
pub struct RecordStore {
    data_dir: PathBuf,
    pub products: Table<Product>,
    pub warehouses: Table<Warehouse>,
    pub stock: Table<StockItem>,
    pub transfers: Table<Transfer>,
    pub alerts: Table<AlertItem>,
}

impl RecordStore {
    /// Opens a store rooted at `data_dir`, creating the directory if needed.
    /// Collection files are created lazily on first commit.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|source| StoreError::DataDir {
                path: data_dir.clone(),
                source,
            })?;

        info!(data_dir = %data_dir.display(), "Record store opened");

        Ok(Self {
            products: Table::new(&data_dir),
            warehouses: Table::new(&data_dir),
            stock: Table::new(&data_dir),
            transfers: Table::new(&data_dir),
            alerts: Table::new(&data_dir),
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub async fn load<T: Record>(&self) -> Result<Vec<T>, StoreError> {
        T::table(self).load().await
    }

    pub async fn save<T: Record>(&self, rows: &[T]) -> Result<(), StoreError> {
        T::table(self).save(rows).await
    }

    /// Verifies the data directory is still reachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let metadata = tokio::fs::metadata(&self.data_dir)
            .await
            .map_err(|source| StoreError::DataDir {
                path: self.data_dir.clone(),
                source,
            })?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(StoreError::DataDir {
                path: self.data_dir.clone(),
                source: std::io::Error::new(ErrorKind::Other, "not a directory"),
            })
        }
    }
}

/// Opens the record store configured in `cfg`.
pub async fn open_from_app_config(cfg: &AppConfig) -> Result<RecordStore, StoreError> {
    RecordStore::open(&cfg.data_dir).await
}

async fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&raw).map_err(|source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_collection<T: Record>(path: &Path, rows: &[T]) -> Result<(), StoreError> {
    let mut body = serde_json::to_string_pretty(rows).map_err(|source| StoreError::Encode {
        collection: T::COLLECTION,
        source,
    })?;
    body.push('\n');

    // Write beside the target and rename so readers never observe a partial file.
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, body)
        .await
        .map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(collection = T::COLLECTION, rows = rows.len(), "Collection written");
    Ok(())
}
