//! Persistent dataset cache
//!
//! Keeps the raw dataset bytes between sessions so the download happens at
//! most once per device. Cache failures are never fatal: a broken store
//! reads as "absent" and a failed write only costs a re-download next time.

use async_trait::async_trait;
use directories::ProjectDirs;
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{LexiconError, Result};

pub const STORE_NAME: &str = "mk-dictionary-cache";
pub const STORE_VERSION: i32 = 1;
/// Key the dataset bytes are stored under
pub const DATASET_KEY: &str = "msd-mk.sqlite";

/// Storage for the dataset bytes
#[async_trait]
pub trait DatasetCache: Send + Sync {
    /// Stored bytes, or `None` if never stored or the store is unusable
    async fn load(&self) -> Option<Vec<u8>>;

    /// Persist the bytes; callers treat failure as non-fatal
    async fn save(&self, bytes: Vec<u8>) -> Result<()>;
}

/// Cache that never holds anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

#[async_trait]
impl DatasetCache for NoCache {
    async fn load(&self) -> Option<Vec<u8>> {
        None
    }

    async fn save(&self, _bytes: Vec<u8>) -> Result<()> {
        Ok(())
    }
}

/// SQLite-backed key/value blob store
///
/// The file is opened on first use and the connection reused afterwards.
#[derive(Clone)]
pub struct BlobCache {
    store: Arc<BlobStore>,
}

struct BlobStore {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl BlobCache {
    /// Store inside `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(format!("{}.db", STORE_NAME));
        Self {
            store: Arc::new(BlobStore {
                path,
                conn: Mutex::new(None),
            }),
        }
    }

    /// Store in the platform cache directory
    pub fn default_location() -> Option<Self> {
        let dirs = ProjectDirs::from("mk", "msd", "mkdict")?;
        Some(Self::new(dirs.cache_dir()))
    }

    pub fn path(&self) -> &Path {
        &self.store.path
    }

    /// Blocking read of one key
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.store.with_conn(|conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM files WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, Vec<u8>>(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    /// Blocking write of one key
    pub fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.store.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO files (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
            Ok(())
        })
    }
}

impl BlobStore {
    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut guard = self.conn.lock().unwrap();
        if guard.is_none() {
            *guard = Some(open_store(&self.path)?);
        }
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(LexiconError::Cache("store not open".to_string())),
        }
    }
}

/// Open the store file and bring its schema to `STORE_VERSION`
fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version > STORE_VERSION {
        return Err(LexiconError::Cache(format!(
            "store version {} is newer than supported version {}",
            version, STORE_VERSION
        )));
    }

    if version < STORE_VERSION {
        if version > 0 {
            info!(
                "[Cache] Resetting store from version {} to {}",
                version, STORE_VERSION
            );
        }
        conn.execute_batch("DROP TABLE IF EXISTS files;")?;
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS files (
            key TEXT PRIMARY KEY,
            value BLOB NOT NULL
        );
        "#,
    )?;
    conn.pragma_update(None, "user_version", STORE_VERSION)?;

    debug!("[Cache] Opened store at {}", path.display());
    Ok(conn)
}

#[async_trait]
impl DatasetCache for BlobCache {
    async fn load(&self) -> Option<Vec<u8>> {
        let cache = self.clone();
        match tokio::task::spawn_blocking(move || cache.get(DATASET_KEY)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                warn!("[Cache] Could not read cached dataset: {}", e);
                None
            }
            Err(e) => {
                warn!("[Cache] Cache read task failed: {}", e);
                None
            }
        }
    }

    async fn save(&self, bytes: Vec<u8>) -> Result<()> {
        let cache = self.clone();
        tokio::task::spawn_blocking(move || cache.put(DATASET_KEY, &bytes))
            .await
            .map_err(|e| LexiconError::Cache(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_never_written_store_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let cache = BlobCache::new(temp_dir.path());
        assert_eq!(cache.load().await, None);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let cache = BlobCache::new(temp_dir.path());
        let bytes: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();

        cache.save(bytes.clone()).await.unwrap();
        assert_eq!(cache.load().await, Some(bytes.clone()));

        // A second handle on the same directory sees the same bytes
        let reopened = BlobCache::new(temp_dir.path());
        assert_eq!(reopened.load().await, Some(bytes));
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let cache = BlobCache::new(temp_dir.path());
        cache.save(vec![1, 2, 3]).await.unwrap();
        cache.save(vec![4, 5]).await.unwrap();
        assert_eq!(cache.load().await, Some(vec![4, 5]));
    }

    #[tokio::test]
    async fn test_unopenable_store_reads_as_absent() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the store directory should be
        let blocker = temp_dir.path().join("blocked");
        std::fs::write(&blocker, b"file").unwrap();

        let cache = BlobCache::new(blocker.join("nested"));
        assert_eq!(cache.load().await, None);
        assert!(cache.save(vec![1]).await.is_err());
    }

    #[test]
    fn test_missing_table_is_recreated() {
        let temp_dir = TempDir::new().unwrap();
        let cache = BlobCache::new(temp_dir.path());
        cache.put(DATASET_KEY, b"abc").unwrap();

        {
            let conn = Connection::open(cache.path()).unwrap();
            conn.execute_batch("DROP TABLE files;").unwrap();
        }

        let fresh = BlobCache::new(temp_dir.path());
        assert_eq!(fresh.get(DATASET_KEY).unwrap(), None);
        fresh.put(DATASET_KEY, b"xyz").unwrap();
        assert_eq!(fresh.get(DATASET_KEY).unwrap(), Some(b"xyz".to_vec()));
    }

    #[test]
    fn test_old_version_is_reset() {
        let temp_dir = TempDir::new().unwrap();
        let cache = BlobCache::new(temp_dir.path());
        cache.put(DATASET_KEY, b"stale").unwrap();

        {
            let conn = Connection::open(cache.path()).unwrap();
            conn.pragma_update(None, "user_version", 0).unwrap();
        }

        let upgraded = BlobCache::new(temp_dir.path());
        assert_eq!(upgraded.get(DATASET_KEY).unwrap(), None);
    }

    #[test]
    fn test_newer_version_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let cache = BlobCache::new(temp_dir.path());
        cache.put(DATASET_KEY, b"data").unwrap();

        {
            let conn = Connection::open(cache.path()).unwrap();
            conn.pragma_update(None, "user_version", STORE_VERSION + 1).unwrap();
        }

        let older_app = BlobCache::new(temp_dir.path());
        assert!(matches!(
            older_app.get(DATASET_KEY),
            Err(LexiconError::Cache(_))
        ));
    }

    #[tokio::test]
    async fn test_no_cache() {
        let cache = NoCache;
        cache.save(vec![1, 2, 3]).await.unwrap();
        assert_eq!(cache.load().await, None);
    }
}
