use crate::domain::ports::SessionStore;
use crate::domain::session::{SessionKey, SessionSnapshot};
use crate::error::{PortalError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family for storing session snapshots.
pub const CF_SESSIONS: &str = "sessions";

/// A persistent session store implementation using RocksDB.
///
/// Snapshots are stored as JSON under `SessionKey::storage_key`, so sessions
/// of different users never share a record.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBSessionStore {
    db: Arc<DB>,
}

impl RocksDBSessionStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "sessions" column family exists.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_sessions = ColumnFamilyDescriptor::new(CF_SESSIONS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_sessions])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn sessions(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(CF_SESSIONS).ok_or_else(|| {
            PortalError::InternalError(Box::new(std::io::Error::other(
                "Sessions column family not found",
            )))
        })
    }
}

#[async_trait]
impl SessionStore for RocksDBSessionStore {
    async fn load(&self, key: &SessionKey) -> Result<Option<SessionSnapshot>> {
        let cf = self.sessions()?;
        match self.db.get_cf(cf, key.storage_key())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let cf = self.sessions()?;
        let value = serde_json::to_vec(snapshot)?;
        self.db.put_cf(cf, snapshot.key.storage_key(), value)?;
        Ok(())
    }

    async fn clear(&self, key: &SessionKey) -> Result<()> {
        let cf = self.sessions()?;
        self.db.delete_cf(cf, key.storage_key())?;
        Ok(())
    }
}
