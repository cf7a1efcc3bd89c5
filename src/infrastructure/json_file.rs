use crate::domain::ports::SessionStore;
use crate::domain::session::{SessionKey, SessionSnapshot};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Session store backed by one JSON document on disk.
///
/// The document maps `SessionKey::encoded` to its snapshot. A missing file reads as
/// an empty store; every write rewrites the whole document.
pub struct JsonFileSessionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

type Document = BTreeMap<String, SessionSnapshot>;

impl JsonFileSessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Document> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Document::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, document: &Document) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn load(&self, key: &SessionKey) -> Result<Option<SessionSnapshot>> {
        let mut document = self.read().await?;
        Ok(document.remove(&key.encoded()))
    }

    async fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read().await?;
        document.insert(snapshot.key.encoded(), snapshot.clone());
        self.write(&document).await
    }

    async fn clear(&self, key: &SessionKey) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read().await?;
        if document.remove(&key.encoded()).is_some() {
            self.write(&document).await?;
        }
        Ok(())
    }
}
