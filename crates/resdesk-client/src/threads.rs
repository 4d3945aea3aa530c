//! File-backed message threads, one append-only log per reservation.
//!
//! The store is a single JSON object mapping `messages_<thread key>` to an
//! array of [`ThreadMessage`]s. Each thread decodes on its own,
//! so a bad entry only affects its own thread. Writes replace the file
//! atomically through a sibling temp file and a rename.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::ThreadStoreError;

const KEY_PREFIX: &str = "messages_";

type RawThreads = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadMessage {
    pub content: String,
    /// `true` for replies sent to the guest, `false` for the guest's messages.
    pub is_reply: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct FileThreadStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileThreadStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Messages for `thread_key`, oldest first.
    ///
    /// Never fails: a missing, unreadable or corrupt store, or a thread whose
    /// entries do not decode, yields an empty thread.
    pub async fn load(&self, thread_key: &str) -> Vec<ThreadMessage> {
        let mut threads = match self.read_all().await {
            Ok(threads) => threads,
            Err(e) => {
                tracing::warn!(error = %e, "thread store unreadable, showing empty thread");
                return Vec::new();
            }
        };
        threads
            .remove(&storage_key(thread_key))
            .map(|raw| decode_thread(thread_key, raw))
            .unwrap_or_default()
    }

    /// Appends a message stamped with the current UTC time and returns it.
    ///
    /// Only the `thread_key` entry is rewritten; other threads are carried
    /// over as stored, even if they do not decode.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadStoreError::Io`] if the store cannot be read or written,
    /// and [`ThreadStoreError::Corrupt`] if the file is not a JSON object. A
    /// store that fails either way is left as it was.
    pub async fn append(
        &self,
        thread_key: &str,
        content: &str,
        is_reply: bool,
    ) -> Result<ThreadMessage, ThreadStoreError> {
        let _guard = self.write_lock.lock().await;

        let mut threads = self.read_all().await?;
        let key = storage_key(thread_key);
        let mut thread = threads
            .remove(&key)
            .map(|raw| decode_thread(thread_key, raw))
            .unwrap_or_default();

        let message = ThreadMessage {
            content: content.to_string(),
            is_reply,
            timestamp: Utc::now(),
        };
        thread.push(message.clone());
        threads.insert(key, serde_json::to_value(&thread)?);

        self.write_all(&threads).await?;
        tracing::debug!(thread_key, is_reply, "appended thread message");
        Ok(message)
    }

    /// Raw store contents, one undecoded value per key. A missing file is an
    /// empty store.
    async fn read_all(&self) -> Result<RawThreads, ThreadStoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RawThreads::new()),
            Err(source) => {
                return Err(ThreadStoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|source| ThreadStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn write_all(&self, threads: &RawThreads) -> Result<(), ThreadStoreError> {
        let io_err = |source| ThreadStoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let encoded = serde_json::to_vec_pretty(threads)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, encoded).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

fn storage_key(thread_key: &str) -> String {
    format!("{KEY_PREFIX}{thread_key}")
}

/// A thread that does not decode starts over; the bad entry is replaced only
/// when that same thread is appended to.
fn decode_thread(thread_key: &str, raw: Value) -> Vec<ThreadMessage> {
    serde_json::from_value(raw).unwrap_or_else(|e| {
        tracing::warn!(thread_key, error = %e, "thread entry corrupt, starting empty");
        Vec::new()
    })
}
