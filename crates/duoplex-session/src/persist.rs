//! Account persistence: save hooks and the startup loader.
//!
//! The accounts file holds one JSON object:
//!
//! ```json
//! {"accounts":[{"username":"alice","password":"pw"}]}
//! ```
//!
//! It is rewritten in full on every successful registration.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{Account, AccountSink, StoreError};

/// On-disk layout of the accounts file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct AccountsFile {
    accounts: Vec<Account>,
}

// ---------------------------------------------------------------------------
// JsonFileSink
// ---------------------------------------------------------------------------

/// Writes account snapshots to a JSON file from a background task.
///
/// `save` only queues the snapshot; the writer task does the file I/O, so
/// the lobby never waits on the disk. Snapshots are written in order, and
/// when several are queued the writer skips straight to the newest one
/// (each snapshot is the full set, so older ones are redundant).
///
/// Every write goes to `<path>.tmp` first and is then renamed over
/// `<path>`, so a crash mid-write leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    tx: mpsc::UnboundedSender<Vec<Account>>,
}

impl JsonFileSink {
    /// Starts the writer task for `path`.
    ///
    /// The task runs until every clone of the returned sink is dropped and
    /// the queue is drained; awaiting the handle after that guarantees the
    /// last snapshot is on disk.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(path: impl Into<PathBuf>) -> (Self, JoinHandle<()>) {
        let path = path.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(write_loop(path, rx));
        (Self { tx }, handle)
    }
}

impl AccountSink for JsonFileSink {
    fn save(&self, accounts: Vec<Account>) -> Result<(), StoreError> {
        self.tx
            .send(accounts)
            .map_err(|_| StoreError::Persist("account writer has stopped".into()))
    }
}

async fn write_loop(path: PathBuf, mut rx: mpsc::UnboundedReceiver<Vec<Account>>) {
    while let Some(mut latest) = rx.recv().await {
        let mut skipped = 0usize;
        while let Ok(newer) = rx.try_recv() {
            latest = newer;
            skipped += 1;
        }

        let count = latest.len();
        match write_accounts(&path, latest).await {
            Ok(()) => tracing::debug!(
                path = %path.display(),
                accounts = count,
                skipped,
                "accounts file written"
            ),
            Err(e) => tracing::error!(
                path = %path.display(),
                error = %e,
                "failed to write accounts file"
            ),
        }
    }
    tracing::debug!(path = %path.display(), "account writer stopped");
}

async fn write_accounts(path: &Path, accounts: Vec<Account>) -> Result<(), StoreError> {
    let body = serde_json::to_vec_pretty(&AccountsFile { accounts })?;

    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Reads the accounts file written by [`JsonFileSink`].
///
/// A missing file is a fresh install and yields no accounts.
///
/// # Errors
/// - [`StoreError::Io`]: the file exists but can't be read
/// - [`StoreError::Malformed`]: the file isn't valid account JSON
pub async fn load_accounts(path: impl AsRef<Path>) -> Result<Vec<Account>, StoreError> {
    let path = path.as_ref();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no accounts file yet, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let file: AccountsFile = serde_json::from_slice(&bytes)?;
    tracing::info!(
        path = %path.display(),
        accounts = file.accounts.len(),
        "accounts loaded"
    );
    Ok(file.accounts)
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// Keeps the latest snapshot in memory. Nothing survives a restart.
///
/// Clones share the same state, so a test can hand one clone to the
/// store and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    latest: Option<Vec<Account>>,
    saves: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent snapshot, if any save has happened.
    pub fn latest(&self) -> Option<Vec<Account>> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .latest
            .clone()
    }

    /// How many snapshots have been saved.
    pub fn save_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .saves
    }
}

impl AccountSink for MemorySink {
    fn save(&self, accounts: Vec<Account>) -> Result<(), StoreError> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.latest = Some(accounts);
        state.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccountStore;

    fn alice() -> Account {
        Account::new("alice", "pw")
    }

    #[tokio::test]
    async fn test_load_accounts_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();

        let accounts = load_accounts(dir.path().join("accounts.json"))
            .await
            .expect("missing file is not an error");

        assert!(accounts.is_empty());
    }

    #[tokio::test]
    async fn test_load_accounts_malformed_file_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let result = load_accounts(&path).await;

        assert!(matches!(result, Err(StoreError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_load_accounts_reads_wire_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        tokio::fs::write(
            &path,
            br#"{"accounts":[{"username":"alice","password":"pw"}]}"#,
        )
        .await
        .unwrap();

        let accounts = load_accounts(&path).await.unwrap();

        assert_eq!(accounts, vec![alice()]);
    }

    #[tokio::test]
    async fn test_json_file_sink_writes_latest_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        let (sink, writer) = JsonFileSink::spawn(&path);

        let mut store = AccountStore::new(sink);
        store.add(alice()).unwrap();
        store.add(Account::new("bob", "x")).unwrap();

        // Dropping the store drops the only sender; the writer drains and exits.
        drop(store);
        writer.await.unwrap();

        let loaded = load_accounts(&path).await.unwrap();
        assert_eq!(loaded, vec![alice(), Account::new("bob", "x")]);
    }

    #[tokio::test]
    async fn test_json_file_sink_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        let (sink, writer) = JsonFileSink::spawn(&path);

        sink.save(vec![alice()]).unwrap();
        drop(sink);
        writer.await.unwrap();

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["accounts.json".to_string()]);
    }

    #[tokio::test]
    async fn test_json_file_sink_stopped_writer_reports_persist_error() {
        let dir = tempfile::tempdir().unwrap();
        let (sink, writer) = JsonFileSink::spawn(dir.path().join("accounts.json"));
        writer.abort();
        let _ = writer.await;

        let result = sink.save(vec![alice()]);

        assert!(matches!(result, Err(StoreError::Persist(_))));
    }

    #[test]
    fn test_memory_sink_clones_share_state() {
        let sink = MemorySink::new();
        let other = sink.clone();

        sink.save(vec![alice()]).unwrap();

        assert_eq!(other.save_count(), 1);
        assert_eq!(other.latest(), Some(vec![alice()]));
    }
}
