use parking_lot::RwLock;
use redb::{
    Builder, Database, ReadableTable, ReadableTableMetadata, TableError, TableHandle,
    UntypedTableHandle, WriteTransaction,
};
use std::fs::OpenOptions;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{EngineOptions, StoreConfig};
use crate::keys::{self, TableNames, VISITED_MARKER};
use crate::request::QueuedRequest;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database open error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Queue is empty")]
    QueueEmpty,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Sequence exhausted for namespace {0}")]
    SequenceExhausted(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn is_queue_empty(&self) -> bool {
        matches!(self, StoreError::QueueEmpty)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// The backing file could not be opened or created.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::Database(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// STORE
// ============================================================================

/// Visited set, FIFO request queue and cookie store for one crawler, sharing a redb file.
///
/// Every multi-step operation runs inside a single redb transaction, so concurrent
/// callers never see half-applied state. Cheap to share behind an `Arc`.
pub struct CrawlStore {
    db: Arc<Database>,
    names: TableNames,
    prefix: String,
    engine: EngineOptions,
    // Serializes cookie readers and writers in this process. Also held by clear().
    cookie_lock: RwLock<()>,
}

impl CrawlStore {
    /// Open (or create) the store file described by `config` and make sure its namespaces exist.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let db = open_database(config)?;
        tracing::info!(
            path = %config.path.display(),
            bucket = config.bucket_name(),
            prefix = %config.prefix,
            "Opened crawl store"
        );
        Self::with_database(Arc::new(db), config)
    }

    /// Attach to an already-open database. This is how several prefixes share one file,
    /// since redb will not open the same file twice in a process.
    pub fn with_database(db: Arc<Database>, config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let store = Self {
            db,
            names: TableNames::new(config.bucket_name(), &config.prefix),
            prefix: config.prefix.clone(),
            engine: config.engine.clone(),
            cookie_lock: RwLock::new(()),
        };
        store.init()?;
        Ok(store)
    }

    /// Ensure the root namespace and the nested queue namespace exist. Idempotent.
    pub fn init(&self) -> StoreResult<()> {
        let txn = self.begin_write()?;
        Self::create_namespaces(&txn, &self.names)?;
        txn.commit()?;
        Ok(())
    }

    /// Drop the whole root namespace and recreate it empty, in one transaction.
    ///
    /// Every table under the root goes, including queues of other prefixes sharing the
    /// same bucket, and the sequence counters restart.
    pub fn clear(&self) -> StoreResult<()> {
        let _guard = self.cookie_lock.write();

        let txn = self.begin_write()?;
        let doomed: Vec<UntypedTableHandle> = txn
            .list_tables()?
            .filter(|handle| self.names.contains(handle.name()))
            .collect();
        let dropped = doomed.len();
        for handle in doomed {
            txn.delete_table(handle)?;
        }
        Self::create_namespaces(&txn, &self.names)?;
        txn.commit()?;

        tracing::info!(
            bucket = self.names.root_name(),
            tables = dropped,
            "Cleared crawl store"
        );
        Ok(())
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn names(&self) -> &TableNames {
        &self.names
    }

    fn create_namespaces(txn: &WriteTransaction, names: &TableNames) -> StoreResult<()> {
        // Opening a table inside a write transaction creates it if absent.
        let _root = txn.open_table(names.root())?;
        let _queue = txn.open_table(names.queue())?;
        let _sequences = txn.open_table(names.sequences())?;
        Ok(())
    }

    fn begin_write(&self) -> StoreResult<WriteTransaction> {
        let mut txn = self.db.begin_write()?;
        txn.set_durability(self.engine.durability.into());
        Ok(txn)
    }

    // ========================================================================
    // VISITED SET
    // ========================================================================

    /// Record a request fingerprint as processed. Re-marking is harmless.
    pub fn mark_visited(&self, fingerprint: u64) -> StoreResult<()> {
        let key = keys::visited_key(&self.prefix, fingerprint);
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(self.names.root())?;
            table.insert(key.as_slice(), VISITED_MARKER)?;
        }
        txn.commit()?;
        tracing::trace!(prefix = %self.prefix, fingerprint, "Marked visited");
        Ok(())
    }

    /// True if the fingerprint has been recorded with [`mark_visited`](Self::mark_visited).
    pub fn is_visited(&self, fingerprint: u64) -> StoreResult<bool> {
        let key = keys::visited_key(&self.prefix, fingerprint);
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(self.names.root()) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let found = table.get(key.as_slice())?.is_some();
        Ok(found)
    }

    // ========================================================================
    // REQUEST QUEUE (FIFO)
    // ========================================================================

    /// Append a payload behind everything already queued.
    pub fn enqueue(&self, payload: &[u8]) -> StoreResult<()> {
        let txn = self.begin_write()?;
        let seq = self.next_sequence(&txn)?;
        {
            let mut table = txn.open_table(self.names.queue())?;
            table.insert(keys::encode_sequence(seq).as_slice(), payload)?;
        }
        txn.commit()?;
        tracing::trace!(prefix = %self.prefix, seq, bytes = payload.len(), "Enqueued request");
        Ok(())
    }

    /// Remove and return the oldest payload, or [`StoreError::QueueEmpty`].
    ///
    /// The read and the delete share one write transaction, so no two callers can
    /// receive the same entry.
    pub fn dequeue(&self) -> StoreResult<Vec<u8>> {
        let txn = self.begin_write()?;
        let popped = {
            let mut table = txn.open_table(self.names.queue())?;
            let entry = table.pop_first()?;
            entry.map(|(key, value)| (keys::decode_sequence(key.value()), value.value().to_vec()))
        };

        match popped {
            Some((seq, payload)) => {
                txn.commit()?;
                tracing::trace!(prefix = %self.prefix, ?seq, bytes = payload.len(), "Dequeued request");
                Ok(payload)
            }
            None => {
                txn.abort()?;
                Err(StoreError::QueueEmpty)
            }
        }
    }

    /// Like [`dequeue`](Self::dequeue) but maps an empty queue to `None`.
    pub fn try_dequeue(&self) -> StoreResult<Option<Vec<u8>>> {
        match self.dequeue() {
            Ok(payload) => Ok(Some(payload)),
            Err(StoreError::QueueEmpty) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Oldest payload without removing it.
    pub fn peek(&self) -> StoreResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(self.names.queue()) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let first = table.first()?;
        Ok(first.map(|(_key, value)| value.value().to_vec()))
    }

    /// Point-in-time count of queued payloads.
    ///
    /// Read paths treat a missing table as empty: a `clear()` from another prefix in the
    /// same bucket drops this prefix's queue until its next write recreates it.
    pub fn queue_size(&self) -> StoreResult<usize> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(self.names.queue()) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        Ok(table.len()? as usize)
    }

    pub fn enqueue_request(&self, request: &QueuedRequest) -> StoreResult<()> {
        self.enqueue(&request.to_bytes()?)
    }

    pub fn dequeue_request(&self) -> StoreResult<QueuedRequest> {
        let payload = self.dequeue()?;
        QueuedRequest::from_bytes(&payload)
    }

    /// Issue the next sequence number for the queue namespace inside `txn`. Starts at 1
    /// and never repeats until the root namespace is cleared.
    fn next_sequence(&self, txn: &WriteTransaction) -> StoreResult<u64> {
        let mut table = txn.open_table(self.names.sequences())?;
        let last = table
            .get(self.names.queue_name())?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = last
            .checked_add(1)
            .ok_or_else(|| StoreError::SequenceExhausted(self.names.queue_name().to_string()))?;
        table.insert(self.names.queue_name(), next)?;
        Ok(next)
    }

    // ========================================================================
    // COOKIES
    // ========================================================================

    /// Store the cookie header for a host, replacing any previous value.
    pub fn try_set_cookies(&self, host: &str, cookies: &str) -> StoreResult<()> {
        let key = keys::cookie_key(&self.prefix, host);
        let _guard = self.cookie_lock.write();

        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(self.names.root())?;
            table.insert(key.as_slice(), cookies.as_bytes())?;
        }
        txn.commit()?;
        tracing::debug!(prefix = %self.prefix, host, "Stored cookies");
        Ok(())
    }

    /// Cookie header for a host, or [`StoreError::NotFound`] if none was ever stored.
    pub fn try_cookies(&self, host: &str) -> StoreResult<String> {
        let key = keys::cookie_key(&self.prefix, host);
        let _guard = self.cookie_lock.read();

        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(self.names.root()) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => {
                return Err(StoreError::NotFound(host.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let value = table.get(key.as_slice())?;
        match value {
            Some(bytes) => Ok(String::from_utf8_lossy(bytes.value()).into_owned()),
            None => Err(StoreError::NotFound(host.to_string())),
        }
    }

    /// Best-effort [`try_set_cookies`](Self::try_set_cookies): failures are logged, not returned.
    pub fn set_cookies(&self, host: &str, cookies: &str) {
        if let Err(e) = self.try_set_cookies(host, cookies) {
            tracing::warn!(prefix = %self.prefix, host, error = %e, "Failed to store cookies");
        }
    }

    /// Best-effort [`try_cookies`](Self::try_cookies): an absent host or a failed lookup
    /// both yield an empty string.
    pub fn cookies(&self, host: &str) -> String {
        match self.try_cookies(host) {
            Ok(cookies) => cookies,
            Err(StoreError::NotFound(_)) => {
                tracing::debug!(prefix = %self.prefix, host, "No cookies stored");
                String::new()
            }
            Err(e) => {
                tracing::warn!(prefix = %self.prefix, host, error = %e, "Failed to read cookies");
                String::new()
            }
        }
    }
}

/// Create or open the file with the configured permissions, then hand it to redb.
fn open_database(config: &StoreConfig) -> StoreResult<Database> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(config.mode);
    }
    let file = options.open(&config.path)?;

    let mut builder = Builder::new();
    if let Some(cache_size) = config.engine.cache_size {
        builder.set_cache_size(cache_size);
    }
    Ok(builder.create_file(file)?)
}
