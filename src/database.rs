//! Database initialization, table definitions and the redb-backed store
//!
//! This module handles the setup of the embedded redb database and
//! implements [`LinkStore`] on top of it.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use std::sync::Arc;

use crate::allocator::Allocator;
use crate::config::Config;
use crate::error::StoreError;
use crate::model::{LinkPatch, NewLink, OwnerPage, OwnerStats, UrlRecord};
use crate::store::LinkStore;

/// Main table for storing mapping records
///
/// Key: short code, which doubles as the uniqueness constraint
/// Value: JSON-serialized UrlRecord
///
/// Example:
/// - Key: "abc123"
/// - Value: '{"id":1,"originalUrl":"https://example.com",...}'
pub const TABLE_LINKS: TableDefinition<&str, &str> = TableDefinition::new("links_v1");

/// Maps storage ids to short codes
pub const TABLE_LINK_IDS: TableDefinition<u64, &str> = TableDefinition::new("link_ids_v1");

/// Secondary index for listing an owner's links
///
/// Key: composite key in format "{owner_id}:{created_micros}:{short_code}"
/// Value: short code
///
/// The zero-padded timestamp keeps entries in chronological order so a
/// reversed range scan yields the newest links first.
pub const TABLE_OWNER_INDEX: TableDefinition<&str, &str> = TableDefinition::new("owner_index_v1");

/// Monotonic counters, keyed by sequence name
pub const TABLE_SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences_v1");

const LINK_SEQUENCE: &str = "links";

/// Number of links reported as "recent" in owner statistics
pub const RECENT_LINKS: usize = 5;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LinkStore>,
    pub allocator: Arc<Allocator>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: impl LinkStore + 'static, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            allocator: Arc::new(Allocator::default()),
            config: Arc::new(config),
        }
    }
}

/// Initializes the embedded database and creates required tables
///
/// # Example
///
/// ```no_run
/// # use shortener::database::init_db;
/// let db = init_db("data.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, StoreError> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_LINKS)?;
        write_txn.open_table(TABLE_LINK_IDS)?;
        write_txn.open_table(TABLE_OWNER_INDEX)?;
        write_txn.open_table(TABLE_SEQUENCES)?;
    }
    write_txn.commit()?;

    Ok(db)
}

/// [`LinkStore`] backed by redb
///
/// redb serializes write transactions, so every mutation below (including
/// the click increment) is applied atomically with respect to concurrent
/// requests.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    pub fn new(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }

    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        Ok(Self::new(init_db(db_path)?))
    }

    /// Runs `op` in a write transaction, committing only when it succeeds
    fn write<T>(
        &self,
        op: impl FnOnce(&WriteTransaction) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let txn = self.db.begin_write()?;
        let out = op(&txn)?;
        txn.commit()?;
        Ok(out)
    }

    /// Loads the owner's records, newest first
    fn owner_records(&self, owner: &str) -> Result<Vec<UrlRecord>, StoreError> {
        let txn = self.db.begin_read()?;
        let index = txn.open_table(TABLE_OWNER_INDEX)?;
        let links = txn.open_table(TABLE_LINKS)?;

        // '{' sorts after every digit, bounding the "{owner}:" prefix
        let start_key = format!("{}:", owner);
        let end_key = format!("{}:{{", owner);

        let mut records = Vec::new();
        for entry in index.range(start_key.as_str()..end_key.as_str())?.rev() {
            let (_, code) = entry?;
            // Owners whose id extends this one share the prefix
            if let Some(record) = load_record(&links, code.value())? {
                if record.owner_id == owner {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }
}

fn load_record<T>(table: &T, code: &str) -> Result<Option<UrlRecord>, StoreError>
where
    T: ReadableTable<&'static str, &'static str>,
{
    match table.get(code)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    }
}

fn owner_key(record: &UrlRecord) -> String {
    format!(
        "{}:{:020}:{}",
        record.owner_id,
        record.created_at.timestamp_micros(),
        record.short_code
    )
}

fn next_id(txn: &WriteTransaction) -> Result<u64, StoreError> {
    let mut sequences = txn.open_table(TABLE_SEQUENCES)?;
    let next = sequences.get(LINK_SEQUENCE)?.map(|g| g.value()).unwrap_or(0) + 1;
    sequences.insert(LINK_SEQUENCE, next)?;
    Ok(next)
}

fn code_for_id(txn: &WriteTransaction, id: u64) -> Result<Option<String>, StoreError> {
    let ids = txn.open_table(TABLE_LINK_IDS)?;
    let code = ids.get(id)?.map(|g| g.value().to_string());
    Ok(code)
}

impl LinkStore for RedbStore {
    fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>, StoreError> {
        let txn = self.db.begin_read()?;
        let links = txn.open_table(TABLE_LINKS)?;
        load_record(&links, code)
    }

    fn code_taken(&self, code: &str) -> Result<bool, StoreError> {
        // A custom code is always stored as the record's short code, so the
        // primary key covers both columns.
        let txn = self.db.begin_read()?;
        let links = txn.open_table(TABLE_LINKS)?;
        let taken = links.get(code)?.is_some();
        Ok(taken)
    }

    fn insert(&self, link: NewLink) -> Result<UrlRecord, StoreError> {
        self.write(|txn| {
            let mut links = txn.open_table(TABLE_LINKS)?;
            if links.get(link.short_code.as_str())?.is_some() {
                return Err(StoreError::Conflict(link.short_code));
            }

            let record = UrlRecord {
                id: next_id(txn)?,
                original_url: link.original_url,
                short_code: link.short_code,
                custom_code: link.custom_code,
                owner_id: link.owner_id,
                title: link.title,
                description: link.description,
                clicks: 0,
                is_active: true,
                expires_at: link.expires_at,
                created_at: chrono::Utc::now(),
            };
            let record_json = serde_json::to_string(&record)?;
            links.insert(record.short_code.as_str(), record_json.as_str())?;

            let mut ids = txn.open_table(TABLE_LINK_IDS)?;
            ids.insert(record.id, record.short_code.as_str())?;

            let mut index = txn.open_table(TABLE_OWNER_INDEX)?;
            index.insert(owner_key(&record).as_str(), record.short_code.as_str())?;

            Ok(record)
        })
    }

    fn increment_clicks(&self, code: &str) -> Result<(), StoreError> {
        self.write(|txn| {
            let mut links = txn.open_table(TABLE_LINKS)?;
            let mut record =
                load_record(&links, code)?.ok_or_else(|| StoreError::Missing(code.to_string()))?;
            record.clicks += 1;
            let record_json = serde_json::to_string(&record)?;
            links.insert(code, record_json.as_str())?;
            Ok(())
        })
    }

    fn find_by_id(&self, id: u64) -> Result<Option<UrlRecord>, StoreError> {
        let txn = self.db.begin_read()?;
        let ids = txn.open_table(TABLE_LINK_IDS)?;
        let Some(code) = ids.get(id)?.map(|g| g.value().to_string()) else {
            return Ok(None);
        };
        let links = txn.open_table(TABLE_LINKS)?;
        load_record(&links, &code)
    }

    fn update(&self, id: u64, owner: &str, patch: &LinkPatch) -> Result<Option<UrlRecord>, StoreError> {
        self.write(|txn| {
            let Some(code) = code_for_id(txn, id)? else {
                return Ok(None);
            };
            let mut links = txn.open_table(TABLE_LINKS)?;
            let Some(mut record) = load_record(&links, &code)? else {
                return Ok(None);
            };
            if record.owner_id != owner {
                return Ok(None);
            }

            patch.apply(&mut record);
            let record_json = serde_json::to_string(&record)?;
            links.insert(code.as_str(), record_json.as_str())?;
            Ok(Some(record))
        })
    }

    fn delete(&self, id: u64, owner: &str) -> Result<bool, StoreError> {
        self.write(|txn| {
            let Some(code) = code_for_id(txn, id)? else {
                return Ok(false);
            };
            let mut links = txn.open_table(TABLE_LINKS)?;
            let Some(record) = load_record(&links, &code)? else {
                return Ok(false);
            };
            if record.owner_id != owner {
                return Ok(false);
            }

            links.remove(code.as_str())?;
            txn.open_table(TABLE_LINK_IDS)?.remove(id)?;
            txn.open_table(TABLE_OWNER_INDEX)?
                .remove(owner_key(&record).as_str())?;
            Ok(true)
        })
    }

    fn list_by_owner(&self, owner: &str, offset: usize, limit: usize) -> Result<OwnerPage, StoreError> {
        let records = self.owner_records(owner)?;
        let total = records.len();
        Ok(OwnerPage {
            records: records.into_iter().skip(offset).take(limit).collect(),
            total,
        })
    }

    fn stats_for_owner(&self, owner: &str) -> Result<OwnerStats, StoreError> {
        let records = self.owner_records(owner)?;
        Ok(OwnerStats {
            total_urls: records.len(),
            total_clicks: records.iter().map(|r| r.clicks).sum(),
            active_urls: records.iter().filter(|r| r.is_active).count(),
            recent: records.into_iter().take(RECENT_LINKS).collect(),
        })
    }
}
