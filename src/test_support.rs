//! Stores and generators used by the unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::allocator::CodeGenerator;
use crate::database::RedbStore;
use crate::error::StoreError;
use crate::model::{LinkPatch, NewLink, OwnerPage, OwnerStats, UrlRecord};
use crate::store::LinkStore;

pub fn temp_store() -> (RedbStore, NamedTempFile) {
    let file = NamedTempFile::new().expect("Failed to create temp file");
    let store = RedbStore::open(file.path().to_str().unwrap()).expect("Failed to open test store");
    (store, file)
}

pub fn new_link(code: &str, owner: &str) -> NewLink {
    NewLink {
        original_url: format!("https://example.com/{}", code),
        short_code: code.to_string(),
        custom_code: None,
        owner_id: owner.to_string(),
        title: None,
        description: None,
        expires_at: None,
    }
}

/// Replays a fixed list of codes, repeating the last one
pub struct FixedCodes {
    codes: Vec<String>,
    next: Mutex<usize>,
}

impl FixedCodes {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            codes: codes.iter().map(|c| c.to_string()).collect(),
            next: Mutex::new(0),
        }
    }
}

impl CodeGenerator for FixedCodes {
    fn generate(&self) -> String {
        let mut next = self.next.lock().unwrap();
        let idx = (*next).min(self.codes.len() - 1);
        *next += 1;
        self.codes[idx].clone()
    }
}

/// Wraps a real store, counting calls and optionally failing increments
/// or losing insert races
pub struct CountingStore {
    inner: RedbStore,
    lookups: AtomicUsize,
    writes: AtomicUsize,
    inserts: AtomicUsize,
    fail_clicks: bool,
    lost_races: usize,
}

impl CountingStore {
    pub fn new(inner: RedbStore) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
            fail_clicks: false,
            lost_races: 0,
        }
    }

    /// The first `lost_races` inserts report a conflict even though
    /// `code_taken` said the code was free
    pub fn racing(inner: RedbStore, lost_races: usize) -> Self {
        Self {
            lost_races,
            ..Self::new(inner)
        }
    }

    pub fn failing_clicks(inner: RedbStore) -> Self {
        Self {
            fail_clicks: true,
            ..Self::new(inner)
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    fn lookup(&self) {
        self.lookups.fetch_add(1, Ordering::SeqCst);
    }

    fn write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl LinkStore for CountingStore {
    fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>, StoreError> {
        self.lookup();
        self.inner.find_by_code(code)
    }

    fn code_taken(&self, code: &str) -> Result<bool, StoreError> {
        self.lookup();
        self.inner.code_taken(code)
    }

    fn insert(&self, link: NewLink) -> Result<UrlRecord, StoreError> {
        self.write();
        let attempt = self.inserts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.lost_races {
            return Err(StoreError::Conflict(link.short_code));
        }
        self.inner.insert(link)
    }

    fn increment_clicks(&self, code: &str) -> Result<(), StoreError> {
        self.write();
        if self.fail_clicks {
            return Err(StoreError::Database("increment rejected".to_string()));
        }
        self.inner.increment_clicks(code)
    }

    fn find_by_id(&self, id: u64) -> Result<Option<UrlRecord>, StoreError> {
        self.lookup();
        self.inner.find_by_id(id)
    }

    fn update(&self, id: u64, owner: &str, patch: &LinkPatch) -> Result<Option<UrlRecord>, StoreError> {
        self.write();
        self.inner.update(id, owner, patch)
    }

    fn delete(&self, id: u64, owner: &str) -> Result<bool, StoreError> {
        self.write();
        self.inner.delete(id, owner)
    }

    fn list_by_owner(&self, owner: &str, offset: usize, limit: usize) -> Result<OwnerPage, StoreError> {
        self.lookup();
        self.inner.list_by_owner(owner, offset, limit)
    }

    fn stats_for_owner(&self, owner: &str) -> Result<OwnerStats, StoreError> {
        self.lookup();
        self.inner.stats_for_owner(owner)
    }
}

/// Every operation fails as if the database were unreachable
pub struct FailingStore;

fn unavailable<T>() -> Result<T, StoreError> {
    Err(StoreError::Database("database unavailable".to_string()))
}

impl LinkStore for FailingStore {
    fn find_by_code(&self, _code: &str) -> Result<Option<UrlRecord>, StoreError> {
        unavailable()
    }

    fn code_taken(&self, _code: &str) -> Result<bool, StoreError> {
        unavailable()
    }

    fn insert(&self, _link: NewLink) -> Result<UrlRecord, StoreError> {
        unavailable()
    }

    fn increment_clicks(&self, _code: &str) -> Result<(), StoreError> {
        unavailable()
    }

    fn find_by_id(&self, _id: u64) -> Result<Option<UrlRecord>, StoreError> {
        unavailable()
    }

    fn update(&self, _id: u64, _owner: &str, _patch: &LinkPatch) -> Result<Option<UrlRecord>, StoreError> {
        unavailable()
    }

    fn delete(&self, _id: u64, _owner: &str) -> Result<bool, StoreError> {
        unavailable()
    }

    fn list_by_owner(&self, _owner: &str, _offset: usize, _limit: usize) -> Result<OwnerPage, StoreError> {
        unavailable()
    }

    fn stats_for_owner(&self, _owner: &str) -> Result<OwnerStats, StoreError> {
        unavailable()
    }
}
