//! Storage seam between the core logic and the database
//!
//! The allocator, the resolver and the handlers only ever talk to a
//! [`LinkStore`]; the redb-backed implementation lives in
//! [`crate::database`].

use crate::error::StoreError;
use crate::model::{LinkPatch, NewLink, OwnerPage, OwnerStats, UrlRecord};

pub trait LinkStore: Send + Sync {
    /// Point lookup by short code, regardless of activity or expiry
    fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>, StoreError>;

    /// True when any record uses `code` as its short code or custom code
    fn code_taken(&self, code: &str) -> Result<bool, StoreError>;

    /// Inserts a new mapping, assigning its id.
    ///
    /// Fails with [`StoreError::Conflict`] when the short code exists,
    /// whatever any earlier pre-check said.
    fn insert(&self, link: NewLink) -> Result<UrlRecord, StoreError>;

    /// Adds exactly one click as a single storage-side operation
    fn increment_clicks(&self, code: &str) -> Result<(), StoreError>;

    fn find_by_id(&self, id: u64) -> Result<Option<UrlRecord>, StoreError>;

    /// Applies `patch` to the record `id` if `owner` created it.
    /// Returns `None` when no such record belongs to `owner`.
    fn update(&self, id: u64, owner: &str, patch: &LinkPatch) -> Result<Option<UrlRecord>, StoreError>;

    /// Hard-deletes the record `id` if `owner` created it
    fn delete(&self, id: u64, owner: &str) -> Result<bool, StoreError>;

    /// A page of the owner's records, newest first, with the owner's total
    fn list_by_owner(&self, owner: &str, offset: usize, limit: usize) -> Result<OwnerPage, StoreError>;

    fn stats_for_owner(&self, owner: &str) -> Result<OwnerStats, StoreError>;
}
