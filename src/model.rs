//! Data models for the link shortener
//!
//! This module defines the stored mapping record as well as the
//! request/response shapes of the dashboard API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A mapping record stored in the database
///
/// The record is keyed by `short_code` and serialized as JSON, the same
/// way it is exposed over the API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecord {
    /// Storage-assigned identifier, unique and never reused
    pub id: u64,

    /// Destination of the redirect, always carrying a scheme
    pub original_url: String,

    /// Unique code appended to the base URL
    pub short_code: String,

    /// Set only when the creator picked the code; equals `short_code` then
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_code: Option<String>,

    /// Opaque identifier of the creating principal
    pub owner_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Number of successful redirects
    #[serde(default)]
    pub clicks: u64,

    /// Inactive links are never redirected
    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl UrlRecord {
    /// Returns true when the record carries an expiry that lies before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

/// Everything needed to insert a new mapping; the store fills in
/// `id`, `clicks`, `is_active` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub original_url: String,
    pub short_code: String,
    pub custom_code: Option<String>,
    pub owner_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request payload for creating a new short link
///
/// # Example
/// ```json
/// {
///   "originalUrl": "example.com/very/long/url",
///   "shortLink": "https://sho.rt/my-link",
///   "description": "Landing page",
///   "expiresAt": "2026-12-31T00:00:00Z"
/// }
/// ```
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub original_url: String,

    /// Desired code, either bare or as a full URL whose last path
    /// segment is the code. Empty means "generate one".
    #[serde(default, alias = "customCode")]
    pub short_link: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update of a link's metadata
///
/// Absent fields are left untouched. For the nullable fields an explicit
/// `null` clears the stored value.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LinkPatch {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,

    #[serde(default)]
    pub is_active: Option<bool>,

    #[serde(default, deserialize_with = "present")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

/// Distinguishes a field sent as `null` from a field that was omitted
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl LinkPatch {
    pub fn apply(&self, record: &mut UrlRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(is_active) = self.is_active {
            record.is_active = is_active;
        }
        if let Some(expires_at) = self.expires_at {
            record.expires_at = expires_at;
        }
    }
}

/// A link as returned by the API
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UrlResponse {
    pub id: String,
    pub original_url: String,
    pub short_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_code: Option<String>,
    pub short_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub clicks: u64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl UrlResponse {
    pub fn from_record(record: UrlRecord, base_url: &str) -> Self {
        Self {
            id: record.id.to_string(),
            short_url: format!("{}/{}", base_url, record.short_code),
            original_url: record.original_url,
            short_code: record.short_code,
            custom_code: record.custom_code,
            title: record.title,
            description: record.description,
            clicks: record.clicks,
            created_at: record.created_at,
            expires_at: record.expires_at,
            is_active: record.is_active,
        }
    }
}

/// Query parameters for listing links
///
/// Query string: `?page=2&limit=20`
#[derive(Deserialize, Debug, Default)]
pub struct ListParams {
    /// Page number, starts from 1
    pub page: Option<usize>,

    /// Items per page, between 1 and 100 (default 10)
    pub limit: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ListResponse {
    pub urls: Vec<UrlResponse>,
    pub pagination: Pagination,
}

/// One page of an owner's links and the owner's total link count
#[derive(Debug, Clone, Default)]
pub struct OwnerPage {
    pub records: Vec<UrlRecord>,
    pub total: usize,
}

#[derive(Deserialize, Debug, Default)]
pub struct LandingParams {
    pub error: Option<String>,
}

/// Aggregates over one owner's links, as computed by the store
#[derive(Debug, Clone, Default)]
pub struct OwnerStats {
    pub total_urls: usize,
    pub total_clicks: u64,
    pub active_urls: usize,
    pub recent: Vec<UrlRecord>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_urls: usize,
    pub total_clicks: u64,
    pub active_urls: usize,
    pub recent_urls: Vec<UrlResponse>,
}

/// Envelope shared by every JSON response of the API
#[derive(Serialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}
