//! HTTP request handlers for the link shortener
//!
//! This module wires the allocator, the resolver and the store into:
//! - Creating short links with custom or random codes
//! - Redirecting visitors to the original destinations
//! - Listing, updating and deleting an owner's links
//! - Per-owner statistics for the dashboard

use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::Redirect,
    Json,
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::database::AppState;
use crate::error::{AllocationError, ApiError, StoreError, INVALID_URL_MESSAGE};
use crate::middleware::Owner;
use crate::model::{
    ApiResponse, CreateRequest, LandingParams, LinkPatch, ListParams, ListResponse, NewLink,
    Pagination, StatsResponse, UrlRecord, UrlResponse,
};
use crate::resolver::{resolve, RedirectTarget};
use crate::validation::{extract_candidate, normalize_url};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Creates a new short link
///
/// # Request Body
///
/// ```json
/// {
///   "originalUrl": "example.com/very/long/url",
///   "shortLink": "my-link",
///   "description": "Optional",
///   "expiresAt": "2026-12-31T00:00:00Z"
/// }
/// ```
///
/// # Response
///
/// - **201 Created** - link created
/// - **400 Bad Request** - invalid destination or code format
/// - **409 Conflict** - custom code already exists
/// - **500 Internal Server Error** - no free random code, or storage failure
pub async fn create_short_url(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(payload): Json<CreateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UrlResponse>>), ApiError> {
    let original_url = normalize_url(&payload.original_url)
        .ok_or_else(|| ApiError::BadRequest(INVALID_URL_MESSAGE.to_string()))?;

    // Empty short links mean "generate one"
    let candidate = payload
        .short_link
        .as_deref()
        .filter(|link| !link.is_empty())
        .map(extract_candidate);

    let link = NewLink {
        original_url,
        short_code: String::new(),
        custom_code: candidate.map(str::to_string),
        owner_id: owner,
        title: payload.title,
        description: payload.description,
        expires_at: payload.expires_at,
    };

    let record = insert_allocated(&state, candidate, link)?;
    info!(code = %record.short_code, owner = %record.owner_id, "short link created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UrlResponse::from_record(
            record,
            &state.config.base_url,
        ))),
    ))
}

/// Allocates a code and inserts the link under it.
///
/// The allocator's check can race with a concurrent insert of the same
/// code. For a random code the whole allocation is retried; a custom code
/// is reported as taken.
fn insert_allocated(
    state: &AppState,
    candidate: Option<&str>,
    mut link: NewLink,
) -> Result<UrlRecord, ApiError> {
    let attempts = state.allocator.max_attempts();
    for _ in 0..attempts {
        link.short_code = state.allocator.allocate(state.store.as_ref(), candidate)?;

        match state.store.insert(link.clone()) {
            Ok(record) => return Ok(record),
            Err(StoreError::Conflict(code)) if candidate.is_none() => {
                warn!(code = %code, "lost insert race for generated code, retrying");
            }
            Err(StoreError::Conflict(code)) => return Err(AllocationError::CodeTaken(code).into()),
            Err(err) => return Err(err.into()),
        }
    }

    Err(AllocationError::AllocationExhausted { attempts }.into())
}

/// Redirects a short code to its original destination
///
/// Always answers with **307 Temporary Redirect**: to the destination on
/// success, otherwise to the landing page with `?error=not-found`,
/// `?error=expired` or `?error=server-error`.
pub async fn redirect_url(Path(code): Path<String>, State(state): State<AppState>) -> Redirect {
    match resolve(state.store.as_ref(), &code, Utc::now()) {
        Ok(RedirectTarget { url }) if HeaderValue::from_str(&url).is_ok() => {
            Redirect::temporary(&url)
        }
        Ok(RedirectTarget { url }) => {
            // Records written before destinations were serialized can hold raw bytes
            error!(code = %code, url = ?url, "stored destination is not a valid Location");
            landing_redirect(SERVER_ERROR_REASON)
        }
        Err(err) => landing_redirect(err.reason()),
    }
}

const SERVER_ERROR_REASON: &str = "server-error";

fn landing_redirect(reason: &str) -> Redirect {
    Redirect::temporary(&format!("/?error={}", reason))
}

/// Landing page visitors are sent to when a redirect fails
///
/// `GET /?error=not-found` answers **404** with a short message,
/// `?error=expired` **410**, `?error=server-error` **500**. Without an
/// error the page just answers **200**.
pub async fn landing(Query(params): Query<LandingParams>) -> (StatusCode, String) {
    let (status, message) = match params.error.as_deref() {
        Some("not-found") => (StatusCode::NOT_FOUND, "Link not found"),
        Some("expired") => (StatusCode::GONE, "This link has expired"),
        Some("server-error") => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong, please try again later",
        ),
        _ => (StatusCode::OK, "Link shortener"),
    };
    (status, message.to_string())
}

/// Lists the caller's links, newest first
///
/// `GET /api/urls?page=2&limit=20`
pub async fn list_urls(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<ListResponse>>, ApiError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1).saturating_mul(limit);

    let page_of_links = state.store.list_by_owner(&owner, offset, limit)?;
    let total = page_of_links.total;

    let urls = page_of_links
        .records
        .into_iter()
        .map(|record| UrlResponse::from_record(record, &state.config.base_url))
        .collect();

    Ok(Json(ApiResponse::ok(ListResponse {
        urls,
        pagination: Pagination {
            page,
            limit,
            total,
            pages: total.div_ceil(limit),
        },
    })))
}

/// Updates title, description, activity or expiry of one of the caller's links
pub async fn update_short_url(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(patch): Json<LinkPatch>,
) -> Result<Json<ApiResponse<UrlResponse>>, ApiError> {
    let id = id.parse::<u64>().map_err(|_| ApiError::NotFound)?;

    let record = state
        .store
        .update(id, &owner, &patch)?
        .ok_or(ApiError::NotFound)?;
    info!(code = %record.short_code, "short link updated");

    Ok(Json(ApiResponse::ok(UrlResponse::from_record(
        record,
        &state.config.base_url,
    ))))
}

/// Permanently deletes one of the caller's links
pub async fn delete_short_url(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = id.parse::<u64>().map_err(|_| ApiError::NotFound)?;

    if !state.store.delete(id, &owner)? {
        return Err(ApiError::NotFound);
    }
    info!(id, owner = %owner, "short link deleted");

    Ok(Json(ApiResponse::<()>::message("URL deleted successfully")))
}

/// Dashboard totals for the caller
pub async fn user_stats(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<ApiResponse<StatsResponse>>, ApiError> {
    let stats = state.store.stats_for_owner(&owner)?;

    Ok(Json(ApiResponse::ok(StatsResponse {
        total_urls: stats.total_urls,
        total_clicks: stats.total_clicks,
        active_urls: stats.active_urls,
        recent_urls: stats
            .recent
            .into_iter()
            .map(|record| UrlResponse::from_record(record, &state.config.base_url))
            .collect(),
    })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::response::IntoResponse;

    use super::*;
    use crate::allocator::{Allocator, MAX_ALLOCATION_ATTEMPTS};
    use crate::config::Config;
    use crate::store::LinkStore;
    use crate::test_support::{new_link, temp_store, CountingStore};

    fn racing_state(lost_races: usize) -> (AppState, Arc<CountingStore>, tempfile::NamedTempFile) {
        let (store, file) = temp_store();
        let store = Arc::new(CountingStore::racing(store, lost_races));
        let state = AppState {
            store: store.clone() as Arc<dyn LinkStore>,
            allocator: Arc::new(Allocator::default()),
            config: Arc::new(Config::default()),
        };
        (state, store, file)
    }

    #[test]
    fn generated_code_is_redrawn_after_lost_insert_race() {
        let (state, store, _file) = racing_state(1);

        let record = insert_allocated(&state, None, new_link("", "alice")).unwrap();

        assert_eq!(store.inserts(), 2);
        assert!(state.store.find_by_code(&record.short_code).unwrap().is_some());
    }

    #[test]
    fn custom_code_losing_insert_race_is_a_conflict() {
        let (state, store, _file) = racing_state(1);

        let err = insert_allocated(&state, Some("mine"), new_link("", "alice")).unwrap_err();

        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
        assert_eq!(store.inserts(), 1);
        assert!(state.store.find_by_code("mine").unwrap().is_none());
    }

    #[test]
    fn insert_retries_stop_at_attempt_ceiling() {
        let (state, store, _file) = racing_state(usize::MAX);

        let err = insert_allocated(&state, None, new_link("", "alice")).unwrap_err();

        assert!(matches!(err, ApiError::Internal(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.inserts(), MAX_ALLOCATION_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn landing_page_explains_redirect_errors() {
        let landing_for = |error: Option<&str>| {
            landing(Query(LandingParams {
                error: error.map(str::to_string),
            }))
        };

        assert_eq!(landing_for(Some("not-found")).await.0, StatusCode::NOT_FOUND);
        assert_eq!(landing_for(Some("expired")).await.0, StatusCode::GONE);
        assert_eq!(
            landing_for(Some("server-error")).await.0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(landing_for(None).await.0, StatusCode::OK);
    }
}
