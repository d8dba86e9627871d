//! Redirect resolution
//!
//! `Lookup -> {NotFound | Found}`, `Found -> {Expired | Inactive | Valid}`,
//! `Valid -> increment clicks -> Redirect`. Activity and expiry are checked
//! before any click is recorded.

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::error::ResolutionError;
use crate::store::LinkStore;
use crate::validation::is_valid_code;

/// Where a visitor should be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub url: String,
}

/// Translates `code` into a redirect decision as of `now`.
///
/// Click counting is best effort: a failed increment is logged and the
/// redirect still goes through.
pub fn resolve(
    store: &dyn LinkStore,
    code: &str,
    now: DateTime<Utc>,
) -> Result<RedirectTarget, ResolutionError> {
    // Malformed codes can never have been allocated
    if !is_valid_code(code) {
        debug!(code, "malformed short code");
        return Err(ResolutionError::NotFound);
    }

    let record = match store.find_by_code(code) {
        Ok(Some(record)) if record.is_active => record,
        Ok(_) => {
            debug!(code, "no active link");
            return Err(ResolutionError::NotFound);
        }
        Err(err) => {
            error!(code, error = %err, "link lookup failed");
            return Err(err.into());
        }
    };

    if record.is_expired_at(now) {
        debug!(code, "link expired");
        return Err(ResolutionError::Expired);
    }

    if let Err(err) = store.increment_clicks(code) {
        warn!(code, error = %err, "failed to record click");
    }

    Ok(RedirectTarget {
        url: record.original_url,
    })
}
