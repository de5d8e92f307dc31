//! Endpoint normalization and history bookkeeping
//!
//! Users paste all kinds of things into the endpoint field: `http://` URLs
//! copied from a browser, host-only addresses, or the daemon's RPC path on
//! its own. Normalization turns each into the canonical form the rest of
//! the system stores, compares, and connects to:
//!
//! - surrounding whitespace is trimmed
//! - `http://` becomes `ws://`, `https://` becomes `wss://`
//! - a host-only URL (no path, or just `/`) gets the daemon's default RPC
//!   path appended
//! - anything else, including bare paths, passes through unchanged
//!
//! History is most-recent-first, deduplicated, and capped; it is rebuilt
//! from these rules on every load so a hand-edited or stale file cannot
//! leak junk into the UI.

use webrpc_core::{Error, Result};

/// Default daemon endpoint used on first startup
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:4701/api/webrpc/v0";

/// RPC path appended to host-only endpoints
pub const DEFAULT_RPC_PATH: &str = "/api/webrpc/v0";

/// Maximum number of endpoints kept in history
pub const HISTORY_LIMIT: usize = 5;

/// Normalize user input into a canonical endpoint string
///
/// Returns `None` for input that trims to nothing.
///
/// # Examples
///
/// ```rust
/// use webrpc_client::normalize_endpoint;
///
/// assert_eq!(
///     normalize_endpoint("http://192.168.1.230:4701/"),
///     Some("ws://192.168.1.230:4701/api/webrpc/v0".to_string())
/// );
/// assert_eq!(normalize_endpoint("   "), None);
/// ```
pub fn normalize_endpoint(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mapped = if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        trimmed.to_string()
    };

    let authority_start = match mapped.find("://") {
        Some(idx) if mapped.starts_with("ws") => idx + 3,
        // Bare paths and unknown schemes pass through unchanged.
        _ => return Some(mapped),
    };

    let after_authority = &mapped[authority_start..];
    match after_authority.find('/') {
        None => Some(format!("{mapped}{DEFAULT_RPC_PATH}")),
        Some(idx) if &after_authority[idx..] == "/" => Some(format!(
            "{}{}",
            &mapped[..authority_start + idx],
            DEFAULT_RPC_PATH
        )),
        Some(_) => Some(mapped),
    }
}

/// Derive the URL handed to the WebSocket transport
///
/// Absolute `ws(s)://` endpoints pass through; `http(s)://` is mapped to the
/// matching WebSocket scheme. Anything else (bare paths included) cannot be
/// dialed from here and is an error.
pub(crate) fn transport_url(endpoint: &str) -> Result<String> {
    let trimmed = endpoint.trim();
    if trimmed.starts_with("ws://") || trimmed.starts_with("wss://") {
        Ok(trimmed.to_string())
    } else if let Some(rest) = trimmed.strip_prefix("https://") {
        Ok(format!("wss://{rest}"))
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        Ok(format!("ws://{rest}"))
    } else {
        Err(Error::InvalidEndpoint(endpoint.to_string()))
    }
}

/// Prepend an endpoint to history, deduplicating and capping the result
pub(crate) fn push_history(history: &[String], endpoint: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(HISTORY_LIMIT);
    out.push(endpoint.to_string());
    for entry in history {
        if out.len() == HISTORY_LIMIT {
            break;
        }
        if entry != endpoint && !out.contains(entry) {
            out.push(entry.clone());
        }
    }
    out
}

/// Rebuild a loaded history list: normalize, dedupe, truncate
pub(crate) fn sanitize_history(raw: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(HISTORY_LIMIT);
    for entry in raw {
        if out.len() == HISTORY_LIMIT {
            break;
        }
        if let Some(normalized) = normalize_endpoint(entry) {
            if !out.contains(&normalized) {
                out.push(normalized);
            }
        }
    }
    out
}
