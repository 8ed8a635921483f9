//! Utility functions for the annotation client.
//!
//! This module provides helper functions for:
//! - Input validation (annotation ids)
//! - Annotation id extraction and path-segment encoding
//! - Status code classification for DELETE and POST
//! - Retry backoff
//!
//! # Examples
//!
//! ```
//! use triannon_client::client::{classify_delete, linear_backoff, DeleteStatus};
//! use std::time::Duration;
//!
//! assert_eq!(classify_delete(204), DeleteStatus::Deleted);
//! assert_eq!(classify_delete(410), DeleteStatus::Gone);
//! assert_eq!(linear_backoff(2, 1000), Duration::from_secs(2));
//! ```

use crate::error::{AnnotationError, Result};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::time::Duration;
use url::Url;

/// Characters that cannot appear literally inside one path segment.
///
/// `%` is deliberately absent so that already-encoded ids pass through unchanged.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'^')
    .add(b'|')
    .add(b'[')
    .add(b']');

/// How a DELETE response is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// 200, 202 or 204
    Deleted,
    /// 404 or 410; the annotation is already gone, which counts as success
    Gone,
    /// 401; re-authenticate and retry once
    Unauthorized,
    /// Anything else
    Failed,
}

impl DeleteStatus {
    /// True for outcomes reported to the caller as success.
    pub fn is_success(&self) -> bool {
        matches!(self, DeleteStatus::Deleted | DeleteStatus::Gone)
    }
}

/// Classify a DELETE status code.
pub fn classify_delete(status: u16) -> DeleteStatus {
    match status {
        200 | 202 | 204 => DeleteStatus::Deleted,
        404 | 410 => DeleteStatus::Gone,
        401 => DeleteStatus::Unauthorized,
        _ => DeleteStatus::Failed,
    }
}

/// Check if status code is a 2xx success
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Check if status code asks for (re-)authentication
pub fn is_unauthorized_status(status: u16) -> bool {
    status == 401
}

/// Linear backoff delay: attempt `n` waits `n * base_ms`
pub fn linear_backoff(attempt: u32, base_ms: u64) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(u64::from(attempt)))
}

/// Validate an annotation id.
///
/// Any non-empty string is accepted except the dot segments `.` and `..` (also in
/// percent-encoded form), which would resolve to the container or its parent.
///
/// # Errors
///
/// [`AnnotationError::InvalidArgument`] for an empty id or a dot segment.
pub fn check_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(AnnotationError::invalid("Invalid ID: an annotation ID must be a non-empty string"));
    }
    let decoded = percent_decode_str(id).decode_utf8_lossy();
    if decoded == "." || decoded == ".." {
        return Err(AnnotationError::invalid(format!(
            "Invalid ID: '{}' does not name an annotation inside the container",
            id
        )));
    }
    Ok(())
}

/// Percent-encode an id for use as a single path segment.
///
/// Existing `%XX` escapes are kept, so encoding is idempotent.
pub fn encode_segment(id: &str) -> String {
    utf8_percent_encode(id, SEGMENT).to_string()
}

/// Extract an annotation id from its URI.
///
/// The id is the path after `container_path`; URIs outside the container fall back
/// to their last non-empty path segment.
///
/// # Errors
///
/// [`AnnotationError::InvalidArgument`] when the URI carries no id.
pub fn annotation_id_from(uri: &Url, container_path: &str) -> Result<String> {
    let path = uri.path();
    let suffix = match path.strip_prefix(container_path) {
        Some(suffix) => suffix.trim_end_matches('/'),
        None => path.split('/').filter(|s| !s.is_empty()).last().unwrap_or_default(),
    };

    if suffix.is_empty() {
        return Err(AnnotationError::invalid(format!("no annotation ID in URI {}", uri)));
    }
    Ok(encode_segment(suffix))
}
