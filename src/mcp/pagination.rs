//! Pagination and response-size enforcement
//!
//! Every list-returning tool slices its candidate set through [`paginate`],
//! and the router passes every serialized response through [`SizeGuard`]
//! before it reaches a transport. The underlying gateway enforces an
//! absolute payload ceiling; without this layer an oversized listing
//! surfaced as a generic tool-call failure with no remediation path.

use crate::config::{DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_WARN_RESPONSE_BYTES};
use crate::error::{ClioError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default page size when the caller omits `pageSize`
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Upper clamp for `pageSize`
pub const MAX_PAGE_SIZE: usize = 100;

/// Pagination request parameters, flattened into every list tool's params
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    /// Zero-based page index
    #[serde(default)]
    pub page: Option<usize>,

    /// Items per page, clamped to [1, 100]
    #[serde(default)]
    pub page_size: Option<usize>,
}

impl PageParams {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(0)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

/// Pagination metadata returned alongside every page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_more: bool,
}

/// Slice a full candidate list into one page plus its metadata.
///
/// A page index past the end yields an empty page with `hasMore: false`
/// rather than an error, so callers can probe freely.
pub fn paginate<T: Clone>(items: &[T], params: &PageParams) -> (Vec<T>, Pagination) {
    let page = params.page();
    let page_size = params.page_size();
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);

    let start = page.saturating_mul(page_size).min(total_items);
    let end = start.saturating_add(page_size).min(total_items);
    let slice = items[start..end].to_vec();

    let meta = Pagination {
        page,
        page_size,
        total_pages,
        total_items,
        has_more: page + 1 < total_pages,
    };

    (slice, meta)
}

/// Byte-size guard applied to fully serialized responses
#[derive(Debug, Clone, Copy)]
pub struct SizeGuard {
    max_bytes: usize,
    warn_bytes: usize,
}

impl Default for SizeGuard {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            warn_bytes: DEFAULT_WARN_RESPONSE_BYTES,
        }
    }
}

impl SizeGuard {
    pub fn new(max_bytes: usize, warn_bytes: usize) -> Self {
        Self {
            max_bytes,
            warn_bytes: warn_bytes.min(max_bytes),
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Check a serialized response body. Over the ceiling is an error;
    /// between the warning threshold and the ceiling passes with a log line
    /// for observability.
    pub fn check(&self, serialized: &str) -> Result<()> {
        let size = serialized.len();
        if size > self.max_bytes {
            return Err(ClioError::ResponseTooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        if size > self.warn_bytes {
            warn!(
                "Response size {} bytes approaching limit of {} bytes",
                size, self.max_bytes
            );
        }
        Ok(())
    }
}
