//! Offset-based pagination for one category.
//!
//! The catalog endpoint has no cursor or total count. A page holding exactly
//! `limit` listings means another page may follow at `offset + limit`; a
//! shorter page (including an empty one) is the last.
//!
//! ## States
//!
//! ```text
//! Fetching(0) --full page--> Fetching(limit) --full page--> ... --short page--> Done
//!                                   \--non-array body--> Done (error returned)
//! ```
//!
//! The driver does no I/O. Callers fetch [`PaginationDriver::pending_request`]
//! and hand the body back through [`PaginationDriver::handle_page`]. Pages of
//! one category are strictly sequential; separate drivers share nothing.
//!
//! Termination relies on the API eventually returning a short page. The
//! driver does not cap page counts; the fetch engine does.

use chrono::{DateTime, Utc};
use detmir_core::CanonicalListing;

use crate::error::ScraperError;
use crate::normalize::normalize_value;
use crate::query::{CategoryTarget, PageRequest, QueryBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Fetching { offset: u32 },
    Done,
}

/// A listing that could not be normalized, with its position on the page.
#[derive(Debug)]
pub struct ListingFailure {
    /// Offset of the page the listing came from.
    pub page_offset: u32,
    /// Zero-based index within the page array.
    pub index: usize,
    /// Storefront ID when it could be read, for log correlation.
    pub listing_id: Option<String>,
    pub error: ScraperError,
}

/// What one page produced.
#[derive(Debug)]
pub struct PageOutcome {
    /// Successfully normalized listings in source order.
    pub listings: Vec<CanonicalListing>,
    /// Listings dropped from this page, in source order.
    pub failures: Vec<ListingFailure>,
    /// Number of elements in the page array, successes and failures alike.
    pub item_count: usize,
    /// The next page to fetch, or `None` when this was the last page.
    pub next_request: Option<PageRequest>,
}

/// Walks one category's pages: `Fetching(offset)` until a short page, then `Done`.
#[derive(Debug, Clone)]
pub struct PaginationDriver {
    builder: QueryBuilder,
    category: CategoryTarget,
    state: DriverState,
}

impl PaginationDriver {
    /// Starts in `Fetching(0)`.
    #[must_use]
    pub fn new(builder: QueryBuilder, category: CategoryTarget) -> Self {
        Self {
            builder,
            category,
            state: DriverState::Fetching { offset: 0 },
        }
    }

    #[must_use]
    pub fn category(&self) -> &CategoryTarget {
        &self.category
    }

    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == DriverState::Done
    }

    /// The request the caller should fetch next, or `None` once done.
    #[must_use]
    pub fn pending_request(&self) -> Option<PageRequest> {
        match self.state {
            DriverState::Fetching { offset } => {
                Some(self.builder.build_request(&self.category, offset))
            }
            DriverState::Done => None,
        }
    }

    /// Consumes the raw body of the pending page.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Deserialize`] if the body is not JSON.
    /// - [`ScraperError::UnexpectedResponseShape`] if it is JSON but not an array.
    /// - [`ScraperError::DriverFinished`] if the driver is already done.
    ///
    /// The first two move the driver to `Done`: without a page count the next
    /// offset cannot be trusted.
    pub fn handle_page(&mut self, body: &str) -> Result<PageOutcome, ScraperError> {
        self.handle_page_at(body, Utc::now())
    }

    /// [`Self::handle_page`] with an explicit capture timestamp.
    ///
    /// # Errors
    ///
    /// See [`Self::handle_page`].
    pub fn handle_page_at(
        &mut self,
        body: &str,
        captured_at: DateTime<Utc>,
    ) -> Result<PageOutcome, ScraperError> {
        let DriverState::Fetching { offset } = self.state else {
            return Err(ScraperError::DriverFinished {
                category: self.category.alias.clone(),
            });
        };

        let items = match parse_page(body, &self.category, offset) {
            Ok(items) => items,
            Err(e) => {
                self.state = DriverState::Done;
                return Err(e);
            }
        };

        let item_count = items.len();
        let (listings, failures) = normalize_page(items, offset, captured_at);

        for failure in &failures {
            tracing::warn!(
                category = %self.category,
                offset,
                index = failure.index,
                listing_id = failure.listing_id.as_deref().unwrap_or("<unknown>"),
                error = %failure.error,
                "skipping listing, normalization failed"
            );
        }

        let next_offset = next_offset(offset, item_count, self.builder.limit());
        self.state = match next_offset {
            Some(next) => DriverState::Fetching { offset: next },
            None => DriverState::Done,
        };

        tracing::debug!(
            category = %self.category,
            offset,
            item_count,
            normalized = listings.len(),
            failed = failures.len(),
            done = self.is_done(),
            "page processed"
        );

        Ok(PageOutcome {
            listings,
            failures,
            item_count,
            next_request: self.pending_request(),
        })
    }

    /// Stops pagination without consuming another page.
    pub fn cancel(&mut self) {
        self.state = DriverState::Done;
    }
}

/// Offset of the page after one at `offset` holding `item_count` listings.
///
/// `None` when the page was short. A full page whose successor offset would
/// overflow is also treated as the last.
#[must_use]
pub fn next_offset(offset: u32, item_count: usize, limit: u32) -> Option<u32> {
    let full = u32::try_from(item_count).is_ok_and(|count| count == limit) && limit > 0;
    if full {
        offset.checked_add(limit)
    } else {
        None
    }
}

fn parse_page(
    body: &str,
    category: &CategoryTarget,
    offset: u32,
) -> Result<Vec<serde_json::Value>, ScraperError> {
    let context = || format!("category {category} page at offset {offset}");
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|source| ScraperError::Deserialize {
            context: context(),
            source,
        })?;

    match value {
        serde_json::Value::Array(items) => Ok(items),
        other => Err(ScraperError::UnexpectedResponseShape {
            context: context(),
            found: json_kind(&other).to_string(),
        }),
    }
}

fn normalize_page(
    items: Vec<serde_json::Value>,
    page_offset: u32,
    captured_at: DateTime<Utc>,
) -> (Vec<CanonicalListing>, Vec<ListingFailure>) {
    let mut listings = Vec::with_capacity(items.len());
    let mut failures = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        let listing_id = item.get("id").and_then(|id| match id {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        match normalize_value(item, captured_at) {
            Ok(listing) => listings.push(listing),
            Err(error) => failures.push(ListingFailure {
                page_offset,
                index,
                listing_id,
                error,
            }),
        }
    }

    (listings, failures)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
