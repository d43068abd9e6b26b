//! Sequential multi-page harvest of one category.

use std::time::Duration;

use detmir_core::CanonicalListing;

use crate::error::ScraperError;
use crate::pagination::{ListingFailure, PaginationDriver};
use crate::query::{CategoryTarget, QueryBuilder};

use super::DetmirClient;

/// Everything one category produced, including the records gathered before
/// a page-level failure.
#[derive(Debug)]
pub struct CategoryHarvest {
    pub category: CategoryTarget,
    /// Canonical records in page order, then source order within a page.
    pub listings: Vec<CanonicalListing>,
    /// Listings dropped by normalization.
    pub failures: Vec<ListingFailure>,
    pub pages_fetched: usize,
    /// The error that ended pagination early, if any.
    pub error: Option<ScraperError>,
}

impl CategoryHarvest {
    fn new(category: CategoryTarget) -> Self {
        Self {
            category,
            listings: Vec::new(),
            failures: Vec::new(),
            pages_fetched: 0,
            error: None,
        }
    }

    /// `true` when pagination ran to a short page without a page-level error.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

impl DetmirClient {
    /// Harvests every page of `category`, one request at a time.
    ///
    /// `inter_request_delay_ms` is the delay in milliseconds between page
    /// requests (applied after every page except the first). At most
    /// `max_pages` pages are fetched; a category still returning full pages
    /// at that point ends with [`ScraperError::PaginationLimit`].
    ///
    /// **Partial results are kept**: a page that fails after retries, or whose
    /// body is not a JSON array, stops the chain and is recorded in
    /// [`CategoryHarvest::error`], but every listing normalized from earlier
    /// pages is still returned.
    pub async fn harvest_category(
        &self,
        builder: &QueryBuilder,
        category: CategoryTarget,
        inter_request_delay_ms: u64,
        max_pages: usize,
    ) -> CategoryHarvest {
        let mut driver = PaginationDriver::new(builder.clone(), category.clone());
        let mut harvest = CategoryHarvest::new(category);

        while let Some(request) = driver.pending_request() {
            if harvest.pages_fetched >= max_pages {
                driver.cancel();
                harvest.error = Some(ScraperError::PaginationLimit {
                    category: harvest.category.alias.clone(),
                    max_pages,
                });
                break;
            }

            if harvest.pages_fetched > 0 && inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
            }

            let body = match self.fetch_page(&request).await {
                Ok(body) => body,
                Err(e) => {
                    driver.cancel();
                    harvest.error = Some(e);
                    break;
                }
            };
            harvest.pages_fetched += 1;

            match driver.handle_page(&body) {
                Ok(outcome) => {
                    harvest.listings.extend(outcome.listings);
                    harvest.failures.extend(outcome.failures);
                }
                Err(e) => {
                    harvest.error = Some(e);
                    break;
                }
            }
        }

        if let Some(error) = &harvest.error {
            tracing::warn!(
                category = %harvest.category,
                pages = harvest.pages_fetched,
                kept = harvest.listings.len(),
                error = %error,
                "category pagination stopped early"
            );
        } else {
            tracing::info!(
                category = %harvest.category,
                pages = harvest.pages_fetched,
                listings = harvest.listings.len(),
                skipped = harvest.failures.len(),
                "category harvested"
            );
        }

        harvest
    }
}
