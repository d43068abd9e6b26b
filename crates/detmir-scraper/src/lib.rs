pub mod client;
pub mod description;
pub mod error;
pub mod normalize;
pub mod pagination;
pub mod query;
mod rate_limit;
pub mod types;

pub use client::{CategoryHarvest, DetmirClient};
pub use description::html_to_text;
pub use error::ScraperError;
pub use normalize::{normalize_listing, normalize_value};
pub use pagination::{next_offset, DriverState, ListingFailure, PageOutcome, PaginationDriver};
pub use query::{
    category_alias, CategoryTarget, PageRequest, QueryBuilder, QueryConfig, PAGE_LIMIT,
    PRODUCTS_PATH,
};
pub use types::RawListing;
