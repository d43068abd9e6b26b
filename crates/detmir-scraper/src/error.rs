use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed seed URL \"{seed_url}\": {reason}")]
    MalformedSeedUrl { seed_url: String, reason: String },

    #[error("listing is missing required field `{field}`")]
    MissingField { field: String },

    #[error("listing has a malformed field: {source}")]
    MalformedListing {
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected response shape for {context}: expected a JSON array, found {found}")]
    UnexpectedResponseShape { context: String, found: String },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("pagination limit reached for category {category}: exceeded {max_pages} pages")]
    PaginationLimit { category: String, max_pages: usize },

    #[error("pagination for category {category} is already finished")]
    DriverFinished { category: String },
}

impl ScraperError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}
