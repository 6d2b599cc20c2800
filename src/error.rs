use thiserror::Error;

/// Listing page could not be parsed. Fatal: a partial schedule built from a
/// corrupted page is worse than an explicit failure.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("failed to fetch listing page: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error("listing page missing expected structure: {0}")]
    MissingStructure(&'static str),
}

/// Title could not be resolved to an IMDb id. Non-fatal: degrades one entry.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("no IMDb id found in search results for '{title}'")]
    NoMatch { title: String },
    #[error("search request timed out")]
    Timeout,
}

/// Metadata could not be fetched or parsed. Non-fatal: degrades one entry.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("metadata request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unknown id {0}: {1}")]
    NotFound(String, String),
    #[error("unexpected metadata response: {0}")]
    Parse(String),
    #[error("metadata request timed out")]
    Timeout,
}
