use serde::{Deserialize, Serialize};

/// One listing-page item after date filtering: a title plus the showtimes
/// scheduled for the target date, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowtimeEntry {
    pub title: String,
    pub showtimes: Vec<String>,
}

/// Opaque IMDb title token ("tt0133093"). Best-effort guess from the
/// resolver; the verifier decides whether to trust it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImdbId(pub String);

impl ImdbId {
    /// Canonical detail URL for this id.
    pub fn detail_url(&self) -> String {
        format!("https://imdb.com/title/{}", self.0)
    }
}

impl std::fmt::Display for ImdbId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata fetched once per id and memoized. `year` is the raw release
/// field as returned by the backend ("2016", "2016–2018", ...); the verifier
/// extracts the 4-digit year from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieMetadata {
    pub title: String,
    pub year: Option<String>,
    pub rating: Option<f64>,
    pub plot: Option<String>,
}

/// Enriched fields, present all-or-nothing. A failed resolution, fetch, or
/// verification leaves the whole struct absent rather than a partial mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub rating: f64,
    pub url: String,
    pub description: String,
}

/// Final schedule record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedMovie {
    pub title: String,
    pub showtimes: Vec<String>,
    pub details: Option<MovieDetails>,
}

impl EnrichedMovie {
    pub fn unavailable(entry: ShowtimeEntry) -> Self {
        Self {
            title: entry.title,
            showtimes: entry.showtimes,
            details: None,
        }
    }
}
