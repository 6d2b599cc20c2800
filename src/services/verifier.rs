use regex::Regex;

use crate::models::MovieMetadata;
use crate::services::similarity::edit_distance;

/// Names within this many edits (exclusive) count as the same film.
const MAX_NAME_DISTANCE: usize = 3;

/// Decides whether resolved metadata plausibly belongs to the scraped title.
/// The resolver trusts the first search hit, so this is the correctness
/// backstop: a name check (edit distance after lower-casing) and a
/// release-year cutoff that skips re-runs of old films.
pub struct MatchVerifier {
    year_cutoff: i32,
    year_pattern: Regex,
}

impl MatchVerifier {
    pub fn new(year_cutoff: i32) -> Self {
        Self {
            year_cutoff,
            // Unwrap is fine: pattern is a compile-time literal.
            year_pattern: Regex::new(r"\d{4}").unwrap(),
        }
    }

    pub fn verify(&self, original_title: &str, metadata: &MovieMetadata) -> bool {
        let distance = edit_distance(
            &original_title.to_lowercase(),
            &metadata.title.to_lowercase(),
        );
        if distance >= MAX_NAME_DISTANCE {
            tracing::debug!(
                "Name check failed for '{}' vs '{}' (distance {})",
                original_title,
                metadata.title,
                distance
            );
            return false;
        }

        // Year check fails open: missing or unparseable years pass.
        match self.release_year(metadata) {
            Some(year) if year < self.year_cutoff => {
                tracing::debug!(
                    "Year check failed for '{}': {} < {}",
                    metadata.title,
                    year,
                    self.year_cutoff
                );
                false
            }
            _ => true,
        }
    }

    /// First 4-digit run in the raw year field, if any.
    fn release_year(&self, metadata: &MovieMetadata) -> Option<i32> {
        let raw = metadata.year.as_deref()?;
        self.year_pattern
            .find(raw)
            .and_then(|m| m.as_str().parse().ok())
    }
}
