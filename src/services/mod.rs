// Services module - enrichment pipeline building blocks

pub mod omdb;
pub mod resolver;
pub mod similarity;
pub mod verifier;

use async_trait::async_trait;

use crate::error::{MetadataError, ResolutionError};
use crate::models::{ImdbId, MovieMetadata};

/// Seam over the search-based resolver so the pipeline can run against
/// in-memory fakes in tests.
#[async_trait]
pub trait TitleResolver: Send + Sync {
    async fn resolve(&self, title: &str) -> Result<ImdbId, ResolutionError>;
}

/// Seam over the metadata backend.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn fetch(&self, id: &ImdbId) -> Result<MovieMetadata, MetadataError>;
}
