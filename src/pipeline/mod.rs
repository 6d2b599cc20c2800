// Schedule assembly pipeline
// Each scraped entry runs resolve -> fetch -> verify as one unit of work.
// Per-entry failures degrade that entry to "unavailable"; only a scrape
// failure is fatal to the run.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::stream::{self, StreamExt};

use crate::config::AppConfig;
use crate::models::{EnrichedMovie, MovieDetails, ShowtimeEntry};
use crate::scraper::ScheduleScraper;
use crate::services::omdb::OmdbClient;
use crate::services::resolver::SearchResolver;
use crate::services::verifier::MatchVerifier;
use crate::services::{MetadataProvider, TitleResolver};

pub struct ScheduleAssembler<R, M> {
    resolver: Arc<R>,
    metadata: Arc<M>,
    verifier: Arc<MatchVerifier>,
    max_workers: usize,
    step_timeout: Duration,
}

impl<R, M> ScheduleAssembler<R, M>
where
    R: TitleResolver + 'static,
    M: MetadataProvider + 'static,
{
    pub fn new(
        resolver: Arc<R>,
        metadata: Arc<M>,
        verifier: MatchVerifier,
        max_workers: usize,
        step_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            metadata,
            verifier: Arc::new(verifier),
            max_workers: max_workers.max(1),
            step_timeout,
        }
    }

    /// Enrich all entries under a bounded worker pool, then sort by rating.
    /// Entries come back in scrape order before sorting, so the stable sort
    /// preserves page order among ties and among unavailable entries.
    pub async fn assemble(&self, raw: Vec<ShowtimeEntry>) -> Vec<EnrichedMovie> {
        let total = raw.len();
        let mut slots: Vec<Option<EnrichedMovie>> = (0..total).map(|_| None).collect();

        // Spawn each entry as an independent task so it makes progress
        // regardless of stream polling; buffer_unordered bounds how many
        // run at once.
        let mut results = stream::iter(raw.into_iter().enumerate())
            .map(|(index, entry)| {
                let resolver = self.resolver.clone();
                let metadata = self.metadata.clone();
                let verifier = self.verifier.clone();
                let timeout = self.step_timeout;
                tokio::spawn(async move {
                    let movie =
                        enrich_entry(&*resolver, &*metadata, &verifier, timeout, entry).await;
                    (index, movie)
                })
            })
            .buffer_unordered(self.max_workers);

        while let Some(joined) = results.next().await {
            match joined {
                Ok((index, movie)) => slots[index] = Some(movie),
                Err(e) => tracing::error!("Enrichment task panicked: {}", e),
            }
        }

        let mut schedule: Vec<EnrichedMovie> = slots.into_iter().flatten().collect();
        sort_by_rating(&mut schedule);
        schedule
    }
}

/// One entry's three-step pipeline. Every failure path collapses to the
/// same unavailable record; real and absent fields never mix.
async fn enrich_entry<R, M>(
    resolver: &R,
    metadata: &M,
    verifier: &MatchVerifier,
    step_timeout: Duration,
    entry: ShowtimeEntry,
) -> EnrichedMovie
where
    R: TitleResolver + ?Sized,
    M: MetadataProvider + ?Sized,
{
    let resolved = match tokio::time::timeout(step_timeout, resolver.resolve(&entry.title)).await {
        Ok(result) => result,
        Err(_) => Err(crate::error::ResolutionError::Timeout),
    };
    let id = match resolved {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Could not resolve '{}': {}", entry.title, e);
            return EnrichedMovie::unavailable(entry);
        }
    };

    let fetched = match tokio::time::timeout(step_timeout, metadata.fetch(&id)).await {
        Ok(result) => result,
        Err(_) => Err(crate::error::MetadataError::Timeout),
    };
    let meta = match fetched {
        Ok(meta) => meta,
        Err(e) => {
            tracing::warn!("Metadata fetch failed for '{}' ({}): {}", entry.title, id, e);
            return EnrichedMovie::unavailable(entry);
        }
    };

    if !verifier.verify(&entry.title, &meta) {
        tracing::info!(
            "Rejected match for '{}': resolved to '{}' ({})",
            entry.title,
            meta.title,
            id
        );
        return EnrichedMovie::unavailable(entry);
    }

    match (meta.rating, meta.plot) {
        (Some(rating), Some(description)) => EnrichedMovie {
            title: entry.title,
            showtimes: entry.showtimes,
            details: Some(MovieDetails {
                rating,
                url: id.detail_url(),
                description,
            }),
        },
        _ => {
            tracing::debug!("Metadata for {} lacks rating or plot, degrading", id);
            EnrichedMovie::unavailable(entry)
        }
    }
}

/// Rated entries first, rating descending; unavailable entries after all
/// rated ones. Stable, so scrape order survives among equals.
pub fn sort_by_rating(schedule: &mut [EnrichedMovie]) {
    schedule.sort_by(|a, b| match (&a.details, &b.details) {
        // total_cmp keeps the comparator a total order even if a non-finite
        // rating slips through a provider.
        (Some(x), Some(y)) => y.rating.total_cmp(&x.rating),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Pipeline entry point: scrape the listing for `date`, enrich every entry,
/// return the sorted schedule. Scrape failures propagate; per-entry failures
/// are already degraded inside the assembler.
pub async fn fetch_schedule(config: &AppConfig, date: &str) -> anyhow::Result<Vec<EnrichedMovie>> {
    let listing_url = config
        .listing_url
        .clone()
        .context("cinema.listing_url is not configured")?;
    let api_key = config
        .omdb_api_key
        .clone()
        .context("metadata.api_key is not configured (set OMDB_API_KEY)")?;

    let scraper = ScheduleScraper::new(listing_url, config.user_agent.clone());
    let raw = scraper.fetch(date).await?;

    let resolver = Arc::new(SearchResolver::new(
        config.search_url.clone(),
        config.user_agent.clone(),
    ));
    let metadata = Arc::new(OmdbClient::new(
        config.omdb_url.clone(),
        api_key,
        config.user_agent.clone(),
        config.cache_capacity,
    ));
    let assembler = ScheduleAssembler::new(
        resolver,
        metadata,
        MatchVerifier::new(config.year_cutoff),
        config.max_workers,
        Duration::from_secs(config.request_timeout_secs),
    );

    Ok(assembler.assemble(raw).await)
}
