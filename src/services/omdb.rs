// OMDb metadata client
// API Documentation: https://www.omdbapi.com/
// One JSON object per IMDb id; Response: "False" is the not-found marker and
// must be checked before trusting any other field.

use std::num::NonZeroUsize;

use async_trait::async_trait;
use lru::LruCache;
use reqwest::{header, Client};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::MetadataError;
use crate::models::{ImdbId, MovieMetadata};
use crate::services::MetadataProvider;

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Raw OMDb response shape. Fields beyond these exist but are not consumed.
#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "Plot")]
    plot: Option<String>,
}

/// Bounded LRU memo of successful fetches, shared for the process lifetime.
/// Read-through: concurrent misses for the same id may both fetch, last
/// write wins. Entries are immutable once fetched, so no invalidation.
struct MetadataCache {
    inner: Mutex<LruCache<ImdbId, MovieMetadata>>,
}

impl MetadataCache {
    fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap());
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    async fn get(&self, id: &ImdbId) -> Option<MovieMetadata> {
        self.inner.lock().await.get(id).cloned()
    }

    async fn put(&self, id: ImdbId, metadata: MovieMetadata) {
        self.inner.lock().await.put(id, metadata);
    }
}

/// OMDb API client with bounded memoization. The API key is an explicit
/// constructor argument, never read from the environment at call time.
pub struct OmdbClient {
    client: Client,
    api_url: String,
    api_key: String,
    user_agent: String,
    cache: MetadataCache,
}

impl OmdbClient {
    pub fn new(
        api_url: String,
        api_key: String,
        user_agent: String,
        cache_capacity: usize,
    ) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
            user_agent,
            cache: MetadataCache::new(cache_capacity),
        }
    }

    async fn fetch_uncached(&self, id: &ImdbId) -> Result<MovieMetadata, MetadataError> {
        let url = format!(
            "{}?i={}&apikey={}",
            self.api_url,
            urlencoding::encode(&id.0),
            self.api_key
        );

        let body = self
            .client
            .get(&url)
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await?
            .text()
            .await?;

        parse_response(&body, id)
    }
}

#[async_trait]
impl MetadataProvider for OmdbClient {
    async fn fetch(&self, id: &ImdbId) -> Result<MovieMetadata, MetadataError> {
        if let Some(hit) = self.cache.get(id).await {
            tracing::debug!("Metadata cache hit for {}", id);
            return Ok(hit);
        }

        let metadata = self.fetch_uncached(id).await?;
        tracing::info!("Fetched metadata for {}: {}", id, metadata.title);
        self.cache.put(id.clone(), metadata.clone()).await;
        Ok(metadata)
    }
}

/// Parse an OMDb body into metadata, checking the not-found marker first.
/// OMDb reports absent fields as the literal string "N/A".
fn parse_response(body: &str, id: &ImdbId) -> Result<MovieMetadata, MetadataError> {
    let raw: OmdbResponse =
        serde_json::from_str(body).map_err(|e| MetadataError::Parse(e.to_string()))?;

    if !raw.response.eq_ignore_ascii_case("true") {
        return Err(MetadataError::NotFound(
            id.0.clone(),
            raw.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    let title = field(raw.title)
        .ok_or_else(|| MetadataError::Parse("response missing Title".to_string()))?;

    Ok(MovieMetadata {
        title,
        year: field(raw.year),
        // "NaN"/"inf" parse as f64 but would poison rating comparisons.
        rating: field(raw.imdb_rating)
            .and_then(|r| r.parse().ok())
            .filter(|r: &f64| r.is_finite()),
        plot: field(raw.plot),
    })
}

fn field(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != "N/A")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    fn id() -> ImdbId {
        ImdbId("tt4975722".to_string())
    }

    fn meta(title: &str) -> MovieMetadata {
        MovieMetadata {
            title: title.to_string(),
            year: Some("2016".to_string()),
            rating: Some(7.4),
            plot: Some("A young man grows up in Miami.".to_string()),
        }
    }

    #[test]
    fn test_parse_full_response() {
        let body = r#"{
            "Title": "Moonlight",
            "Year": "2016",
            "Plot": "A young man grows up in Miami.",
            "imdbRating": "7.4",
            "Response": "True"
        }"#;
        let parsed = parse_response(body, &id()).unwrap();
        assert_eq!(parsed.title, "Moonlight");
        assert_eq!(parsed.year.as_deref(), Some("2016"));
        assert_eq!(parsed.rating, Some(7.4));
        assert!(parsed.plot.is_some());
    }

    #[test]
    fn test_parse_not_found_marker() {
        let body = r#"{"Response":"False","Error":"Incorrect IMDb ID."}"#;
        match parse_response(body, &id()) {
            Err(MetadataError::NotFound(_, msg)) => assert_eq!(msg, "Incorrect IMDb ID."),
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_parse_na_fields_normalize_to_none() {
        let body = r#"{
            "Title": "Obscure Film",
            "Year": "N/A",
            "Plot": "N/A",
            "imdbRating": "N/A",
            "Response": "True"
        }"#;
        let parsed = parse_response(body, &id()).unwrap();
        assert_eq!(parsed.year, None);
        assert_eq!(parsed.rating, None);
        assert_eq!(parsed.plot, None);
    }

    #[test]
    fn test_parse_non_finite_rating_normalizes_to_none() {
        for bad in ["NaN", "inf", "-inf"] {
            let body = format!(
                r#"{{"Title":"Moonlight","Year":"2016","Plot":"p","imdbRating":"{}","Response":"True"}}"#,
                bad
            );
            let parsed = parse_response(&body, &id()).unwrap();
            assert_eq!(parsed.rating, None, "rating '{}' should be rejected", bad);
        }
    }

    #[test]
    fn test_parse_garbage_body() {
        assert!(matches!(
            parse_response("<html>rate limited</html>", &id()),
            Err(MetadataError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        // Unroutable endpoint: any real fetch attempt would error out.
        let client = OmdbClient::new(
            "http://127.0.0.1:1/".to_string(),
            "key".to_string(),
            "test".to_string(),
            4,
        );
        client.cache.put(id(), meta("Moonlight")).await;

        let first = client.fetch(&id()).await.unwrap();
        let second = client.fetch(&id()).await.unwrap();
        assert_eq!(first.title, "Moonlight");
        assert_eq!(first, second);
    }

    /// Serve one canned OMDb body per connection, counting connections.
    async fn canned_omdb_server(body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let server_hits = hits.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                server_hits.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });

        (format!("http://{}/", addr), hits)
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let body = r#"{
            "Title": "Moonlight",
            "Year": "2016",
            "Plot": "A young man grows up in Miami.",
            "imdbRating": "7.4",
            "Response": "True"
        }"#;
        let (api_url, hits) = canned_omdb_server(body).await;
        let client = OmdbClient::new(api_url, "key".to_string(), "test".to_string(), 4);

        let first = client.fetch(&id()).await.unwrap();
        let second = client.fetch(&id()).await.unwrap();

        assert_eq!(first.title, "Moonlight");
        assert_eq!(first, second);
        // The second call is a cache hit: exactly one request went out.
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_miss_reaches_network() {
        let client = OmdbClient::new(
            "http://127.0.0.1:1/".to_string(),
            "key".to_string(),
            "test".to_string(),
            4,
        );
        assert!(client.fetch(&id()).await.is_err());
    }

    #[tokio::test]
    async fn test_cache_evicts_least_recently_used() {
        let cache = MetadataCache::new(2);
        let a = ImdbId("tt0000001".to_string());
        let b = ImdbId("tt0000002".to_string());
        let c = ImdbId("tt0000003".to_string());

        cache.put(a.clone(), meta("A")).await;
        cache.put(b.clone(), meta("B")).await;
        // Touch A so B becomes least recently used.
        assert!(cache.get(&a).await.is_some());
        cache.put(c.clone(), meta("C")).await;

        assert!(cache.get(&a).await.is_some());
        assert!(cache.get(&b).await.is_none());
        assert!(cache.get(&c).await.is_some());
    }

    #[tokio::test]
    async fn test_zero_capacity_falls_back_to_default() {
        let cache = MetadataCache::new(0);
        cache.put(id(), meta("Moonlight")).await;
        assert!(cache.get(&id()).await.is_some());
    }
}
