// Search-based IMDb id resolver
// The listing page carries titles only, so we search the web for
// "<title> imdb <current year>" and take the first imdb.com/title/<id>/ hit.
// Best-effort by design; the verifier is the correctness backstop.

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use regex::Regex;
use reqwest::{header, Client};

use crate::error::ResolutionError;
use crate::models::ImdbId;
use crate::services::TitleResolver;

/// Characters known to break the search backend when left in the query.
const FORBIDDEN_PUNCTUATION: &str = "!\"#$%&'()*,-./:;<=>?@[\\]^_`{|}~";

pub struct SearchResolver {
    client: Client,
    /// Search endpoint with a `{query}` placeholder.
    search_url: String,
    user_agent: String,
    id_pattern: Regex,
}

impl SearchResolver {
    pub fn new(search_url: String, user_agent: String) -> Self {
        Self {
            client: Client::new(),
            search_url,
            user_agent,
            // Non-greedy: the first path segment after /title/ is the id.
            id_pattern: Regex::new(r"imdb\.com/title/(.*?)/").unwrap(),
        }
    }

    /// Build the search query: words joined by '+', a current-year
    /// disambiguator appended, the forbidden punctuation set stripped, and
    /// everything else percent-encoded. The result never contains a raw
    /// space or a forbidden character.
    pub fn build_query(title: &str) -> String {
        let year = Utc::now().year();
        let mut words: Vec<String> = title
            .split_whitespace()
            .map(|word| {
                let cleaned: String = word
                    .chars()
                    .filter(|c| !FORBIDDEN_PUNCTUATION.contains(*c))
                    .collect();
                urlencoding::encode(&cleaned).into_owned()
            })
            .filter(|w| !w.is_empty())
            .collect();
        words.push("imdb".to_string());
        words.push(year.to_string());
        words.join("+")
    }

    /// First IMDb title token in a search response body, if any.
    pub fn extract_id(&self, body: &str) -> Option<ImdbId> {
        self.id_pattern
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| ImdbId(m.as_str().to_string()))
    }
}

#[async_trait]
impl TitleResolver for SearchResolver {
    async fn resolve(&self, title: &str) -> Result<ImdbId, ResolutionError> {
        let query = Self::build_query(title);
        let url = self.search_url.replace("{query}", &query);
        tracing::debug!("Searching for '{}' via {}", title, url);

        let body = self
            .client
            .get(&url)
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        match self.extract_id(&body) {
            Some(id) => {
                tracing::debug!("Resolved '{}' -> {}", title, id);
                Ok(id)
            }
            None => Err(ResolutionError::NoMatch {
                title: title.to_string(),
            }),
        }
    }
}
