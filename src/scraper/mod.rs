// Listing page scraper
// The cinema site accepts a date filter parameter but embeds every date's
// showings in the document anyway, marking each item with data-date. So the
// parse re-filters on data-date instead of trusting the query string.

use reqwest::{header, Client};
use scraper::{Html, Selector};

use crate::error::ScrapeError;
use crate::models::ShowtimeEntry;

pub struct ScheduleScraper {
    client: Client,
    /// Listing endpoint with a `{date}` placeholder (YYYYMMDD).
    listing_url: String,
    user_agent: String,
}

impl ScheduleScraper {
    pub fn new(listing_url: String, user_agent: String) -> Self {
        Self {
            client: Client::new(),
            listing_url,
            user_agent,
        }
    }

    /// Fetch the listing page and parse the entries for `date`.
    pub async fn fetch(&self, date: &str) -> Result<Vec<ShowtimeEntry>, ScrapeError> {
        let url = self.listing_url.replace("{date}", date);
        tracing::debug!("Fetching listing page {}", url);

        let body = self
            .client
            .get(&url)
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_listing(&body, date)
    }
}

/// Parse listing markup into the entries whose data-date matches `date`.
/// Items with no showtimes left after filtering are dropped. A page missing
/// the expected structure fails the whole scrape: a partial schedule built
/// from a corrupted page is worse than an explicit error.
pub fn parse_listing(markup: &str, date: &str) -> Result<Vec<ShowtimeEntry>, ScrapeError> {
    let document = Html::parse_document(markup);

    let items_selector = selector("ul.items")?;
    let item_selector = selector(&format!("li[data-date=\"{}\"]", date))?;
    let title_selector = selector("div.content-wrap h3")?;
    let time_selector = selector("div.times span")?;

    let list = document
        .select(&items_selector)
        .next()
        .ok_or(ScrapeError::MissingStructure("ul.items container"))?;

    let mut entries = Vec::new();
    for item in list.select(&item_selector) {
        let title_element = item
            .select(&title_selector)
            .next()
            .ok_or(ScrapeError::MissingStructure("listing item without a title"))?;
        let title = title_element
            .text()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let showtimes: Vec<String> = item
            .select(&time_selector)
            .map(|span| span.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if showtimes.is_empty() {
            tracing::debug!("Skipping '{}': no showtimes on {}", title, date);
            continue;
        }

        entries.push(ShowtimeEntry { title, showtimes });
    }

    tracing::info!("Parsed {} entries for {}", entries.len(), date);
    Ok(entries)
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(e.to_string()))
}
