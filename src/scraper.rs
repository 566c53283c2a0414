use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::try_join_all;
use once_cell::sync::Lazy;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, ClientBuilder};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::catalog::TitleRecord;
use crate::error::{AppError, Result};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const NO_SYNOPSIS: &str = "No description available.";
pub const UNKNOWN_RELEASE_DATE: &str = "Unknown release date";

// Create static selectors to avoid recompiling them each time
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1").expect("Failed to parse title selector"));
static GENRE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".ipc-chip__text").expect("Failed to parse genre selector"));
static PLOT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"span[data-testid="plot-xl"]"#).expect("Failed to parse plot selector")
});
static RELEASE_DATE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"li[data-testid="title-details-releasedate"] a"#)
        .expect("Failed to parse release date selector")
});

/// Retrieves raw page markup for a URL.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Fetches pages over HTTPS with headers a desktop browser would send; IMDb
/// serves a stripped page to anything else.
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = ClientBuilder::new()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let html = response.text().await?;
        Ok(html)
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Pulls the title fields out of an IMDb title page.
pub fn extract_title(html: &str, url: &str) -> TitleRecord {
    let document = Html::parse_document(html);

    let genres = document
        .select(&GENRE_SELECTOR)
        .map(element_text)
        .filter(|genre| !genre.is_empty())
        .collect();

    TitleRecord {
        title: first_text(&document, &TITLE_SELECTOR).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        genres,
        synopsis: Some(
            first_text(&document, &PLOT_SELECTOR).unwrap_or_else(|| NO_SYNOPSIS.to_string()),
        ),
        release_date: Some(
            first_text(&document, &RELEASE_DATE_SELECTOR)
                .unwrap_or_else(|| UNKNOWN_RELEASE_DATE.to_string()),
        ),
        source_url: Some(url.to_string()),
    }
}

async fn fetch_title(source: &dyn PageSource, url: &str, timeout: Duration) -> Result<TitleRecord> {
    let start = Instant::now();

    let html = match tokio::time::timeout(timeout, source.fetch_page(url)).await {
        Ok(Ok(html)) => html,
        Ok(Err(e)) => {
            warn!(%url, error = %e, "title fetch failed");
            return Err(e);
        }
        Err(_) => {
            warn!(%url, ?timeout, "title fetch timed out");
            return Err(AppError::FetchError(format!(
                "Fetching {} timed out after {:?}",
                url, timeout
            )));
        }
    };
    debug!(%url, elapsed = ?start.elapsed(), bytes = html.len(), "fetched title page");

    Ok(extract_title(&html, url))
}

/// Fetches every URL concurrently. The output keeps the input order, and the
/// first failure fails the whole batch.
pub async fn fetch_all(
    source: &dyn PageSource,
    urls: &[String],
    timeout: Duration,
) -> Result<Vec<TitleRecord>> {
    if urls.is_empty() {
        return Ok(Vec::new());
    }

    let start = Instant::now();
    let records = try_join_all(urls.iter().map(|url| fetch_title(source, url, timeout))).await?;
    info!(count = records.len(), elapsed = ?start.elapsed(), "fetched title metadata");

    Ok(records)
}
