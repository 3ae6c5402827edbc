use crate::types::{AggregatorError, FetchConfig, Result};
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Thin HTTP layer shared by the paper sources.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// GET `url` with `query` and return the body. Non-2xx answers are errors.
    pub async fn fetch_text(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        let start_time = Instant::now();
        debug!("Fetching {} {:?}", url, query);

        let mut request = self.client.get(url).query(query);
        if let Some(accept) = &self.config.accept {
            request = request.header(ACCEPT, accept);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AggregatorError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content = response.text().await?;
        info!(
            "Fetched {} ({} bytes in {}ms)",
            url,
            content.len(),
            start_time.elapsed().as_millis()
        );
        Ok(content)
    }

    /// Sleep for the configured per-source request delay.
    pub async fn pause(&self) {
        let delay = self.config.request_delay;
        if !delay.is_zero() {
            debug!("Rate limiting: waiting {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }
}
