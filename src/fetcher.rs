//! HTTP fetcher for downloading upstream rule lists.

use anyhow::{Context, Result};
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::RuleSource;
use crate::utils::format_bytes;

const TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 2000;

/// Maximum size per rule list file (10 MB)
/// The largest published lists are around 2 MB, so this leaves ample margin
const MAX_LIST_SIZE: usize = 10 * 1024 * 1024;

/// Maximum total size for all downloads combined (50 MB)
const MAX_TOTAL_SIZE: usize = 50 * 1024 * 1024;

/// HTTP client for fetching rule lists
pub struct Fetcher {
    client: Client,
    /// Cumulative download size tracker (thread-safe for concurrent fetches)
    total_downloaded: AtomicUsize,
}

impl Fetcher {
    /// Create a new fetcher with default settings
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(format!("ruleforge/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            total_downloaded: AtomicUsize::new(0),
        })
    }

    /// Get the total bytes downloaded so far
    pub fn total_downloaded(&self) -> usize {
        self.total_downloaded.load(Ordering::Relaxed)
    }

    /// Fetch a single rule list with retry logic
    pub async fn fetch_source(&self, source: &RuleSource) -> Result<String> {
        info!("Fetching {}...", source.name);

        let content = self
            .fetch_with_retry(&source.url)
            .await
            .with_context(|| format!("Failed to fetch {}", source.name))?;

        info!("Fetched {} - {}", source.name, format_bytes(content.len() as u64));

        Ok(content)
    }

    /// Fetch every source with limited parallelism, yielding results in
    /// declaration order.
    ///
    /// Later stages give the first source to publish an entry precedence,
    /// so the result order must match the source list regardless of which
    /// download finishes first. `buffered` (not `buffer_unordered`) keeps
    /// that guarantee while still running requests concurrently.
    pub async fn fetch_sources(&self, sources: &[&RuleSource]) -> Vec<Result<String>> {
        use futures::stream::{self, StreamExt};

        /// Maximum concurrent HTTP requests to upstream servers
        const MAX_CONCURRENT_REQUESTS: usize = 6;

        stream::iter(sources.iter().map(|source| self.fetch_source(source)))
            .buffered(MAX_CONCURRENT_REQUESTS)
            .collect()
            .await
    }

    /// Fetch content with retry logic and size validation.
    ///
    /// Transport errors and non-success statuses are retried with
    /// exponential backoff; size limit violations are not (an oversized
    /// list stays oversized).
    async fn fetch_with_retry(&self, url: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = RETRY_DELAY_MS * (1 << (attempt - 1));
                debug!("Retry {} after {}ms for {}", attempt, delay, url);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let response = match self.client.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    last_error = Some(anyhow::Error::from(e));
                    continue;
                }
            };

            if !response.status().is_success() {
                last_error = Some(anyhow::anyhow!("HTTP {}", response.status()));
                continue;
            }

            // Reject on the declared length before pulling the body
            if let Some(declared) = response.content_length() {
                self.check_size_limits(declared as usize)?;
            }

            let body = response
                .text()
                .await
                .context("Failed to read response body")?;

            // The declared length is advisory; re-check what actually arrived
            self.check_size_limits(body.len())?;
            self.total_downloaded.fetch_add(body.len(), Ordering::Relaxed);

            return Ok(body);
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Unknown error")))
    }

    /// Enforce the per-list and cumulative download caps.
    fn check_size_limits(&self, size: usize) -> Result<()> {
        if size > MAX_LIST_SIZE {
            anyhow::bail!(
                "List too large: {} (limit {})",
                format_bytes(size as u64),
                format_bytes(MAX_LIST_SIZE as u64)
            );
        }

        let running_total = self.total_downloaded.load(Ordering::Relaxed);
        if running_total + size > MAX_TOTAL_SIZE {
            anyhow::bail!(
                "Cumulative download limit exceeded: {} + {} over a {} cap",
                format_bytes(running_total as u64),
                format_bytes(size as u64),
                format_bytes(MAX_TOTAL_SIZE as u64)
            );
        }

        Ok(())
    }
}
