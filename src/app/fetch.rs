use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::app::config::{ScrapeConfig, StageConfig};
use crate::app::error::FetchError;

/// Shared HTTP client. Cheap to clone; holds no per-call state.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &ScrapeConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(32)
            .build()?;
        Ok(Self { client })
    }

    /// GETs `url` and returns the body of a 2xx response.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Concurrency ceiling plus random inter-request delay for one crawl stage.
#[derive(Debug, Clone)]
pub struct StageLimiter {
    name: &'static str,
    permits: Arc<Semaphore>,
    max_delay: Duration,
}

impl StageLimiter {
    pub fn new(name: &'static str, config: StageConfig) -> Self {
        let config = config.sanitized();
        Self {
            name,
            permits: Arc::new(Semaphore::new(config.concurrency)),
            max_delay: config.max_delay,
        }
    }

    /// Waits for a free slot, then for this stage's jitter. The slot is held
    /// until the returned permit is dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        let permit = Arc::clone(&self.permits).acquire_owned().await?;
        let max_millis = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        if max_millis > 0 {
            let delay = rand::random_range(0..=max_millis);
            debug!(stage = self.name, delay_ms = delay, "stage jitter");
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(permit)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
