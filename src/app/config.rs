use std::time::Duration;

use url::Url;

use crate::app::images::PLACEHOLDER_POSTER;

pub const DEFAULT_ORIGIN: &str = "https://letterboxd.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const MAX_STAGE_CONCURRENCY: usize = 256;

pub fn sanitize_concurrency(value: usize) -> usize {
    value.clamp(1, MAX_STAGE_CONCURRENCY)
}

/// Concurrency ceiling and jitter for one crawl stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageConfig {
    pub concurrency: usize,
    pub max_delay: Duration,
}

impl StageConfig {
    pub const fn new(concurrency: usize, max_delay: Duration) -> Self {
        Self {
            concurrency,
            max_delay,
        }
    }

    pub fn sanitized(self) -> Self {
        Self {
            concurrency: sanitize_concurrency(self.concurrency),
            max_delay: self.max_delay,
        }
    }
}

/// Tunables for one resolver instance. Built once at startup and shared
/// read-only by every resolution call.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub origin: Url,
    pub placeholder_poster: String,
    pub user_agent: String,
    /// Hard cap on films kept per call.
    pub max_films: usize,
    /// Number of earliest-discovered films that also get an overview.
    pub overview_budget: usize,
    pub max_listing_pages: usize,
    pub poster_timeout: Duration,
    pub request_timeout: Duration,
    pub listing: StageConfig,
    pub poster: StageConfig,
    pub detail: StageConfig,
}

impl ScrapeConfig {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            placeholder_poster: PLACEHOLDER_POSTER.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_films: 50,
            overview_budget: 10,
            max_listing_pages: 25,
            poster_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(20),
            listing: StageConfig::new(100, Duration::from_millis(250)),
            poster: StageConfig::new(100, Duration::from_millis(50)),
            detail: StageConfig::new(20, Duration::from_millis(100)),
        }
    }

    pub fn with_max_films(mut self, max_films: usize) -> Self {
        self.max_films = max_films;
        self
    }

    pub fn with_overview_budget(mut self, budget: usize) -> Self {
        self.overview_budget = budget;
        self
    }

    pub fn with_max_listing_pages(mut self, pages: usize) -> Self {
        self.max_listing_pages = pages.max(1);
        self
    }

    pub fn with_poster_timeout(mut self, timeout: Duration) -> Self {
        self.poster_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_placeholder_poster(mut self, url: impl Into<String>) -> Self {
        self.placeholder_poster = url.into();
        self
    }

    pub fn with_stages(
        mut self,
        listing: StageConfig,
        poster: StageConfig,
        detail: StageConfig,
    ) -> Self {
        self.listing = listing.sanitized();
        self.poster = poster.sanitized();
        self.detail = detail.sanitized();
        self
    }

    /// Removes inter-request jitter from every stage.
    pub fn without_delays(mut self) -> Self {
        self.listing.max_delay = Duration::ZERO;
        self.poster.max_delay = Duration::ZERO;
        self.detail.max_delay = Duration::ZERO;
        self
    }

    /// Variant used by the single-film lookup: one request in flight per stage.
    pub(crate) fn single_film(&self) -> Self {
        let mut config = self.clone().with_max_films(1).with_overview_budget(1);
        config.listing.concurrency = 1;
        config.poster.concurrency = 1;
        config.detail.concurrency = 1;
        config
    }
}
