//! Resolves a public film watchlist into a deduplicated, enriched list of
//! films and picks one at random.

pub mod app;

pub use app::config::{ScrapeConfig, StageConfig};
pub use app::error::{AppError, FetchError, WatchlistError};
pub use app::fetch::Fetcher;
pub use app::orchestrator::{
    WatchlistSession, pick_from_watchlist, resolve_watchlist, select_random,
};
pub use app::poster::{enrich_recommendation, resolve_poster};
pub use app::types::{Film, PosterResult, Recommendation};
