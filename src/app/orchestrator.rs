use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::seq::IndexedRandom;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::app::config::ScrapeConfig;
use crate::app::error::WatchlistError;
use crate::app::fetch::{Fetcher, StageLimiter};
use crate::app::genres::genre_ids_to_slugs;
use crate::app::listing::{listing_url, walk};
use crate::app::overview::{OverviewSource, fetch_detail_page};
use crate::app::poster::race_fast_poster;
use crate::app::results::{Accepted, ResultSet, SessionPhase};
use crate::app::types::{Film, FilmStub};

const STUB_QUEUE_CAPACITY: usize = 256;

/// State owned by one resolution call: the result set, the dedup index and
/// the per-stage limiters. Never shared between calls.
#[derive(Debug)]
pub struct WatchlistSession {
    config: Arc<ScrapeConfig>,
    fetcher: Fetcher,
    results: Mutex<ResultSet>,
    listing_stage: StageLimiter,
    poster_stage: StageLimiter,
    detail_stage: StageLimiter,
    cap_reached: Arc<AtomicBool>,
}

impl WatchlistSession {
    pub fn new(config: Arc<ScrapeConfig>, fetcher: Fetcher) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(ResultSet::new(config.max_films, config.overview_budget)),
            listing_stage: StageLimiter::new("listing", config.listing),
            poster_stage: StageLimiter::new("poster", config.poster),
            detail_stage: StageLimiter::new("detail", config.detail),
            cap_reached: Arc::new(AtomicBool::new(false)),
            config,
            fetcher,
        })
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    pub(crate) fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub(crate) fn poster_stage(&self) -> &StageLimiter {
        &self.poster_stage
    }

    pub async fn phase(&self) -> SessionPhase {
        self.results.lock().await.phase()
    }

    async fn set_phase(&self, phase: SessionPhase) {
        self.results.lock().await.set_phase(phase);
    }

    pub async fn accept(&self, stub: FilmStub) -> Accepted {
        let mut results = self.results.lock().await;
        let accepted = results.accept(stub);
        if results.is_full() {
            self.cap_reached.store(true, Ordering::Relaxed);
        }
        accepted
    }

    pub async fn offer_poster(&self, identity: &str, candidate: &str) -> bool {
        self.results.lock().await.offer_poster(identity, candidate)
    }

    pub async fn has_resolved_poster(&self, identity: &str) -> bool {
        self.results.lock().await.has_resolved_poster(identity)
    }

    pub async fn offer_overview(
        &self,
        identity: &str,
        source: OverviewSource,
        text: &str,
    ) -> bool {
        self.results.lock().await.offer_overview(identity, source, text)
    }

    pub async fn finalize(&self) -> Vec<Film> {
        self.results
            .lock()
            .await
            .finalize(&self.config.placeholder_poster)
    }

    /// Discovers films from `start`, enriches them and returns them in
    /// discovery order.
    ///
    /// The listing walk and enrichment overlap: each accepted stub is
    /// dispatched as soon as it arrives. The call returns once every
    /// dispatched enrichment has settled; fast poster fetches abandoned by
    /// their timeout are not waited for.
    pub async fn run(self: &Arc<Self>, start: Url) -> Result<Vec<Film>, WatchlistError> {
        self.set_phase(SessionPhase::Discovering).await;
        let (tx, mut rx) = mpsc::channel::<FilmStub>(STUB_QUEUE_CAPACITY);

        let walker = walk(
            self.fetcher.clone(),
            self.listing_stage.clone(),
            Arc::clone(&self.config),
            start,
            tx,
            Arc::clone(&self.cap_reached),
        );
        let dispatcher = async {
            let mut enrichment = JoinSet::new();
            while let Some(stub) = rx.recv().await {
                let identity = stub.identity.clone();
                match self.accept(stub).await {
                    Accepted::Added { fetch_overview } => {
                        debug!(identity = %identity, fetch_overview, "film accepted");
                        enrichment.spawn(enrich(Arc::clone(self), identity, fetch_overview));
                    }
                    Accepted::Duplicate => debug!(identity = %identity, "duplicate film skipped"),
                    Accepted::CapReached => {
                        debug!(identity = %identity, "film cap reached, dropping")
                    }
                    Accepted::Rejected => {}
                }
            }
            enrichment
        };

        let (walked, mut enrichment) = tokio::join!(walker, dispatcher);
        if let Err(err) = walked {
            enrichment.abort_all();
            self.set_phase(SessionPhase::Done).await;
            return Err(err);
        }

        self.set_phase(SessionPhase::Enriching).await;
        while let Some(joined) = enrichment.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "enrichment task failed");
            }
        }

        Ok(self.finalize().await)
    }
}

/// Poster and, for the earliest films, overview enrichment of one accepted
/// film. Never fails; a missing source leaves the field for the placeholder
/// pass.
pub(crate) async fn enrich(session: Arc<WatchlistSession>, identity: String, with_overview: bool) {
    let detail = async {
        if with_overview {
            fetch_detail_page(&session.fetcher, &session.detail_stage, &identity).await
        } else {
            None
        }
    };
    let ((), detail) = tokio::join!(race_fast_poster(&session, &identity), detail);

    let detail = if detail.is_none()
        && !with_overview
        && !session.has_resolved_poster(&identity).await
    {
        debug!(identity = %identity, "fast poster missing, trying detail page");
        fetch_detail_page(&session.fetcher, &session.detail_stage, &identity).await
    } else {
        detail
    };
    let Some(page) = detail else {
        return;
    };

    if session.offer_poster(&identity, &page.preview_image).await {
        debug!(identity = %identity, "poster taken from preview image");
    }
    if with_overview
        && let Some((source, text)) = page.overview
        && session.offer_overview(&identity, source, &text).await
    {
        debug!(identity = %identity, ?source, "overview resolved");
    }
}

/// Resolves a user's watchlist into enriched films.
///
/// `genre_filter` is a comma-separated list of numeric genre ids. A blank
/// filter means "no filter"; a filter with no known id fails before any
/// network access.
pub async fn resolve_watchlist(
    fetcher: &Fetcher,
    config: Arc<ScrapeConfig>,
    username: &str,
    genre_filter: Option<&str>,
) -> Result<Vec<Film>, WatchlistError> {
    let filter = genre_filter.map(str::trim).filter(|filter| !filter.is_empty());
    let slugs = match filter {
        Some(filter) => {
            let slugs = genre_ids_to_slugs(filter);
            if slugs.is_empty() {
                return Err(WatchlistError::InvalidGenreFilter {
                    filter: filter.to_string(),
                });
            }
            debug!(filter, ?slugs, "genre filter mapped");
            slugs
        }
        None => Vec::new(),
    };

    let start = listing_url(&config.origin, username, &slugs)?;
    let session = WatchlistSession::new(config, fetcher.clone());
    let films = session.run(start).await?;

    if films.is_empty() {
        return Err(WatchlistError::NoFilmsFound {
            genre_filter: filter.map(ToString::to_string),
        });
    }
    info!(username, films = films.len(), "watchlist resolved");
    Ok(films)
}

/// Uniform random pick; `None` only for an empty slice.
pub fn select_random(films: &[Film]) -> Option<&Film> {
    films.choose(&mut rand::rng())
}

/// Resolves the watchlist and returns one randomly chosen film.
pub async fn pick_from_watchlist(
    fetcher: &Fetcher,
    config: Arc<ScrapeConfig>,
    username: &str,
    genre_filter: Option<&str>,
) -> Result<Film, WatchlistError> {
    let films = resolve_watchlist(fetcher, config, username, genre_filter).await?;
    let film = select_random(&films)
        .cloned()
        .ok_or_else(|| WatchlistError::NoFilmsFound {
            genre_filter: genre_filter
                .map(str::trim)
                .filter(|filter| !filter.is_empty())
                .map(ToString::to_string),
        })?;
    info!(name = %film.name, year = ?film.year, "film selected");
    Ok(film)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn film(slug: &str) -> Film {
        Film {
            name: slug.to_string(),
            identity: format!("https://letterboxd.com/film/{slug}/"),
            poster_url: String::new(),
            year: None,
            source_path: format!("/film/{slug}/"),
            overview: String::new(),
        }
    }

    fn config() -> Arc<ScrapeConfig> {
        Arc::new(ScrapeConfig::new(Url::parse("http://127.0.0.1:9").unwrap()).without_delays())
    }

    #[test]
    fn select_random_handles_empty_and_single() {
        assert!(select_random(&[]).is_none());
        let one = [film("only")];
        assert_eq!(select_random(&one), Some(&one[0]));
    }

    #[test]
    fn select_random_eventually_covers_every_film() {
        let films = [film("a"), film("b"), film("c")];
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            if let Some(pick) = select_random(&films) {
                seen.insert(pick.identity.clone());
            }
        }
        assert_eq!(seen.len(), 3);
    }

    #[tokio::test]
    async fn unknown_genres_fail_before_fetching() {
        let config = config();
        let fetcher = Fetcher::new(&config).unwrap();
        let err = resolve_watchlist(&fetcher, config, "someone", Some("999"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, WatchlistError::InvalidGenreFilter { ref filter } if filter == "999")
        );
    }

    #[tokio::test]
    async fn session_tracks_cap_and_phase() {
        let config = Arc::new(
            ScrapeConfig::new(Url::parse("http://127.0.0.1:9").unwrap()).with_max_films(1),
        );
        let fetcher = Fetcher::new(&config).unwrap();
        let session = WatchlistSession::new(config, fetcher);
        assert_eq!(session.phase().await, SessionPhase::Idle);

        let stub = FilmStub {
            name: "A".to_string(),
            identity: "http://127.0.0.1:9/film/a/".to_string(),
            source_path: "/film/a/".to_string(),
            year: None,
            inline_poster: String::new(),
        };
        assert_eq!(
            session.accept(stub).await,
            Accepted::Added { fetch_overview: true }
        );
        assert!(session.cap_reached.load(Ordering::Relaxed));

        let films = session.finalize().await;
        assert_eq!(films.len(), 1);
        assert_eq!(films[0].poster_url, session.config().placeholder_poster);
        assert_eq!(session.phase().await, SessionPhase::Done);
    }
}
