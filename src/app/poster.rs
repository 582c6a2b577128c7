use std::sync::Arc;

use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::app::config::ScrapeConfig;
use crate::app::fetch::Fetcher;
use crate::app::identity::{film_identity, film_slug};
use crate::app::images::upscale;
use crate::app::orchestrator::{WatchlistSession, enrich};
use crate::app::types::{FilmStub, PosterResult, Recommendation};

const FRAGMENT_IMAGE_SELECTOR: &str = "div.film-poster img, img";

/// Fast structured endpoint returning a small poster fragment for `slug`.
pub fn ajax_poster_url(origin: &Url, slug: &str) -> Option<String> {
    if slug.is_empty() {
        return None;
    }
    origin
        .join(&format!("/ajax/poster/film/{slug}/std/125x187/"))
        .ok()
        .map(String::from)
}

/// Image URL carried by a poster fragment, or an empty string.
pub fn parse_poster_fragment(html: &str) -> String {
    let doc = Html::parse_fragment(html);
    let Ok(selector) = Selector::parse(FRAGMENT_IMAGE_SELECTOR) else {
        return String::new();
    };

    doc.select(&selector)
        .flat_map(|img| ["src", "data-src"].map(|name| img.value().attr(name)))
        .flatten()
        .map(str::trim)
        .find(|src| !src.is_empty())
        .map(ToString::to_string)
        .unwrap_or_default()
}

/// Races the fast poster endpoint against the poster timeout.
///
/// The fetch runs in its own task and writes through the session's guarded
/// `offer_poster`. On timeout the caller moves on without cancelling it; if
/// the abandoned fetch finishes later, its write only lands when no other
/// poster has been resolved yet, and is dropped after finalization.
pub(crate) async fn race_fast_poster(session: &Arc<WatchlistSession>, identity: &str) {
    let slug = film_slug(identity);
    let Some(endpoint) = ajax_poster_url(&session.config().origin, &slug) else {
        debug!(identity, "no slug, skipping fast poster endpoint");
        return;
    };

    let task_session = Arc::clone(session);
    let task_identity = identity.to_string();
    let fast = tokio::spawn(async move {
        let Ok(_permit) = task_session.poster_stage().acquire().await else {
            return;
        };
        let fragment = match task_session.fetcher().get_text(&endpoint).await {
            Ok(fragment) => fragment,
            Err(err) => {
                debug!(identity = %task_identity, error = %err, "fast poster fetch failed");
                return;
            }
        };
        let candidate = upscale(&parse_poster_fragment(&fragment));
        if task_session.offer_poster(&task_identity, &candidate).await {
            debug!(identity = %task_identity, poster = %candidate, "fast poster resolved");
        }
    });

    match tokio::time::timeout(session.config().poster_timeout, fast).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(identity, error = %err, "fast poster task failed"),
        Err(_) => debug!(identity, "fast poster endpoint timed out, falling back"),
    }
}

/// Single-film poster lookup.
///
/// Applies the same chain as the watchlist path (fast endpoint, then the
/// detail page's preview image, then the placeholder) and fills the
/// overview from the same detail page.
pub async fn resolve_poster(
    fetcher: &Fetcher,
    config: &ScrapeConfig,
    film_url: &str,
) -> PosterResult {
    let identity = film_identity(&config.origin, film_url);
    if identity.is_empty() {
        debug!(film_url, "not a film url, using placeholder");
        return PosterResult {
            poster_url: config.placeholder_poster.clone(),
            overview: String::new(),
        };
    }

    let slug = film_slug(&identity);
    let session = WatchlistSession::new(Arc::new(config.single_film()), fetcher.clone());
    session
        .accept(FilmStub {
            name: slug.clone(),
            identity: identity.clone(),
            source_path: format!("/film/{slug}/"),
            year: None,
            inline_poster: String::new(),
        })
        .await;
    enrich(Arc::clone(&session), identity.clone(), true).await;

    let result = session
        .finalize()
        .await
        .into_iter()
        .next()
        .map(|film| PosterResult {
            poster_url: film.poster_url,
            overview: film.overview,
        })
        .unwrap_or_else(|| PosterResult {
            poster_url: config.placeholder_poster.clone(),
            overview: String::new(),
        });
    info!(identity = %identity, poster = %result.poster_url, "poster resolved");
    result
}

/// Attaches a poster, and an overview when missing, to an externally
/// produced recommendation.
pub async fn enrich_recommendation(
    fetcher: &Fetcher,
    config: &ScrapeConfig,
    mut recommendation: Recommendation,
) -> Recommendation {
    let resolved = resolve_poster(fetcher, config, &recommendation.film_url).await;
    recommendation.image = resolved.poster_url;
    if recommendation.overview.trim().is_empty() {
        recommendation.overview = resolved.overview;
    }
    recommendation
}
