use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use scraper::{ElementRef, Html, Selector};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::app::config::ScrapeConfig;
use crate::app::error::{FetchError, WatchlistError};
use crate::app::fetch::{Fetcher, StageLimiter};
use crate::app::identity::{film_identity, release_year};
use crate::app::types::FilmStub;

const ENTRY_SELECTOR: &str = ".poster-container .film-poster, [data-component-class='LazyPoster']";
const PAGINATION_SELECTOR: &str = "a.next[href], a[href*='/page/']";

/// Stubs and follow-up pages found on one listing page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub stubs: Vec<FilmStub>,
    pub next_pages: Vec<Url>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkSummary {
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub stubs_sent: usize,
}

/// Builds `<origin>/<user>/watchlist/[genre/<a>+<b>/]`.
pub fn listing_url(
    origin: &Url,
    username: &str,
    genre_slugs: &[&str],
) -> Result<Url, WatchlistError> {
    let username = username.trim();
    if username.is_empty() || username.contains(['/', '?', '#']) {
        return Err(WatchlistError::InvalidUsername {
            username: username.to_string(),
        });
    }

    let mut url = origin.clone();
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| WatchlistError::ListingUnreachable {
                url: origin.to_string(),
                source: FetchError::InvalidUrl {
                    url: origin.to_string(),
                },
            })?;
        segments.pop_if_empty().push(username).push("watchlist");
        if !genre_slugs.is_empty() {
            segments.push("genre").push(&genre_slugs.join("+"));
        }
        segments.push("");
    }
    Ok(url)
}

/// Extracts film stubs and pagination links from a listing page.
///
/// Only pagination links that stay under `root` are returned.
pub fn parse_listing_page(html: &str, page_url: &Url, root: &Url, origin: &Url) -> ListingPage {
    let doc = Html::parse_document(html);
    let mut page = ListingPage::default();

    if let Ok(selector) = Selector::parse(ENTRY_SELECTOR) {
        page.stubs = doc
            .select(&selector)
            .filter_map(|el| parse_entry(el, origin))
            .collect();
    }

    if let Ok(selector) = Selector::parse(PAGINATION_SELECTOR) {
        let mut seen = HashSet::new();
        for el in doc.select(&selector) {
            let Some(href) = el.value().attr("href") else {
                continue;
            };
            let Ok(mut next) = page_url.join(href.trim()) else {
                continue;
            };
            next.set_fragment(None);
            if !next.as_str().starts_with(root.as_str()) || next == *page_url {
                continue;
            }
            if seen.insert(next.to_string()) {
                page.next_pages.push(next);
            }
        }
    }

    page
}

fn parse_entry(el: ElementRef<'_>, origin: &Url) -> Option<FilmStub> {
    let attr = |names: &[&str]| {
        names
            .iter()
            .filter_map(|name| el.value().attr(name))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(ToString::to_string)
    };
    let img = Selector::parse("img")
        .ok()
        .and_then(|selector| el.select(&selector).next());
    let img_attr = |name: &str| {
        img.and_then(|img| img.value().attr(name))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToString::to_string)
    };

    let name = attr(&["data-film-name", "data-item-name"]).or_else(|| img_attr("alt"))?;
    let source_path = attr(&["data-target-link", "data-film-link", "data-item-link"])?;
    let identity = film_identity(origin, &source_path);
    if identity.is_empty() {
        debug!(path = %source_path, "listing entry without a film path");
        return None;
    }
    let year = attr(&["data-film-release-year"])
        .filter(|year| year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()))
        .or_else(|| release_year(&source_path));

    Some(FilmStub {
        name,
        identity,
        source_path,
        year,
        inline_poster: img_attr("src").unwrap_or_default(),
    })
}

/// Walks the listing starting at `start`, sending each newly seen stub to
/// `stubs`.
///
/// Only a transport failure on the first page is an error; an error status
/// there reads as an empty listing. Later pages are best-effort, bounded by
/// `max_listing_pages`. No new page is dispatched once the films sent can
/// fill the cap or `stop` is set; a closed receiver ends the walk. Pages
/// already in flight are allowed to finish.
pub async fn walk(
    fetcher: Fetcher,
    stage: StageLimiter,
    config: Arc<ScrapeConfig>,
    start: Url,
    stubs: mpsc::Sender<FilmStub>,
    stop: Arc<AtomicBool>,
) -> Result<WalkSummary, WatchlistError> {
    let mut summary = WalkSummary::default();
    let mut seen = HashSet::<String>::new();
    let mut visited = HashSet::<String>::new();
    let mut queue = VecDeque::<Url>::new();
    visited.insert(start.to_string());

    info!(url = %start, "fetching watchlist");
    let first = {
        let _permit = stage.acquire().await.ok();
        fetcher.get_text(start.as_str()).await
    };
    let first = match first {
        Ok(html) => html,
        Err(FetchError::Status { status, .. }) => {
            warn!(url = %start, status, "watchlist page answered with an error status");
            summary.pages_failed += 1;
            return Ok(summary);
        }
        Err(source) => {
            return Err(WatchlistError::ListingUnreachable {
                url: start.to_string(),
                source,
            });
        }
    };
    summary.pages_fetched += 1;

    let page = parse_listing_page(&first, &start, &start, &config.origin);
    if !emit_page(page, &stubs, &mut seen, &mut visited, &mut queue, &mut summary).await {
        return Ok(summary);
    }

    let mut set = JoinSet::new();
    let mut dispatched = 1usize;
    loop {
        while dispatched < config.max_listing_pages
            && summary.stubs_sent < config.max_films
            && !stop.load(Ordering::Relaxed)
        {
            let Some(url) = queue.pop_front() else {
                break;
            };
            dispatched += 1;
            let fetcher = fetcher.clone();
            let stage = stage.clone();
            set.spawn(async move {
                let _permit = stage.acquire().await.ok();
                let result = fetcher.get_text(url.as_str()).await;
                (url, result)
            });
        }

        let Some(joined) = set.join_next().await else {
            break;
        };
        match joined {
            Ok((url, Ok(html))) => {
                summary.pages_fetched += 1;
                debug!(url = %url, "listing page fetched");
                let page = parse_listing_page(&html, &url, &start, &config.origin);
                if !emit_page(page, &stubs, &mut seen, &mut visited, &mut queue, &mut summary)
                    .await
                {
                    break;
                }
            }
            Ok((url, Err(err))) => {
                summary.pages_failed += 1;
                warn!(url = %url, error = %err, "listing page fetch failed");
            }
            Err(err) => {
                summary.pages_failed += 1;
                warn!(error = %err, "listing worker failed");
            }
        }
    }

    if !queue.is_empty() {
        debug!(skipped = queue.len(), "listing pages left undispatched");
    }
    info!(
        pages = summary.pages_fetched,
        failed = summary.pages_failed,
        films = summary.stubs_sent,
        "listing walk finished"
    );
    Ok(summary)
}

/// Forwards unseen stubs and queues unvisited pages. Returns `false` once
/// the receiver has gone away.
async fn emit_page(
    page: ListingPage,
    stubs: &mpsc::Sender<FilmStub>,
    seen: &mut HashSet<String>,
    visited: &mut HashSet<String>,
    queue: &mut VecDeque<Url>,
    summary: &mut WalkSummary,
) -> bool {
    for next in page.next_pages {
        if visited.insert(next.to_string()) {
            debug!(url = %next, "following pagination");
            queue.push_back(next);
        }
    }

    for stub in page.stubs {
        if !seen.insert(stub.identity.clone()) {
            continue;
        }
        if stubs.send(stub).await.is_err() {
            return false;
        }
        summary.stubs_sent += 1;
    }
    true
}
