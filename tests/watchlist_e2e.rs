//! End-to-end tests for watchlist resolution against a mocked film site.
//!
//! Unmocked paths answer 404, which the resolver treats as a missing source.

use std::sync::Arc;
use std::time::Duration;

use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use watchpick::app::images::PLACEHOLDER_POSTER;
use watchpick::{
    Fetcher, Recommendation, ScrapeConfig, WatchlistError, enrich_recommendation,
    pick_from_watchlist, resolve_poster, resolve_watchlist,
};

const SMALL_POSTER: &str = "https://a.ltrbxd.com/resized/film-poster/1/p-0-230-0-345-crop.jpg";
const LARGE_POSTER: &str = "https://a.ltrbxd.com/resized/film-poster/1/p-0-2000-0-3000-crop.jpg";
const EMPTY_POSTER: &str = "https://s.ltrbxd.com/static/img/empty-poster-230.png";
const FAST_POSTER: &str = "https://a.ltrbxd.com/resized/film-poster/2/fast-0-125-0-187-crop.jpg";
const FAST_POSTER_LARGE: &str =
    "https://a.ltrbxd.com/resized/film-poster/2/fast-0-2000-0-3000-crop.jpg";
const PREVIEW_IMAGE: &str = "https://img.test/preview/og-poster.jpg";

fn config(server: &MockServer) -> ScrapeConfig {
    ScrapeConfig::new(Url::parse(&server.uri()).unwrap())
        .without_delays()
        .with_poster_timeout(Duration::from_millis(300))
        .with_request_timeout(Duration::from_secs(5))
}

fn fetcher_for(config: &ScrapeConfig) -> Fetcher {
    Fetcher::new(config).expect("failed to build http client")
}

fn identity(server: &MockServer, slug: &str) -> String {
    format!("{}/film/{slug}/", server.uri())
}

/// Listing page with one poster container per `(slug, name, inline poster)`.
fn listing_html(films: &[(&str, &str, &str)], next: Option<&str>) -> String {
    let entries = films
        .iter()
        .map(|(slug, name, poster)| {
            format!(
                r#"<li class="poster-container">
    <div class="film-poster" data-film-name="{name}" data-target-link="/film/{slug}/">
        <img src="{poster}" alt="{name}">
    </div>
</li>"#
            )
        })
        .collect::<String>();
    let pagination = next
        .map(|href| {
            format!(r#"<div class="pagination"><a class="next" href="{href}">Older</a></div>"#)
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<body>
<ul class="poster-list">{entries}</ul>
{pagination}
</body>
</html>"#
    )
}

fn detail_html(overview_block: &str, description: &str, preview: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta name="description" content="{description}">
    <meta property="og:image" content="{preview}">
</head>
<body>{overview_block}</body>
</html>"#
    )
}

fn poster_fragment(src: &str) -> String {
    format!(r#"<div class="film-poster"><img src="{src}" alt="poster"></div>"#)
}

async fn mount_html(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn films_repeated_across_pages_are_returned_once_in_discovery_order() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/someone/watchlist/",
        listing_html(
            &[("alpha", "Alpha", SMALL_POSTER), ("bravo", "Bravo", SMALL_POSTER)],
            Some("/someone/watchlist/page/2/"),
        ),
    )
    .await;
    mount_html(
        &server,
        "/someone/watchlist/page/2/",
        listing_html(
            &[("bravo", "Bravo", SMALL_POSTER), ("charlie", "Charlie", SMALL_POSTER)],
            None,
        ),
    )
    .await;

    let config = Arc::new(config(&server));
    let fetcher = fetcher_for(&config);
    let films = resolve_watchlist(&fetcher, config, "someone", None)
        .await
        .expect("watchlist should resolve");

    let identities = films.iter().map(|film| film.identity.clone()).collect::<Vec<_>>();
    assert_eq!(
        identities,
        vec![
            identity(&server, "alpha"),
            identity(&server, "bravo"),
            identity(&server, "charlie"),
        ]
    );
    assert!(films.iter().all(|film| film.poster_url == LARGE_POSTER));
    assert_eq!(films[0].source_path, "/film/alpha/");
}

#[tokio::test]
async fn result_is_capped_at_max_films() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/someone/watchlist/",
        listing_html(
            &[
                ("one", "One", SMALL_POSTER),
                ("two", "Two", SMALL_POSTER),
                ("three", "Three", SMALL_POSTER),
                ("four", "Four", SMALL_POSTER),
                ("five", "Five", SMALL_POSTER),
            ],
            None,
        ),
    )
    .await;

    let config = Arc::new(config(&server).with_max_films(3));
    let fetcher = fetcher_for(&config);
    let films = resolve_watchlist(&fetcher, config, "someone", None)
        .await
        .unwrap();

    let names = films.iter().map(|film| film.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["One", "Two", "Three"]);
}

#[tokio::test]
async fn fast_poster_wins_over_preview_image_and_primary_overview_is_used() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/someone/watchlist/",
        listing_html(&[("pierrot-le-fou", "Pierrot le Fou", EMPTY_POSTER)], None),
    )
    .await;
    mount_html(
        &server,
        "/ajax/poster/film/pierrot-le-fou/std/125x187/",
        poster_fragment(FAST_POSTER),
    )
    .await;
    mount_html(
        &server,
        "/film/pierrot-le-fou/",
        detail_html(
            r#"<div class="film-overview"><p>Ferdinand leaves Paris.</p></div>"#,
            "Meta synopsis.",
            PREVIEW_IMAGE,
        ),
    )
    .await;

    let config = Arc::new(config(&server));
    let fetcher = fetcher_for(&config);
    let films = resolve_watchlist(&fetcher, config, "someone", None)
        .await
        .unwrap();

    assert_eq!(films.len(), 1);
    assert_eq!(films[0].poster_url, FAST_POSTER_LARGE);
    assert_eq!(films[0].overview, "Ferdinand leaves Paris.");
}

#[tokio::test]
async fn slow_fast_endpoint_falls_back_to_preview_image_then_placeholder() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/someone/watchlist/",
        listing_html(
            &[
                ("slow", "Slow", EMPTY_POSTER),
                ("missing", "Missing", EMPTY_POSTER),
            ],
            None,
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/ajax/poster/film/slow/std/125x187/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(poster_fragment(FAST_POSTER))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/film/slow/",
        detail_html("", "Slow synopsis.", PREVIEW_IMAGE),
    )
    .await;

    let config = Arc::new(config(&server));
    let fetcher = fetcher_for(&config);
    let films = resolve_watchlist(&fetcher, config, "someone", None)
        .await
        .unwrap();

    assert_eq!(films.len(), 2);
    assert_eq!(films[0].poster_url, PREVIEW_IMAGE);
    assert_eq!(films[0].overview, "Slow synopsis.");
    assert_eq!(films[1].poster_url, PLACEHOLDER_POSTER);
    assert_eq!(films[1].overview, "");
}

#[tokio::test]
async fn only_the_overview_subset_gets_overviews() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/someone/watchlist/",
        listing_html(
            &[("first", "First", EMPTY_POSTER), ("second", "Second", EMPTY_POSTER)],
            None,
        ),
    )
    .await;
    for slug in ["first", "second"] {
        mount_html(
            &server,
            &format!("/film/{slug}/"),
            detail_html(
                r#"<div data-testid="film-overview">Structured overview.</div>"#,
                "Meta synopsis.",
                PREVIEW_IMAGE,
            ),
        )
        .await;
    }

    let config = Arc::new(config(&server).with_overview_budget(1));
    let fetcher = fetcher_for(&config);
    let films = resolve_watchlist(&fetcher, config, "someone", None)
        .await
        .unwrap();

    assert_eq!(films[0].overview, "Structured overview.");
    assert_eq!(films[1].overview, "");
    assert_eq!(films[1].poster_url, PREVIEW_IMAGE);
}

#[tokio::test]
async fn unreachable_later_pages_do_not_fail_the_call() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/someone/watchlist/",
        listing_html(
            &[("alpha", "Alpha", SMALL_POSTER)],
            Some("/someone/watchlist/page/2/"),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/someone/watchlist/page/2/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = Arc::new(config(&server));
    let fetcher = fetcher_for(&config);
    let films = resolve_watchlist(&fetcher, config, "someone", None)
        .await
        .unwrap();

    assert_eq!(films.len(), 1);
    assert_eq!(films[0].name, "Alpha");
}

#[tokio::test]
async fn genre_filter_is_applied_to_the_listing_url() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/someone/watchlist/genre/action+sci-fi/",
        listing_html(&[("alien", "Alien", SMALL_POSTER)], None),
    )
    .await;

    let config = Arc::new(config(&server));
    let fetcher = fetcher_for(&config);
    let films = resolve_watchlist(&fetcher, config, "someone", Some("28, 878, 999"))
        .await
        .unwrap();

    assert_eq!(films.len(), 1);
    assert_eq!(films[0].identity, identity(&server, "alien"));
}

#[tokio::test]
async fn empty_listing_reports_no_films_with_filter_context() {
    let server = MockServer::start().await;
    mount_html(&server, "/someone/watchlist/", listing_html(&[], None)).await;
    mount_html(
        &server,
        "/someone/watchlist/genre/horror/",
        listing_html(&[], None),
    )
    .await;

    let config = Arc::new(config(&server));
    let fetcher = fetcher_for(&config);

    let unfiltered = resolve_watchlist(&fetcher, Arc::clone(&config), "someone", Some("  "))
        .await
        .unwrap_err();
    assert!(matches!(
        unfiltered,
        WatchlistError::NoFilmsFound { genre_filter: None }
    ));
    assert_eq!(unfiltered.to_string(), "No films found in watchlist");

    let filtered = resolve_watchlist(&fetcher, config, "someone", Some("27"))
        .await
        .unwrap_err();
    assert!(filtered.filtered());
    assert_eq!(
        filtered.to_string(),
        "No films found in watchlist for the selected genres"
    );
}

#[tokio::test]
async fn unknown_genres_are_rejected_without_fetching() {
    let server = MockServer::start().await;

    let config = Arc::new(config(&server));
    let fetcher = fetcher_for(&config);
    let err = resolve_watchlist(&fetcher, config, "someone", Some("999,1234"))
        .await
        .unwrap_err();

    assert!(matches!(err, WatchlistError::InvalidGenreFilter { .. }));
    let received = server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[tokio::test]
async fn missing_watchlist_page_reads_as_no_films() {
    let server = MockServer::start().await;

    let config = Arc::new(config(&server));
    let fetcher = fetcher_for(&config);
    let err = resolve_watchlist(&fetcher, config, "ghost", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WatchlistError::NoFilmsFound { genre_filter: None }
    ));
}

#[tokio::test]
async fn refused_connection_on_first_page_is_listing_unreachable() {
    let config = Arc::new(
        ScrapeConfig::new(Url::parse("http://127.0.0.1:9").unwrap())
            .without_delays()
            .with_request_timeout(Duration::from_secs(2)),
    );
    let fetcher = fetcher_for(&config);
    let err = resolve_watchlist(&fetcher, config, "someone", None)
        .await
        .unwrap_err();

    assert!(matches!(err, WatchlistError::ListingUnreachable { .. }));
}

async fn listing_paths_requested(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|request| request.url.path().to_string())
        .filter(|path| path.contains("/watchlist/"))
        .collect()
}

#[tokio::test]
async fn pagination_stops_at_max_listing_pages() {
    let server = MockServer::start().await;
    let pages = [
        ("/someone/watchlist/", "alpha", Some("/someone/watchlist/page/2/")),
        ("/someone/watchlist/page/2/", "bravo", Some("/someone/watchlist/page/3/")),
        ("/someone/watchlist/page/3/", "charlie", Some("/someone/watchlist/page/4/")),
        ("/someone/watchlist/page/4/", "delta", None),
    ];
    for (at, slug, next) in pages {
        mount_html(&server, at, listing_html(&[(slug, slug, SMALL_POSTER)], next)).await;
    }

    let config = Arc::new(config(&server).with_max_listing_pages(2));
    let fetcher = fetcher_for(&config);
    let films = resolve_watchlist(&fetcher, config, "someone", None)
        .await
        .unwrap();

    let names = films.iter().map(|film| film.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["alpha", "bravo"]);
    assert_eq!(
        listing_paths_requested(&server).await,
        vec!["/someone/watchlist/", "/someone/watchlist/page/2/"]
    );
}

#[tokio::test]
async fn no_further_pages_once_the_cap_is_filled() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/someone/watchlist/",
        listing_html(
            &[("alpha", "Alpha", SMALL_POSTER), ("bravo", "Bravo", SMALL_POSTER)],
            Some("/someone/watchlist/page/2/"),
        ),
    )
    .await;
    mount_html(
        &server,
        "/someone/watchlist/page/2/",
        listing_html(&[("charlie", "Charlie", SMALL_POSTER)], None),
    )
    .await;

    let config = Arc::new(config(&server).with_max_films(2));
    let fetcher = fetcher_for(&config);
    let films = resolve_watchlist(&fetcher, config, "someone", None)
        .await
        .unwrap();

    assert_eq!(films.len(), 2);
    assert_eq!(listing_paths_requested(&server).await, vec!["/someone/watchlist/"]);
}

#[tokio::test]
async fn random_pick_is_one_of_the_resolved_films() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/someone/watchlist/",
        listing_html(
            &[("alpha", "Alpha", SMALL_POSTER), ("bravo", "Bravo", SMALL_POSTER)],
            None,
        ),
    )
    .await;

    let config = Arc::new(config(&server));
    let fetcher = fetcher_for(&config);
    let film = pick_from_watchlist(&fetcher, config, "someone", None)
        .await
        .unwrap();

    assert!(["Alpha", "Bravo"].contains(&film.name.as_str()));
}

#[tokio::test]
async fn single_film_lookup_returns_poster_and_overview() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/ajax/poster/film/la-chinoise/std/125x187/",
        poster_fragment(FAST_POSTER),
    )
    .await;
    mount_html(
        &server,
        "/film/la-chinoise/",
        detail_html(
            r#"<div class="film-overview">Students in a Paris flat.</div>"#,
            "Meta synopsis.",
            PREVIEW_IMAGE,
        ),
    )
    .await;

    let config = config(&server);
    let fetcher = fetcher_for(&config);
    let result = resolve_poster(&fetcher, &config, &identity(&server, "la-chinoise")).await;

    assert_eq!(result.poster_url, FAST_POSTER_LARGE);
    assert_eq!(result.overview, "Students in a Paris flat.");
}

#[tokio::test]
async fn single_film_lookup_of_a_non_film_url_is_the_placeholder() {
    let server = MockServer::start().await;

    let config = config(&server);
    let fetcher = fetcher_for(&config);
    let result = resolve_poster(&fetcher, &config, "/someone/watchlist/").await;

    assert_eq!(result.poster_url, PLACEHOLDER_POSTER);
    assert_eq!(result.overview, "");
    let received = server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[tokio::test]
async fn recommendation_keeps_its_own_overview() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/film/weekend/",
        detail_html(
            r#"<div class="film-overview"><p>A traffic jam.</p></div>"#,
            "Meta synopsis.",
            PREVIEW_IMAGE,
        ),
    )
    .await;

    let config = config(&server);
    let fetcher = fetcher_for(&config);

    let with_overview = Recommendation {
        name: "Weekend".to_string(),
        year: Some("1967".to_string()),
        overview: "Recommended because you liked Pierrot le Fou.".to_string(),
        film_url: identity(&server, "weekend"),
        image: String::new(),
    };
    let enriched = enrich_recommendation(&fetcher, &config, with_overview).await;
    assert_eq!(enriched.image, PREVIEW_IMAGE);
    assert_eq!(enriched.overview, "Recommended because you liked Pierrot le Fou.");

    let without_overview = Recommendation {
        overview: String::new(),
        ..enriched
    };
    let enriched = enrich_recommendation(&fetcher, &config, without_overview).await;
    assert_eq!(enriched.overview, "A traffic jam.");
}
