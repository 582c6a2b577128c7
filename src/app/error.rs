use thiserror::Error;

/// Failure of a single HTTP fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("invalid url: {url}")]
    InvalidUrl { url: String },
}

/// Call-level failures of a watchlist resolution. Secondary fetch failures
/// never surface here; they only degrade a poster or overview field.
#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("no valid genres found for ids: {filter}")]
    InvalidGenreFilter { filter: String },
    /// Input guard checked before any request is made; not a crawl outcome.
    #[error("invalid username: {username:?}")]
    InvalidUsername { username: String },
    #[error("watchlist unreachable at {url}: {source}")]
    ListingUnreachable {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("{}", no_films_message(.genre_filter.as_deref()))]
    NoFilmsFound { genre_filter: Option<String> },
}

impl WatchlistError {
    /// Whether a genre filter was in effect when the call failed.
    pub fn filtered(&self) -> bool {
        match self {
            WatchlistError::NoFilmsFound { genre_filter } => genre_filter.is_some(),
            WatchlistError::InvalidGenreFilter { .. } => true,
            _ => false,
        }
    }
}

fn no_films_message(genre_filter: Option<&str>) -> &'static str {
    if genre_filter.is_some() {
        "No films found in watchlist for the selected genres"
    } else {
        "No films found in watchlist"
    }
}

/// Errors surfaced by the command-line runtime.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Watchlist(#[from] WatchlistError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
}
