use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use url::Url;

use crate::app::config::{DEFAULT_ORIGIN, DEFAULT_USER_AGENT, ScrapeConfig, StageConfig};
use crate::app::data_io::DataFormat;
use crate::app::images::PLACEHOLDER_POSTER;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "watchpick",
    version,
    about = "Resolve a public watchlist into enriched films, or pick one at random"
)]
pub struct Cli {
    #[command(flatten)]
    pub scrape: ScrapeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Resolve a user's watchlist
    Watchlist {
        #[arg(value_name = "USERNAME")]
        username: String,

        /// Comma-separated numeric genre ids, e.g. 28,12
        #[arg(long, value_name = "IDS")]
        genres: Option<String>,

        /// Print a single randomly chosen film
        #[arg(long, default_value_t = false)]
        random: bool,

        #[arg(short, long, value_name = "FILE")]
        output: Option<String>,

        #[arg(long, value_enum, default_value_t = FileFormatArg::Json)]
        format: FileFormatArg,
    },
    /// Resolve poster and overview for one film URL
    Poster {
        #[arg(value_name = "FILM_URL")]
        film_url: String,
    },
    /// Enrich a recommended film with poster and overview
    Recommend {
        #[arg(long)]
        name: String,

        #[arg(long, value_name = "FILM_URL")]
        url: String,

        #[arg(long)]
        year: Option<String>,

        #[arg(long, default_value = "")]
        overview: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct ScrapeArgs {
    #[arg(long, global = true, env = "WATCHPICK_ORIGIN", default_value = DEFAULT_ORIGIN)]
    pub origin: Url,

    #[arg(long, global = true, env = "WATCHPICK_PLACEHOLDER", default_value = PLACEHOLDER_POSTER)]
    pub placeholder: String,

    #[arg(
        long,
        global = true,
        value_name = "UA",
        env = "WATCHPICK_USER_AGENT",
        default_value = DEFAULT_USER_AGENT
    )]
    pub user_agent: String,

    #[arg(long, global = true, value_name = "N", env = "WATCHPICK_MAX_FILMS", default_value_t = 50)]
    pub max_films: usize,

    #[arg(
        long,
        global = true,
        value_name = "N",
        env = "WATCHPICK_OVERVIEW_BUDGET",
        default_value_t = 10
    )]
    pub overview_budget: usize,

    #[arg(long, global = true, value_name = "N", env = "WATCHPICK_MAX_PAGES", default_value_t = 25)]
    pub max_pages: usize,

    #[arg(
        long,
        global = true,
        value_name = "MS",
        env = "WATCHPICK_POSTER_TIMEOUT_MS",
        default_value_t = 5000
    )]
    pub poster_timeout_ms: u64,

    #[arg(
        long,
        global = true,
        value_name = "MS",
        env = "WATCHPICK_REQUEST_TIMEOUT_MS",
        default_value_t = 20000
    )]
    pub request_timeout_ms: u64,

    #[arg(long, global = true, value_name = "N", default_value_t = 100)]
    pub listing_concurrency: usize,

    #[arg(long, global = true, value_name = "N", default_value_t = 100)]
    pub poster_concurrency: usize,

    #[arg(long, global = true, value_name = "N", default_value_t = 20)]
    pub detail_concurrency: usize,

    #[arg(long, global = true, value_name = "MS", default_value_t = 250)]
    pub listing_delay_ms: u64,

    #[arg(long, global = true, value_name = "MS", default_value_t = 50)]
    pub poster_delay_ms: u64,

    #[arg(long, global = true, value_name = "MS", default_value_t = 100)]
    pub detail_delay_ms: u64,
}

impl ScrapeArgs {
    pub fn to_config(&self) -> ScrapeConfig {
        ScrapeConfig::new(self.origin.clone())
            .with_placeholder_poster(self.placeholder.clone())
            .with_user_agent(self.user_agent.clone())
            .with_max_films(self.max_films)
            .with_overview_budget(self.overview_budget)
            .with_max_listing_pages(self.max_pages)
            .with_poster_timeout(Duration::from_millis(self.poster_timeout_ms))
            .with_request_timeout(Duration::from_millis(self.request_timeout_ms))
            .with_stages(
                StageConfig::new(
                    self.listing_concurrency,
                    Duration::from_millis(self.listing_delay_ms),
                ),
                StageConfig::new(
                    self.poster_concurrency,
                    Duration::from_millis(self.poster_delay_ms),
                ),
                StageConfig::new(
                    self.detail_concurrency,
                    Duration::from_millis(self.detail_delay_ms),
                ),
            )
    }
}

#[derive(Debug, Copy, Clone, ValueEnum, PartialEq, Eq)]
pub enum FileFormatArg {
    Csv,
    Json,
}

impl From<FileFormatArg> for DataFormat {
    fn from(value: FileFormatArg) -> Self {
        match value {
            FileFormatArg::Csv => DataFormat::Csv,
            FileFormatArg::Json => DataFormat::Json,
        }
    }
}
