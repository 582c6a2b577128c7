use std::io;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use crate::app::cli::{Cli, Command};
use crate::app::data_io::{
    DataFormat, default_output_path, detect_data_format, write_films, write_films_to_path,
};
use crate::app::error::AppError;
use crate::app::fetch::Fetcher;
use crate::app::orchestrator::{pick_from_watchlist, resolve_watchlist};
use crate::app::poster::{enrich_recommendation, resolve_poster};
use crate::app::types::Recommendation;

pub async fn run() -> Result<(), AppError> {
    run_with(Cli::parse()).await
}

pub async fn run_with(cli: Cli) -> Result<(), AppError> {
    if cli.scrape.max_films == 0 {
        return Err(AppError::Config("--max-films must be at least 1".to_string()));
    }
    let config = Arc::new(cli.scrape.to_config());
    let fetcher = Fetcher::new(&config)?;

    match cli.command {
        Command::Watchlist {
            username,
            genres,
            random,
            output,
            format,
        } => {
            if random {
                let film =
                    pick_from_watchlist(&fetcher, config, &username, genres.as_deref()).await?;
                print_json(&film)?;
                return Ok(());
            }

            let films = resolve_watchlist(&fetcher, config, &username, genres.as_deref()).await?;
            let configured_format: DataFormat = format.into();
            match output {
                Some(path) => {
                    let path = if path.trim().is_empty() {
                        default_output_path(&username, configured_format)
                    } else {
                        path
                    };
                    let format = detect_data_format(&path, configured_format);
                    write_films_to_path(&path, format, &films)?;
                    info!(films = films.len(), output = %path, "watchlist written");
                }
                None => write_films(io::stdout().lock(), configured_format, &films)?,
            }
        }
        Command::Poster { film_url } => {
            let result = resolve_poster(&fetcher, &config, &film_url).await;
            print_json(&result)?;
        }
        Command::Recommend {
            name,
            url,
            year,
            overview,
        } => {
            let recommendation = Recommendation {
                name,
                year,
                overview,
                film_url: url,
                image: String::new(),
            };
            let enriched = enrich_recommendation(&fetcher, &config, recommendation).await;
            print_json(&enriched)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    io::Write::write_all(&mut out, b"\n")?;
    Ok(())
}
