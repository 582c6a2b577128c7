use std::fs::File;
use std::io::{self, Write};

use chrono::Utc;

use crate::app::error::AppError;
use crate::app::types::Film;

const CSV_HEADERS: [&str; 6] = ["name", "year", "slug", "film_path", "image", "overview"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Json,
}

struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    fn new(out: W) -> Result<Self, AppError> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(CSV_HEADERS)?;
        Ok(Self { writer })
    }

    fn write_film(&mut self, film: &Film) -> Result<(), AppError> {
        self.writer.write_record([
            film.name.as_str(),
            film.year.as_deref().unwrap_or_default(),
            film.identity.as_str(),
            film.source_path.as_str(),
            film.poster_url.as_str(),
            film.overview.as_str(),
        ])?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), AppError> {
        self.writer.flush()?;
        Ok(())
    }
}

struct JsonSink<W: Write> {
    out: W,
    first: bool,
    closed: bool,
}

impl<W: Write> JsonSink<W> {
    fn new(mut out: W) -> Result<Self, AppError> {
        out.write_all(b"[\n")?;
        Ok(Self {
            out,
            first: true,
            closed: false,
        })
    }

    fn write_film(&mut self, film: &Film) -> Result<(), AppError> {
        if !self.first {
            self.out.write_all(b",\n")?;
        }
        self.first = false;
        serde_json::to_writer(&mut self.out, film)?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), AppError> {
        if !self.closed {
            if self.first {
                self.out.write_all(b"]\n")?;
            } else {
                self.out.write_all(b"\n]\n")?;
            }
            self.closed = true;
        }
        self.out.flush()?;
        Ok(())
    }
}

enum OutputSink<W: Write> {
    Csv(CsvSink<W>),
    Json(JsonSink<W>),
}

impl<W: Write> OutputSink<W> {
    fn new(out: W, format: DataFormat) -> Result<Self, AppError> {
        match format {
            DataFormat::Csv => Ok(OutputSink::Csv(CsvSink::new(out)?)),
            DataFormat::Json => Ok(OutputSink::Json(JsonSink::new(out)?)),
        }
    }

    fn write_film(&mut self, film: &Film) -> Result<(), AppError> {
        match self {
            OutputSink::Csv(sink) => sink.write_film(film),
            OutputSink::Json(sink) => sink.write_film(film),
        }
    }

    fn finalize(&mut self) -> Result<(), AppError> {
        match self {
            OutputSink::Csv(sink) => sink.finalize(),
            OutputSink::Json(sink) => sink.finalize(),
        }
    }
}

/// Writes `films` to `out` in discovery order.
pub fn write_films<W: Write>(out: W, format: DataFormat, films: &[Film]) -> Result<(), AppError> {
    let mut sink = OutputSink::new(out, format)?;
    for film in films {
        sink.write_film(film)?;
    }
    sink.finalize()
}

pub fn write_films_to_path(path: &str, format: DataFormat, films: &[Film]) -> Result<(), AppError> {
    let file = File::create(path)?;
    write_films(io::BufWriter::new(file), format, films)
}

pub fn detect_data_format(path: &str, fallback: DataFormat) -> DataFormat {
    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".json") {
        DataFormat::Json
    } else if lower.ends_with(".csv") {
        DataFormat::Csv
    } else {
        fallback
    }
}

pub fn default_output_path(username: &str, format: DataFormat) -> String {
    let user = username
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect::<String>();
    let ts = Utc::now().format("%Y%m%d_%H%M%S");
    match format {
        DataFormat::Csv => format!("watchlist_{user}_{ts}.csv"),
        DataFormat::Json => format!("watchlist_{user}_{ts}.json"),
    }
}
