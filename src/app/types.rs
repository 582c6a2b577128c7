use serde::{Deserialize, Serialize};

/// One entry in a resolved watchlist.
///
/// Wire names follow the public watchlist API (`slug`, `image`, `filmPath`)
/// so serialized output stays compatible with existing clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Film {
    pub name: String,
    /// Canonical absolute URL of the film's detail page.
    #[serde(rename = "slug")]
    pub identity: String,
    #[serde(rename = "image")]
    pub poster_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(rename = "filmPath")]
    pub source_path: String,
    #[serde(default)]
    pub overview: String,
}

/// Minimal record lifted from a listing page before enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilmStub {
    pub name: String,
    pub identity: String,
    pub source_path: String,
    pub year: Option<String>,
    pub inline_poster: String,
}

impl FilmStub {
    pub(crate) fn into_film(self, poster_url: String) -> Film {
        Film {
            name: self.name,
            identity: self.identity,
            poster_url,
            year: self.year,
            source_path: self.source_path,
            overview: String::new(),
        }
    }
}

/// Result of the single-film poster lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosterResult {
    #[serde(rename = "poster")]
    pub poster_url: String,
    pub overview: String,
}

/// A film identity produced by an external recommendation source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(rename = "slug")]
    pub film_url: String,
    #[serde(default)]
    pub image: String,
}
