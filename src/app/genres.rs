use tracing::debug;

const GENRE_SLUGS: [(&str, &str); 19] = [
    ("28", "action"),
    ("12", "adventure"),
    ("16", "animation"),
    ("35", "comedy"),
    ("80", "crime"),
    ("99", "documentary"),
    ("18", "drama"),
    ("10751", "family"),
    ("14", "fantasy"),
    ("36", "history"),
    ("27", "horror"),
    ("10402", "music"),
    ("9648", "mystery"),
    ("10749", "romance"),
    ("878", "sci-fi"),
    ("53", "thriller"),
    ("10752", "war"),
    ("37", "western"),
    ("10770", "tv-movie"),
];

/// Maps a comma-separated list of numeric genre ids to listing slugs.
///
/// Unknown ids are skipped; input order is preserved.
pub fn genre_ids_to_slugs(ids: &str) -> Vec<&'static str> {
    ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter_map(|id| {
            let slug = GENRE_SLUGS
                .iter()
                .find(|(known, _)| *known == id)
                .map(|(_, slug)| *slug);
            if slug.is_none() {
                debug!(genre_id = id, "unknown genre id");
            }
            slug
        })
        .collect()
}
