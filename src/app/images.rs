/// Fixed "no image available" poster.
pub const PLACEHOLDER_POSTER: &str = "https://watchlistpicker.com/noimagefound.jpg";

const LARGEST_SIZE_TOKENS: [&str; 2] = ["2000", "3000"];

// Applied in order; every occurrence is rewritten.
const SIZE_UPGRADES: [(&str, &str); 6] = [
    ("230", "2000"),
    ("345", "3000"),
    ("125", "2000"),
    ("187", "3000"),
    ("1000", "2000"),
    ("1500", "3000"),
];

const RESIZED_IMAGE_HOST: &str = "a.ltrbxd.com/resized";

const EMPTY_POSTER_MARKERS: [&str; 5] = [
    "empty-poster",
    "placeholder",
    "default-poster",
    "no-poster",
    "blank-poster",
];

/// Rewrites a poster URL to request the largest known size variant.
pub fn upscale(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if LARGEST_SIZE_TOKENS.iter().any(|token| raw.contains(token)) {
        return raw.to_string();
    }

    SIZE_UPGRADES
        .iter()
        .fold(raw.to_string(), |url, (small, large)| url.replace(small, large))
}

/// True when `url` carries no usable poster.
///
/// URLs served from the resizing host are always real images, even when
/// their path happens to contain one of the placeholder markers.
pub fn is_empty_poster(url: &str) -> bool {
    if url.trim().is_empty() {
        return true;
    }
    if url.contains(RESIZED_IMAGE_HOST) {
        return false;
    }

    let lower = url.to_ascii_lowercase();
    EMPTY_POSTER_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}
