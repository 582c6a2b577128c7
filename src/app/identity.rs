//! Stable film identities.
//!
//! Every record is keyed by the canonical detail-page URL
//! (`<origin>/film/<slug>/`). Resolution is total: input that cannot be
//! turned into a film URL yields an empty string, which callers treat as
//! "cannot enrich".

use url::Url;

const FILM_SEGMENT: &str = "/film/";

/// Resolves a site-relative or absolute film href into its canonical URL.
pub fn film_identity(origin: &Url, raw_href: &str) -> String {
    let href = raw_href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("javascript:")
    {
        return String::new();
    }

    let Ok(mut url) = origin.join(href) else {
        return String::new();
    };
    if url.scheme() != "http" && url.scheme() != "https" {
        return String::new();
    }

    let slug = film_slug(url.path());
    if slug.is_empty() {
        return String::new();
    }

    url.set_path(&format!("{FILM_SEGMENT}{slug}/"));
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}

/// Extracts the slug following the `/film/` segment of a URL or path.
pub fn film_slug(url: &str) -> String {
    let Some((_, rest)) = url.split_once(FILM_SEGMENT) else {
        return String::new();
    };

    rest.split(['/', '?', '#'])
        .next()
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

/// Canonical identity for a bare slug.
pub fn identity_for_slug(origin: &Url, slug: &str) -> String {
    if slug.trim().is_empty() {
        return String::new();
    }
    film_identity(origin, &format!("{FILM_SEGMENT}{}/", slug.trim()))
}

/// First 4-digit path segment, if any.
pub fn release_year(path: &str) -> Option<String> {
    path.split('/')
        .find(|part| part.len() == 4 && part.bytes().all(|b| b.is_ascii_digit()))
        .map(ToString::to_string)
}
