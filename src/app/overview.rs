use scraper::{Html, Selector};
use tracing::debug;

use crate::app::fetch::{Fetcher, StageLimiter};

/// Overview extraction strategies, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverviewSource {
    Primary,
    Alternate,
    TestId,
    MetaDescription,
}

impl OverviewSource {
    pub const PRIORITY: [OverviewSource; 4] = [
        OverviewSource::Primary,
        OverviewSource::Alternate,
        OverviewSource::TestId,
        OverviewSource::MetaDescription,
    ];

    pub fn selector(self) -> &'static str {
        match self {
            OverviewSource::Primary => ".film-overview p",
            OverviewSource::Alternate => ".film-overview",
            OverviewSource::TestId => "[data-testid='film-overview']",
            OverviewSource::MetaDescription => "meta[name='description']",
        }
    }

    fn extract(self, doc: &Html) -> String {
        match self {
            OverviewSource::Primary => extract_paragraphs(doc, self.selector()),
            OverviewSource::MetaDescription => extract_meta_content(doc, self.selector()),
            OverviewSource::Alternate | OverviewSource::TestId => {
                extract_first_text(doc, self.selector())
            }
        }
    }
}

/// What the enrichment stages take from a film's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailPage {
    pub overview: Option<(OverviewSource, String)>,
    /// Preview-image metadata; already full resolution.
    pub preview_image: String,
}

pub fn parse_detail_page(html: &str) -> DetailPage {
    let doc = Html::parse_document(html);
    DetailPage {
        overview: extract_overview(&doc),
        preview_image: extract_preview_image(&doc),
    }
}

/// First strategy, in priority order, that yields non-empty text.
pub fn extract_overview(doc: &Html) -> Option<(OverviewSource, String)> {
    OverviewSource::PRIORITY.into_iter().find_map(|source| {
        let text = source.extract(doc);
        (!text.is_empty()).then_some((source, text))
    })
}

pub fn extract_preview_image(doc: &Html) -> String {
    extract_meta_content(doc, "meta[property='og:image']")
}

/// Fetches and parses a detail page under the detail stage's limits.
/// Failures are logged and reported as `None`.
pub async fn fetch_detail_page(
    fetcher: &Fetcher,
    stage: &StageLimiter,
    identity: &str,
) -> Option<DetailPage> {
    let _permit = stage.acquire().await.ok()?;
    match fetcher.get_text(identity).await {
        Ok(html) => Some(parse_detail_page(&html)),
        Err(err) => {
            debug!(identity, error = %err, "detail page fetch failed");
            None
        }
    }
}

fn extract_paragraphs(doc: &Html, selector: &str) -> String {
    let Ok(selector) = Selector::parse(selector) else {
        return String::new();
    };

    doc.select(&selector)
        .map(|el| normalize_text(&el.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn extract_first_text(doc: &Html, selector: &str) -> String {
    let Ok(selector) = Selector::parse(selector) else {
        return String::new();
    };

    for el in doc.select(&selector) {
        let text = normalize_text(&el.text().collect::<Vec<_>>().join(" "));
        if !text.is_empty() {
            return text;
        }
    }

    String::new()
}

fn extract_meta_content(doc: &Html, selector: &str) -> String {
    let Ok(selector) = Selector::parse(selector) else {
        return String::new();
    };

    doc.select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(normalize_text)
        .find(|content| !content.is_empty())
        .unwrap_or_default()
}

fn normalize_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
