//! Best-effort price/rating recovery from a detail page.

use scraper::Html;

use crate::fetch::Fetcher;
use crate::formats::NormalizedFields;
use crate::list_page::document_text;
use crate::normalize::{parse_price, parse_rating};

/// Which fields the caller still needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingFields {
    pub price: bool,
    pub rating: bool,
}

impl MissingFields {
    pub fn of(fields: &NormalizedFields) -> Self {
        Self {
            price: fields.price.is_none(),
            rating: fields.rating.is_none(),
        }
    }

    pub fn any(self) -> bool {
        self.price || self.rating
    }
}

/// Fetches `link` once and parses only the `missing` fields. Fetch failures
/// yield absent values instead of errors.
pub fn supplement<F: Fetcher + ?Sized>(
    fetcher: &F,
    link: &str,
    referer: &str,
    missing: MissingFields,
) -> NormalizedFields {
    if !missing.any() {
        return NormalizedFields::default();
    }

    let html = match fetcher.fetch(link, referer) {
        Ok(html) => html,
        Err(err) => {
            tracing::debug!(link, err = %format!("{err:#}"), "detail fetch failed");
            return NormalizedFields::default();
        }
    };

    let found = extract_from_detail(&html, missing);
    tracing::debug!(link, price = ?found.price, rating = ?found.rating, "detail supplement");
    found
}

/// Raw markup scan first, then the parsed document's text for whatever is
/// still absent.
pub fn extract_from_detail(html: &str, missing: MissingFields) -> NormalizedFields {
    let mut found = NormalizedFields {
        price: missing.price.then(|| parse_price(html)).flatten(),
        rating: missing.rating.then(|| parse_rating(html)).flatten(),
    };

    let price_pending = missing.price && found.price.is_none();
    let rating_pending = missing.rating && found.rating.is_none();
    if price_pending || rating_pending {
        let text = document_text(&Html::parse_document(html));
        if price_pending {
            found.price = parse_price(&text);
        }
        if rating_pending {
            found.rating = parse_rating(&text);
        }
    }

    found
}
