//! Search results page → candidate items.
//!
//! Extraction runs an ordered list of strategies over the parsed document and
//! keeps the first one that matches anything:
//!
//! 1. result cards, with a selector chain per field;
//! 2. every anchor that points at a detail page (title + link only).
//!
//! Items without a title are dropped after a strategy has been chosen, so
//! untitled cards still suppress the fallback. Missing markup never fails
//! extraction; it degrades to empty strings.

use anyhow::Context as _;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::SiteProfile;
use crate::formats::CandidateItem;

/// Ordered selectors for one field. The first selector whose first match has
/// non-empty text wins.
#[derive(Debug, Clone)]
pub struct SelectorChain {
    selectors: Vec<Selector>,
}

impl SelectorChain {
    pub fn compile(sources: &[String]) -> anyhow::Result<Self> {
        let selectors = sources
            .iter()
            .map(|source| parse_selector(source))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { selectors })
    }

    /// A matched element with blank text (e.g. a cover-image anchor) falls
    /// through to the next selector instead of ending the chain.
    pub fn first_element<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.selectors.iter().find_map(|selector| {
            let element = scope.select(selector).next()?;
            (!element_text(element).is_empty()).then_some(element)
        })
    }

    pub fn first_text(&self, scope: ElementRef<'_>) -> String {
        self.first_element(scope)
            .map(element_text)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct ListPageSelectors {
    card: Selector,
    title_link: SelectorChain,
    author: SelectorChain,
    publisher: SelectorChain,
    price: SelectorChain,
    rating: SelectorChain,
    detail_link: Selector,
}

impl ListPageSelectors {
    pub fn compile(site: &SiteProfile) -> anyhow::Result<Self> {
        Ok(Self {
            card: parse_selector(&site.card_selector).context("card selector")?,
            title_link: SelectorChain::compile(&site.title_link_selectors)
                .context("title link selectors")?,
            author: SelectorChain::compile(&site.author_selectors).context("author selectors")?,
            publisher: SelectorChain::compile(&site.publisher_selectors)
                .context("publisher selectors")?,
            price: SelectorChain::compile(&site.price_selectors).context("price selectors")?,
            rating: SelectorChain::compile(&site.rating_selectors).context("rating selectors")?,
            detail_link: parse_selector(&site.detail_link_selector)
                .context("detail link selector")?,
        })
    }
}

fn parse_selector(source: &str) -> anyhow::Result<Selector> {
    Selector::parse(source).map_err(|err| anyhow::anyhow!("invalid selector {source:?}: {err:?}"))
}

/// A way of turning a results page into candidates.
pub type ListStrategy = fn(&Html, &ListPageSelectors, &Url) -> Vec<CandidateItem>;

const STRATEGIES: &[(&str, ListStrategy)] = &[
    ("result cards", card_strategy),
    ("detail links", detail_link_strategy),
];

/// Parses `html` and returns candidates in document order. Relative links are
/// resolved against `origin`.
pub fn extract_candidates(
    html: &str,
    selectors: &ListPageSelectors,
    origin: &Url,
) -> Vec<CandidateItem> {
    let document = Html::parse_document(html);
    for (name, strategy) in STRATEGIES {
        let items = strategy(&document, selectors, origin);
        if !items.is_empty() {
            tracing::debug!(strategy = *name, items = items.len(), "list page extracted");
            return items
                .into_iter()
                .filter(|item| !item.title.is_empty())
                .collect();
        }
        tracing::debug!(strategy = *name, "strategy found no items");
    }
    Vec::new()
}

pub fn card_strategy(
    document: &Html,
    selectors: &ListPageSelectors,
    origin: &Url,
) -> Vec<CandidateItem> {
    document
        .select(&selectors.card)
        .map(|card| {
            let link = selectors.title_link.first_element(card);
            let title = link.map(element_text).unwrap_or_default();
            let href = link
                .and_then(|a| a.value().attr("href"))
                .unwrap_or_default();

            CandidateItem {
                title,
                author: selectors.author.first_text(card),
                publisher: selectors.publisher.first_text(card),
                detail_link: absolutize(origin, href),
                raw_price_text: selectors.price.first_text(card),
                raw_rating_text: selectors.rating.first_text(card),
            }
        })
        .collect()
}

pub fn detail_link_strategy(
    document: &Html,
    selectors: &ListPageSelectors,
    origin: &Url,
) -> Vec<CandidateItem> {
    document
        .select(&selectors.detail_link)
        .filter_map(|anchor| {
            let title = element_text(anchor);
            let href = anchor.value().attr("href").unwrap_or_default().trim();
            if title.is_empty() || href.is_empty() {
                return None;
            }
            Some(CandidateItem {
                title,
                detail_link: absolutize(origin, href),
                ..CandidateItem::default()
            })
        })
        .collect()
}

/// Resolves `href` against `origin`; empty stays empty, unresolvable stays as-is.
pub fn absolutize(origin: &Url, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }
    match origin.join(href) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_owned(),
    }
}

/// Text nodes trimmed and joined by single spaces.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn document_text(document: &Html) -> String {
    element_text(document.root_element())
}
