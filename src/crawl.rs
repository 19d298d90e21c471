use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use url::Url;

use crate::cli::CrawlArgs;
use crate::config::{CrawlConfig, SearchTarget};
use crate::detail::{self, MissingFields};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::formats::{BookRecord, CandidateItem};
use crate::list_page::{ListPageSelectors, extract_candidates};
use crate::normalize::{normalize_fields, tags_for};
use crate::sampling::{Sampled, SupplementPolicy};

pub fn run(args: CrawlArgs) -> anyhow::Result<()> {
    let out_path = PathBuf::from(&args.out);
    crate::output::ensure_output_writable(&out_path, args.force)?;

    let mut config =
        CrawlConfig::load(args.config.as_deref().map(Path::new)).context("load crawl config")?;
    config.apply_overrides(&args);
    config.validate().context("validate crawl config")?;

    let fetcher = HttpFetcher::new(&config.site, config.timeout()).context("build fetcher")?;
    let policy = Sampled::new(config.supplement_rate, config.seed);
    let mut crawler = Crawler::new(&config, &fetcher, policy)?;

    let records = crawler.crawl_all();

    crate::output::write_json(&out_path, &records, args.force).context("write records")?;
    println!("wrote {} records to {}", records.len(), out_path.display());
    Ok(())
}

/// Why a keyword stopped paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    QuotaMet,
    PageLimit,
    FetchFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetOutcome {
    pub records: Vec<BookRecord>,
    pub pages_fetched: u32,
    pub stop: StopReason,
}

/// Sequential keyword crawler. One request in flight at a time.
pub struct Crawler<'a, F: Fetcher + ?Sized, P: SupplementPolicy> {
    config: &'a CrawlConfig,
    fetcher: &'a F,
    policy: P,
    selectors: ListPageSelectors,
    origin: Url,
}

impl<'a, F: Fetcher + ?Sized, P: SupplementPolicy> Crawler<'a, F, P> {
    pub fn new(config: &'a CrawlConfig, fetcher: &'a F, policy: P) -> anyhow::Result<Self> {
        let selectors = ListPageSelectors::compile(&config.site).context("compile selectors")?;
        let origin = Url::parse(&config.site.origin)
            .with_context(|| format!("parse site origin: {}", config.site.origin))?;
        Ok(Self {
            config,
            fetcher,
            policy,
            selectors,
            origin,
        })
    }

    /// All targets in configured order; within a target, page then document order.
    pub fn crawl_all(&mut self) -> Vec<BookRecord> {
        let config = self.config;
        let mut all = Vec::new();
        for target in &config.targets {
            let outcome = self.crawl_target(target);
            all.extend(outcome.records);
        }
        tracing::info!(records = all.len(), "crawl finished");
        all
    }

    pub fn crawl_target(&mut self, target: &SearchTarget) -> TargetOutcome {
        let mut records = Vec::new();
        let mut page = 1_u32;

        let stop = loop {
            if records.len() >= target.quota {
                break StopReason::QuotaMet;
            }
            if page > self.config.max_pages {
                break StopReason::PageLimit;
            }
            if page > 1 {
                pause(self.config.list_delay());
            }

            let html = match self.fetch_list_page(target, page) {
                Ok(html) => html,
                Err(err) => {
                    tracing::warn!(label = %target.label, page, "list page failed: {err:#}");
                    break StopReason::FetchFailed;
                }
            };

            let items = extract_candidates(&html, &self.selectors, &self.origin);
            if items.is_empty() {
                tracing::debug!(label = %target.label, page, "no items on page");
            }
            for item in items {
                if records.len() >= target.quota {
                    break;
                }
                records.push(self.build_record(target, item));
            }
            page += 1;
        };

        tracing::info!(
            label = %target.label,
            collected = records.len(),
            stop = ?stop,
            "keyword done"
        );
        TargetOutcome {
            records,
            pages_fetched: page - 1,
            stop,
        }
    }

    fn fetch_list_page(&self, target: &SearchTarget, page: u32) -> anyhow::Result<String> {
        let url = target.page_url(page)?;
        tracing::info!(label = %target.label, page, %url, "list page");
        self.fetcher
            .fetch(url.as_str(), &self.config.site.search_referer)
    }

    fn build_record(&mut self, target: &SearchTarget, item: CandidateItem) -> BookRecord {
        let mut fields = normalize_fields(&item.raw_price_text, &item.raw_rating_text);

        if !fields.is_complete()
            && !item.detail_link.is_empty()
            && self.policy.should_supplement()
        {
            let found = detail::supplement(
                self.fetcher,
                &item.detail_link,
                &self.config.site.detail_referer,
                MissingFields::of(&fields),
            );
            fields.merge_missing(found);
            pause(self.config.detail_delay());
        }

        BookRecord {
            tags: tags_for(&target.label, &fields),
            title: item.title,
            author: item.author,
            publisher: item.publisher,
            price: fields.price,
            rating: fields.rating,
            source: self.config.site.source_label.clone(),
            link: item.detail_link,
        }
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::sampling::{Always, Never};

    const ORIGIN: &str = "https://books.test";

    #[derive(Default)]
    struct StubFetcher {
        pages: HashMap<String, String>,
        calls: RefCell<Vec<String>>,
    }

    impl StubFetcher {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_owned(), body.to_owned());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl Fetcher for StubFetcher {
        fn fetch(&self, url: &str, _referer: &str) -> anyhow::Result<String> {
            self.calls.borrow_mut().push(url.to_owned());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("GET {url}: HTTP 404 Not Found"))
        }
    }

    fn search(keyword: &str) -> String {
        format!("{ORIGIN}/search?keyword={keyword}")
    }

    fn page(keyword: &str, n: u32) -> String {
        format!("{}&page={n}", search(keyword))
    }

    fn config(targets: &[(&str, &str, usize)], max_pages: u32) -> CrawlConfig {
        let mut config = CrawlConfig {
            targets: targets
                .iter()
                .map(|(label, keyword, quota)| SearchTarget {
                    label: (*label).to_owned(),
                    query_url: search(keyword),
                    quota: *quota,
                })
                .collect(),
            max_pages,
            list_delay_ms: 0,
            detail_delay_ms: 0,
            ..CrawlConfig::default()
        };
        config.site.origin = ORIGIN.to_owned();
        config
    }

    fn card(title: &str, detail: &str, price: &str, rating: &str) -> String {
        format!(
            r#"<li class="prod_item">
  <a href="{detail}">{title}</a>
  <span class="author">Author of {title}</span>
  <span class="publisher">Pub</span>
  <span class="price">{price}</span>
  <span class="rating">{rating}</span>
</li>"#
        )
    }

    fn list(cards: &[String]) -> String {
        format!("<html><body><ul>{}</ul></body></html>", cards.concat())
    }

    #[test]
    fn card_becomes_tagged_record() -> anyhow::Result<()> {
        let config = config(&[("과학", "sci", 1)], 3);
        let fetcher = StubFetcher::default().with(
            &page("sci", 1),
            &list(&[card("Book A", "/product/detail/A", "15,000원", "평점 4.2")]),
        );

        let mut crawler = Crawler::new(&config, &fetcher, Never)?;
        let records = crawler.crawl_all();

        assert_eq!(
            records,
            vec![BookRecord {
                title: "Book A".to_owned(),
                author: "Author of Book A".to_owned(),
                publisher: "Pub".to_owned(),
                price: Some(15000),
                rating: Some(4.2),
                tags: vec!["과학".to_owned(), "1~2만원".to_owned(), "★4~4.5".to_owned()],
                source: "KYBO search".to_owned(),
                link: format!("{ORIGIN}/product/detail/A"),
            }]
        );
        assert_eq!(fetcher.calls(), vec![page("sci", 1)]);
        Ok(())
    }

    #[test]
    fn complete_candidates_never_fetch_details() -> anyhow::Result<()> {
        let config = config(&[("과학", "sci", 10)], 1);
        let fetcher = StubFetcher::default().with(
            &page("sci", 1),
            &list(&[
                card("Book A", "/product/detail/A", "12,000원", "4.9점"),
                card("Book B", "/product/detail/B", "8,000원", "9.6점"),
            ]),
        );

        let mut crawler = Crawler::new(&config, &fetcher, Always)?;
        let records = crawler.crawl_all();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].rating, Some(4.8));
        assert_eq!(fetcher.calls(), vec![page("sci", 1)]);
        Ok(())
    }

    #[test]
    fn detail_fills_only_missing_fields() -> anyhow::Result<()> {
        let config = config(&[("문학", "lit", 1)], 1);
        let detail_url = format!("{ORIGIN}/product/detail/A");
        let fetcher = StubFetcher::default()
            .with(
                &page("lit", 1),
                &list(&[card("Book A", "/product/detail/A", "9,000원", "")]),
            )
            .with(&detail_url, "<p>평점 9.0</p><p>정가 25,000원</p>");

        let mut crawler = Crawler::new(&config, &fetcher, Always)?;
        let records = crawler.crawl_all();

        assert_eq!(records[0].price, Some(9000));
        assert_eq!(records[0].rating, Some(4.5));
        assert_eq!(records[0].tags, vec!["문학", "~1만원", "★4.5~5"]);
        assert_eq!(fetcher.calls(), vec![page("lit", 1), detail_url]);
        Ok(())
    }

    #[test]
    fn declined_or_failed_supplement_keeps_fields_absent() -> anyhow::Result<()> {
        let config = config(&[("문학", "lit", 1)], 1);
        let fetcher = StubFetcher::default().with(
            &page("lit", 1),
            &list(&[card("Book A", "/product/detail/A", "", "")]),
        );

        let records = Crawler::new(&config, &fetcher, Never)?.crawl_all();
        assert_eq!(records[0].price, None);
        assert_eq!(records[0].rating, None);
        assert_eq!(records[0].tags, vec!["문학", "가격 미상", "★정보 없음"]);
        assert_eq!(fetcher.calls().len(), 1);

        // Detail page is missing from the stub: enrichment is skipped, not fatal.
        let records = Crawler::new(&config, &fetcher, Always)?.crawl_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].price, None);
        Ok(())
    }

    #[test]
    fn failed_keyword_does_not_block_later_keywords() -> anyhow::Result<()> {
        let config = config(&[("과학", "sci", 5), ("문학", "lit", 5)], 2);
        let fetcher = StubFetcher::default().with(
            &page("lit", 1),
            &list(&[card("Book L", "/product/detail/L", "21,000원", "3.5")]),
        );

        let mut crawler = Crawler::new(&config, &fetcher, Never)?;
        let sci = crawler.crawl_target(&config.targets[0]);
        assert!(sci.records.is_empty());
        assert_eq!(sci.stop, StopReason::FetchFailed);

        let records = crawler.crawl_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Book L");
        assert_eq!(records[0].tags, vec!["문학", "2만원 이상", "★3~4"]);
        Ok(())
    }

    #[test]
    fn paging_stops_at_quota_mid_page() -> anyhow::Result<()> {
        let config = config(&[("과학", "sci", 3)], 3);
        let fetcher = StubFetcher::default()
            .with(
                &page("sci", 1),
                &list(&[
                    card("One", "/product/detail/1", "10,000원", "4"),
                    card("Two", "/product/detail/2", "10,000원", "4"),
                ]),
            )
            .with(
                &page("sci", 2),
                &list(&[
                    card("Three", "/product/detail/3", "10,000원", "4"),
                    card("Four", "/product/detail/4", "10,000원", "4"),
                ]),
            );

        let mut crawler = Crawler::new(&config, &fetcher, Never)?;
        let outcome = crawler.crawl_target(&config.targets[0]);

        let titles: Vec<_> = outcome.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);
        assert_eq!(outcome.stop, StopReason::QuotaMet);
        assert_eq!(outcome.pages_fetched, 2);
        assert_eq!(fetcher.calls(), vec![page("sci", 1), page("sci", 2)]);
        Ok(())
    }

    #[test]
    fn paging_stops_at_page_limit_and_keeps_partial_results() -> anyhow::Result<()> {
        let page_body = list(&[card("Same", "/product/detail/1", "10,000원", "4")]);
        let fetcher = StubFetcher::default()
            .with(&page("sci", 1), &page_body)
            .with(&page("sci", 2), &page_body)
            .with(&page("sci", 3), &page_body);

        let limited = config(&[("과학", "sci", 10)], 2);
        let outcome = Crawler::new(&limited, &fetcher, Never)?.crawl_target(&limited.targets[0]);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.stop, StopReason::PageLimit);

        let deeper = config(&[("과학", "sci", 10)], 5);
        let outcome = Crawler::new(&deeper, &fetcher, Never)?.crawl_target(&deeper.targets[0]);
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.stop, StopReason::FetchFailed);
        Ok(())
    }

    #[test]
    fn fallback_links_are_enriched_from_detail_pages() -> anyhow::Result<()> {
        let config = config(&[("인문사회", "hum", 10)], 1);
        let fetcher = StubFetcher::default()
            .with(
                &page("hum", 1),
                r#"<div class="new_layout">
  <a href="/product/detail/X">Book X</a>
  <a href="/product/detail/Y">Book Y</a>
</div>"#,
            )
            .with(&format!("{ORIGIN}/product/detail/X"), "평점 3.1 정가 11,000원");

        let records = Crawler::new(&config, &fetcher, Always)?.crawl_all();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Book X");
        assert_eq!(records[0].price, Some(11000));
        assert_eq!(records[0].rating, Some(3.1));
        assert_eq!(records[0].author, "");
        assert_eq!(records[1].title, "Book Y");
        assert_eq!(records[1].price, None);
        assert_eq!(records[1].link, format!("{ORIGIN}/product/detail/Y"));
        Ok(())
    }
}
