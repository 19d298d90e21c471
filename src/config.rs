use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cli::CrawlArgs;
use crate::list_page::ListPageSelectors;

pub const DEFAULT_QUOTA: usize = 10;

/// One search keyword: its tag label, the first results page, and how many
/// records to collect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTarget {
    pub label: String,
    pub query_url: String,
    #[serde(default = "default_quota")]
    pub quota: usize,
}

fn default_quota() -> usize {
    DEFAULT_QUOTA
}

impl SearchTarget {
    pub fn new(label: &str, query_url: &str) -> Self {
        Self {
            label: label.to_owned(),
            query_url: query_url.to_owned(),
            quota: DEFAULT_QUOTA,
        }
    }

    /// Results page `page` (1-based); existing query parameters are kept.
    pub fn page_url(&self, page: u32) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.query_url)
            .with_context(|| format!("parse query url: {}", self.query_url))?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        Ok(url)
    }
}

/// Site-specific knowledge: where things live in the markup and how to look
/// like a browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Base for resolving relative detail links.
    pub origin: String,
    pub search_referer: String,
    pub detail_referer: String,
    pub user_agent: String,
    pub accept_language: String,
    /// Written to every record's `source` field.
    pub source_label: String,

    pub card_selector: String,
    pub title_link_selectors: Vec<String>,
    pub author_selectors: Vec<String>,
    pub publisher_selectors: Vec<String>,
    pub price_selectors: Vec<String>,
    pub rating_selectors: Vec<String>,
    /// Anchors scanned when no card matches.
    pub detail_link_selector: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            origin: "https://product.kyobobook.co.kr".to_owned(),
            search_referer: "https://search.kyobobook.co.kr/".to_owned(),
            detail_referer: "https://product.kyobobook.co.kr/".to_owned(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/124.0.0.0 Safari/537.36"
                .to_owned(),
            accept_language: "ko-KR,ko;q=0.9,en-US;q=0.8".to_owned(),
            source_label: "KYBO search".to_owned(),
            card_selector: "li.prod_item".to_owned(),
            title_link_selectors: strings(&["a[href*='/product/detail']", "a.prod_info"]),
            author_selectors: strings(&[".author", ".prod_author"]),
            publisher_selectors: strings(&[".publisher", ".prod_publisher"]),
            price_selectors: strings(&[".price", ".sell_price", ".price_info"]),
            rating_selectors: strings(&["[class*='rating']", ".review", ".star"]),
            detail_link_selector: "a[href*='/product/detail']".to_owned(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub targets: Vec<SearchTarget>,
    pub max_pages: u32,
    pub list_delay_ms: u64,
    pub detail_delay_ms: u64,
    pub supplement_rate: f64,
    pub timeout_secs: u64,
    pub seed: Option<u64>,
    pub site: SiteProfile,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            targets: vec![
                SearchTarget::new(
                    "과학",
                    "https://search.kyobobook.co.kr/search?keyword=%EA%B3%BC%ED%95%99&gbCode=TOT&target=total",
                ),
                SearchTarget::new(
                    "인문사회",
                    "https://search.kyobobook.co.kr/search?keyword=%EC%9D%B8%EB%AC%B8%EC%82%AC%ED%9A%8C&gbCode=TOT&target=total",
                ),
                SearchTarget::new(
                    "문학",
                    "https://search.kyobobook.co.kr/search?keyword=%EB%AC%B8%ED%95%99&gbCode=TOT&target=total",
                ),
            ],
            max_pages: 3,
            list_delay_ms: 1200,
            detail_delay_ms: 800,
            supplement_rate: 0.7,
            timeout_secs: 15,
            seed: None,
            site: SiteProfile::default(),
        }
    }
}

impl CrawlConfig {
    /// Built-in defaults, overlaid by the YAML file when one is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("parse config: {}", path.display()))
    }

    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("deserialize crawl config")
    }

    pub fn apply_overrides(&mut self, args: &CrawlArgs) {
        if let Some(max_pages) = args.max_pages {
            self.max_pages = max_pages;
        }
        if let Some(quota) = args.quota {
            for target in &mut self.targets {
                target.quota = quota;
            }
        }
        if let Some(delay) = args.list_delay_ms {
            self.list_delay_ms = delay;
        }
        if let Some(delay) = args.detail_delay_ms {
            self.detail_delay_ms = delay;
        }
        if let Some(rate) = args.supplement_rate {
            self.supplement_rate = rate;
        }
        if args.seed.is_some() {
            self.seed = args.seed;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.targets.is_empty() {
            anyhow::bail!("config has no search targets");
        }
        for target in &self.targets {
            if target.label.trim().is_empty() {
                anyhow::bail!("search target label must not be empty: {}", target.query_url);
            }
            target
                .page_url(1)
                .with_context(|| format!("search target {:?}", target.label))?;
        }
        if self.max_pages == 0 {
            anyhow::bail!("max_pages must be > 0");
        }
        if !(0.0..=1.0).contains(&self.supplement_rate) {
            anyhow::bail!(
                "supplement_rate must be within 0.0..=1.0, got {}",
                self.supplement_rate
            );
        }
        Url::parse(&self.site.origin)
            .with_context(|| format!("parse site origin: {}", self.site.origin))?;
        ListPageSelectors::compile(&self.site).context("compile site selectors")?;
        Ok(())
    }

    pub fn list_delay(&self) -> Duration {
        Duration::from_millis(self.list_delay_ms)
    }

    pub fn detail_delay(&self) -> Duration {
        Duration::from_millis(self.detail_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
