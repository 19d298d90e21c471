//! Text fragment → typed value conversions, and the coarse buckets used as tags.
//!
//! Everything here is pure. Prices are whole won; ratings are always reported on
//! a 5-point scale.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::formats::NormalizedFields;

static PRICE_WITH_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9][0-9,]{3,})\s*원").expect("valid price regex"));
static PRICE_ANYWHERE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9][0-9,]{3,})").expect("valid price regex"));
static RATING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:별점|평점)?\s*([0-9]+(?:\.[0-9]+)?)\s*점?").expect("valid rating regex")
});

/// Scale ceiling. Larger values are assumed to come from a 10-point display.
const RATING_SCALE_MAX: f64 = 5.0;

/// First run of 4+ digits (commas allowed) followed by `원`, else the first such
/// run anywhere.
pub fn parse_price(text: &str) -> Option<i64> {
    let captures = PRICE_WITH_UNIT
        .captures(text)
        .or_else(|| PRICE_ANYWHERE.captures(text))?;
    let digits = captures.get(1)?.as_str().replace(',', "");
    digits.parse().ok()
}

/// Parses `평점 9.6`, `별점 4.7`, `4.5점` and bare numbers. Values above 5 are
/// halved and rounded to two decimals.
pub fn parse_rating(text: &str) -> Option<f64> {
    let captures = RATING.captures(text)?;
    let value: f64 = captures.get(1)?.as_str().parse().ok()?;
    if value > RATING_SCALE_MAX {
        return Some(round2(value / 2.0));
    }
    Some(value)
}

/// Normalizes both list-level fragments of a candidate.
pub fn normalize_fields(raw_price_text: &str, raw_rating_text: &str) -> NormalizedFields {
    NormalizedFields {
        price: parse_price(raw_price_text),
        rating: parse_rating(raw_rating_text),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceBucket {
    Unknown,
    Under10k,
    Between10k20k,
    Over20k,
}

impl PriceBucket {
    pub fn of(price: Option<i64>) -> Self {
        match price {
            None => Self::Unknown,
            Some(p) if p < 10_000 => Self::Under10k,
            Some(p) if p < 20_000 => Self::Between10k20k,
            Some(_) => Self::Over20k,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "가격 미상",
            Self::Under10k => "~1만원",
            Self::Between10k20k => "1~2만원",
            Self::Over20k => "2만원 이상",
        }
    }
}

impl fmt::Display for PriceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatingBucket {
    Unknown,
    R0To3,
    R3To4,
    R4To4_5,
    R4_5To5,
}

impl RatingBucket {
    pub fn of(rating: Option<f64>) -> Self {
        match rating {
            None => Self::Unknown,
            Some(r) if r < 3.0 => Self::R0To3,
            Some(r) if r < 4.0 => Self::R3To4,
            Some(r) if r < 4.5 => Self::R4To4_5,
            Some(_) => Self::R4_5To5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "★정보 없음",
            Self::R0To3 => "★0~3",
            Self::R3To4 => "★3~4",
            Self::R4To4_5 => "★4~4.5",
            Self::R4_5To5 => "★4.5~5",
        }
    }
}

impl fmt::Display for RatingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn bucket_price(price: Option<i64>) -> PriceBucket {
    PriceBucket::of(price)
}

pub fn bucket_rating(rating: Option<f64>) -> RatingBucket {
    RatingBucket::of(rating)
}

/// Always three tags: `[label, price bucket, rating bucket]`.
pub fn tags_for(label: &str, fields: &NormalizedFields) -> Vec<String> {
    vec![
        label.to_owned(),
        bucket_price(fields.price).label().to_owned(),
        bucket_rating(fields.rating).label().to_owned(),
    ]
}
