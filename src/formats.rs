use serde::{Deserialize, Serialize};

/// One result found on a list page, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateItem {
    pub title: String,
    pub author: String,
    pub publisher: String,
    /// Absolute URL, or empty when the card had no usable link.
    pub detail_link: String,
    pub raw_price_text: String,
    pub raw_rating_text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NormalizedFields {
    pub price: Option<i64>,
    pub rating: Option<f64>,
}

impl NormalizedFields {
    pub fn is_complete(&self) -> bool {
        self.price.is_some() && self.rating.is_some()
    }

    /// Fills only the fields that are still absent.
    pub fn merge_missing(&mut self, other: NormalizedFields) {
        if self.price.is_none() {
            self.price = other.price;
        }
        if self.rating.is_none() {
            self.rating = other.rating;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub price: Option<i64>,
    pub rating: Option<f64>,
    /// `[label, price bucket, rating bucket]`.
    pub tags: Vec<String>,
    pub source: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedBook {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub year: String,
    pub pages: String,
    pub tags: Vec<String>,
    pub description: String,
}
