use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

// NewType pattern for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub String);

impl ListingId {
    /// Derive the dedup key from a listing URL.
    ///
    /// Only the path is used: query strings and fragments change between
    /// page renders (tracking parameters and the like) while the path does not.
    pub fn from_url(url: &Url) -> Self {
        ListingId(url.path().to_string())
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unprocessed listing card as harvested from the page: the anchor's href and
/// the text fragments found inside it, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawItem {
    pub href: String,
    pub fragments: Vec<String>,
}

impl RawItem {
    pub fn new<S: Into<String>>(href: S, fragments: Vec<String>) -> Self {
        Self {
            href: href.into(),
            fragments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// 0 together with an empty currency means free or unspecified.
    pub amount: u64,
    pub currency: String,
    pub title: String,
    pub location: String,
    pub identifier: ListingId,
    pub link: Url,
}

impl Listing {
    pub fn is_free(&self) -> bool {
        self.amount == 0 && self.currency.is_empty()
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_free() {
            write!(f, "{} (free)", self.title)?;
        } else {
            write!(f, "{} ({}{})", self.title, self.currency, self.amount)?;
        }
        if !self.location.is_empty() {
            write!(f, " - {}", self.location)?;
        }
        Ok(())
    }
}
