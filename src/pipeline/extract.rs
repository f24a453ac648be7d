use tracing::{debug, warn};
use url::Url;

use crate::error::HarvestError;
use crate::models::{Listing, ListingId, RawItem};
use crate::parsers::parse_price;
use crate::pipeline::SeenSet;

/// Turns raw listing cards into [`Listing`]s, skipping ones already delivered.
#[derive(Debug, Default)]
pub struct RecordExtractor {
    seen: SeenSet,
}

impl RecordExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Build a listing from one card.
    ///
    /// `Ok(None)` means the card was skipped: either its href is not a valid
    /// URL or the listing was already extracted. Fragments are positional
    /// (price, title, location); missing ones stay empty. Only a bad price is
    /// an error. The identifier is marked seen only once extraction succeeded,
    /// so a card that rendered incompletely is retried on a later poll.
    pub fn extract(&mut self, item: &RawItem) -> Result<Option<Listing>, HarvestError> {
        let link = match Url::parse(&item.href) {
            Ok(link) => link,
            Err(e) => {
                warn!("Failed to parse the URL of the listing {:?}: {}", item.href, e);
                return Ok(None);
            }
        };

        let identifier = ListingId::from_url(&link);
        if self.seen.contains(&identifier) {
            debug!("Skipping already processed item: {}", identifier);
            return Ok(None);
        }

        let mut fragments = item.fragments.iter();

        let (currency, amount) = match fragments.next() {
            Some(text) => parse_price(text).map_err(|source| HarvestError::Extract {
                href: item.href.clone(),
                source,
            })?,
            None => (String::new(), 0),
        };
        let title = fragments.next().cloned().unwrap_or_default();
        let location = fragments.next().cloned().unwrap_or_default();

        self.seen.mark_seen(identifier.clone());

        Ok(Some(Listing {
            amount,
            currency,
            title,
            location,
            identifier,
            link,
        }))
    }

    /// Extract a whole batch in order. The first bad price aborts the batch
    /// and nothing from it is returned.
    pub fn extract_batch(&mut self, items: &[RawItem]) -> Result<Vec<Listing>, HarvestError> {
        let mut listings = Vec::new();
        for item in items {
            if let Some(listing) = self.extract(item)? {
                listings.push(listing);
            }
        }
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PriceError;
    use pretty_assertions::assert_eq;

    fn fragments(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extracts_positional_fields() {
        let mut extractor = RecordExtractor::new();
        let item = RawItem::new(
            "https://example.com/marketplace/item/42?ref=feed",
            fragments(&["$50", "Bike", "Downtown", "extra"]),
        );

        let listing = extractor.extract(&item).unwrap().unwrap();

        assert_eq!(
            listing,
            Listing {
                amount: 50,
                currency: "$".to_string(),
                title: "Bike".to_string(),
                location: "Downtown".to_string(),
                identifier: ListingId("/marketplace/item/42".to_string()),
                link: Url::parse("https://example.com/marketplace/item/42?ref=feed").unwrap(),
            }
        );
    }

    #[test]
    fn same_path_with_different_query_is_skipped() {
        let mut extractor = RecordExtractor::new();
        let first = RawItem::new(
            "https://example.com/marketplace/item/42?ref=feed",
            fragments(&["$50", "Bike", "Downtown"]),
        );
        let second = RawItem::new(
            "https://example.com/marketplace/item/42?ref=search",
            fragments(&["$45", "Bike (reduced)", "Downtown"]),
        );

        assert!(extractor.extract(&first).unwrap().is_some());
        assert!(extractor.extract(&second).unwrap().is_none());
        assert_eq!(extractor.seen().len(), 1);
    }

    #[test]
    fn missing_fragments_stay_empty() {
        let mut extractor = RecordExtractor::new();

        let bare = extractor
            .extract(&RawItem::new("https://example.com/marketplace/item/1", vec![]))
            .unwrap()
            .unwrap();
        assert_eq!((bare.amount, bare.currency.as_str(), bare.title.as_str()), (0, "", ""));

        let titled = extractor
            .extract(&RawItem::new(
                "https://example.com/marketplace/item/2",
                fragments(&["FREE", "Sofa"]),
            ))
            .unwrap()
            .unwrap();
        assert!(titled.is_free());
        assert_eq!(titled.title, "Sofa");
        assert_eq!(titled.location, "");
    }

    #[test]
    fn invalid_url_is_skipped_without_error() {
        let mut extractor = RecordExtractor::new();

        let result = extractor.extract(&RawItem::new("not a url", fragments(&["$1"])));

        assert!(result.unwrap().is_none());
        assert!(extractor.seen().is_empty());
    }

    #[test]
    fn bad_price_is_an_error_and_not_marked_seen() {
        let mut extractor = RecordExtractor::new();
        let item = RawItem::new(
            "https://example.com/marketplace/item/9",
            fragments(&["Contact seller", "Car"]),
        );

        let err = extractor.extract(&item).unwrap_err();

        assert!(matches!(
            err,
            HarvestError::Extract {
                source: PriceError::UnrecognizedFormat(_),
                ..
            }
        ));
        assert!(extractor.seen().is_empty());
    }

    #[test]
    fn batch_aborts_on_first_bad_price() {
        let mut extractor = RecordExtractor::new();
        let batch = vec![
            RawItem::new("https://example.com/marketplace/item/1", fragments(&["$1", "A"])),
            RawItem::new("https://example.com/marketplace/item/2", fragments(&["1000", "B"])),
            RawItem::new("https://example.com/marketplace/item/3", fragments(&["$3", "C"])),
        ];

        assert!(extractor.extract_batch(&batch).is_err());
    }

    #[test]
    fn batch_preserves_order_and_dedups_within_batch() {
        let mut extractor = RecordExtractor::new();
        let batch = vec![
            RawItem::new("https://example.com/marketplace/item/3", fragments(&["$3", "C"])),
            RawItem::new("https://example.com/marketplace/item/1", fragments(&["$1", "A"])),
            RawItem::new("https://example.com/marketplace/item/3?x=1", fragments(&["$3", "C"])),
            RawItem::new("https://example.com/marketplace/item/2", fragments(&["$2", "B"])),
        ];

        let titles: Vec<String> = extractor
            .extract_batch(&batch)
            .unwrap()
            .into_iter()
            .map(|l| l.title)
            .collect();

        assert_eq!(titles, vec!["C", "A", "B"]);
    }
}
