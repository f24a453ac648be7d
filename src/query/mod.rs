use anyhow::Result;
use async_trait::async_trait;

use crate::models::RawItem;

mod html;

pub use html::HtmlPageQuery;

/// Source of listing cards.
///
/// Implementations own everything about reaching the page (sessions,
/// navigation, scrolling, element lookup). The harvester only ever asks for
/// "the next batch" and never shares the query with another task.
#[async_trait]
pub trait PageQuery: Send {
    /// Return the listing cards currently reachable. An empty batch means
    /// nothing new is available right now; an error ends the run.
    async fn fetch_batch(&mut self) -> Result<Vec<RawItem>>;
}
