//! Test utilities: a scripted page query for producer tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::RawItem;
use crate::query::PageQuery;

/// A listing card for item `n` with the given price text.
pub fn card(n: usize, price: &str) -> RawItem {
    RawItem::new(
        format!("https://example.com/marketplace/item/{}?ref=feed", n),
        vec![price.to_string(), format!("item {}", n), "Downtown".to_string()],
    )
}

enum Script {
    /// Pops one batch per call, then returns empty batches.
    Batches(VecDeque<Result<Vec<RawItem>>>),
    /// Two never-seen-before cards per call.
    Endless,
}

pub struct MockPageQuery {
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl MockPageQuery {
    pub fn with_batches(batches: Vec<Result<Vec<RawItem>>>) -> Self {
        Self {
            script: Script::Batches(batches.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn endless() -> Self {
        Self {
            script: Script::Endless,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of `fetch_batch` calls, readable after the query moved
    /// into the producer.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl PageQuery for MockPageQuery {
    async fn fetch_batch(&mut self) -> Result<Vec<RawItem>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &mut self.script {
            Script::Batches(batches) => batches.pop_front().unwrap_or_else(|| Ok(Vec::new())),
            Script::Endless => Ok(vec![card(call * 2, "$5"), card(call * 2 + 1, "$6")]),
        }
    }
}
