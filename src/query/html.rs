use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::models::RawItem;
use crate::parsers::clean_text;
use crate::query::PageQuery;
use crate::utils::http::fetch_with_retry;

/// Page query over server-rendered HTML.
///
/// Each call fetches one page, returns its listing cards and moves on to the
/// next page when the page links to one. After the last page it starts over
/// from the first, which is where newly posted listings show up.
pub struct HtmlPageQuery {
    client: Client,
    start_url: Url,
    current_url: Url,
    listing_selector: Selector,
    fragment_selector: Selector,
    next_page_selector: Option<Selector>,
    max_retries: u32,
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| anyhow::anyhow!("Failed to parse selector {:?}: {:?}", selector, e))
}

impl HtmlPageQuery {
    pub fn new(client: Client, config: &Config) -> Result<Self> {
        let source = &config.source;
        let start_url = Url::parse(&source.start_url)
            .with_context(|| format!("Invalid start URL: {}", source.start_url))?;

        Ok(Self {
            client,
            current_url: start_url.clone(),
            start_url,
            listing_selector: parse_selector(&source.listing_selector)?,
            fragment_selector: parse_selector(&source.fragment_selector)?,
            next_page_selector: source
                .next_page_selector
                .as_deref()
                .map(parse_selector)
                .transpose()?,
            max_retries: config.max_retries,
        })
    }

    pub fn current_url(&self) -> &Url {
        &self.current_url
    }
}

#[async_trait]
impl PageQuery for HtmlPageQuery {
    async fn fetch_batch(&mut self) -> Result<Vec<RawItem>> {
        let page_url = self.current_url.clone();
        debug!("Fetching listings page {}", page_url);

        let response = fetch_with_retry(&self.client, page_url.as_str(), self.max_retries).await?;
        let html = response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", page_url))?;

        // Html is not Send, so all parsing happens before the next await.
        let page = extract_page(
            &html,
            &page_url,
            &self.listing_selector,
            &self.fragment_selector,
            self.next_page_selector.as_ref(),
        );

        info!("Found {} listing cards on {}", page.items.len(), page_url);

        self.current_url = match page.next_page {
            Some(next) if next != page_url => next,
            _ => self.start_url.clone(),
        };

        Ok(page.items)
    }
}

struct ExtractedPage {
    items: Vec<RawItem>,
    next_page: Option<Url>,
}

fn extract_page(
    html: &str,
    page_url: &Url,
    listing_selector: &Selector,
    fragment_selector: &Selector,
    next_page_selector: Option<&Selector>,
) -> ExtractedPage {
    let document = Html::parse_document(html);

    let mut items = Vec::new();
    for anchor in document.select(listing_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };

        // Relative hrefs are resolved here; anything unparsable is passed
        // through untouched and rejected per item by the extractor.
        let href = page_url
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string());

        // Empty spans are kept: the extractor reads fragments by position.
        let fragments = anchor
            .select(fragment_selector)
            .map(|el| clean_text(&el.text().collect::<String>()))
            .collect();

        items.push(RawItem::new(href, fragments));
    }

    let next_page = next_page_selector
        .and_then(|selector| document.select(selector).next())
        .and_then(|link| link.value().attr("href"))
        .and_then(|href| page_url.join(href).ok());

    ExtractedPage { items, next_page }
}
