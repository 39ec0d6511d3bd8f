use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use super::records::{WayfairFields, WayfairRecord};
use super::selectors::wayfair as sel;
use super::PageScraper;
use crate::crawl::fields::FieldSelector;
use crate::crawl::locator::find_all;
use crate::error::{instrumented, ErrorContext, ScrapeError, ScrapeResult};
use crate::session::{BrowserSession, Locator};

/// Wayfair category listing: one record per product card link
pub struct WayfairScraper {
    content: Locator,
    title: FieldSelector,
    brand: FieldSelector,
    rating: FieldSelector,
    rating_count: FieldSelector,
    list_price: FieldSelector,
    shipping_fee: FieldSelector,
    new_price: FieldSelector,
    sponsored: FieldSelector,
    rating_pattern: Regex,
}

impl WayfairScraper {
    pub fn new() -> ScrapeResult<Self> {
        let rating_pattern = Regex::new(sel::RATING_PATTERN)
            .map_err(|e| ScrapeError::invalid_selector(sel::RATING_PATTERN, e.to_string()))?;

        Ok(Self {
            content: Locator::css(sel::CONTENT),
            title: FieldSelector::text("title", Locator::css(sel::TITLE)),
            brand: FieldSelector::text("brand", Locator::css(sel::BRAND)),
            rating: FieldSelector::text("rating", Locator::css(sel::RATING)),
            rating_count: FieldSelector::text("rating_count", Locator::css(sel::RATING_COUNT)),
            list_price: FieldSelector::text("list_price", Locator::css(sel::LIST_PRICE)),
            shipping_fee: FieldSelector::text("shipping_fee", Locator::css(sel::SHIPPING_FEE))
                .with_fallback(Locator::css(sel::SHIPPING_FEE_FALLBACK)),
            new_price: FieldSelector::text("new_price", Locator::css(sel::NEW_PRICE)),
            sponsored: FieldSelector::text("sponsored", Locator::css(sel::SPONSORED)),
            rating_pattern,
        })
    }
}

#[async_trait]
impl PageScraper for WayfairScraper {
    type Record = WayfairRecord;

    fn name(&self) -> &'static str {
        "Wayfair"
    }

    fn ready_locator(&self) -> Locator {
        self.content.clone()
    }

    async fn scrape<S: BrowserSession>(&self, session: &S) -> ScrapeResult<Vec<WayfairRecord>> {
        let context = ErrorContext::new("scrape", "wayfair");
        instrumented(context, async {
            let blocks = find_all(session, &self.content).await?;
            if blocks.is_empty() {
                warn!("{}: no content blocks, the page layout may have changed", self.name());
                return Ok(Vec::new());
            }

            info!("{}: Getting data", self.name());
            let mut records = Vec::with_capacity(blocks.len());
            for block in &blocks {
                let fields = WayfairFields {
                    title: self.title.extract(block).await?,
                    brand: self.brand.extract(block).await?,
                    new_price: self.new_price.extract(block).await?,
                    list_price: self.list_price.extract(block).await?,
                    rating: self.rating.extract(block).await?,
                    rating_count: self.rating_count.extract(block).await?,
                    shipping_fee: self.shipping_fee.extract(block).await?,
                    sponsored: self.sponsored.extract(block).await?,
                };
                records.push(WayfairRecord::assemble(fields, &self.rating_pattern));
            }

            info!("{}: {}", self.name(), records.len());
            Ok(records)
        })
        .await
    }
}
