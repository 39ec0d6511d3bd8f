use async_trait::async_trait;
use tracing::{info, warn};

use super::selectors::amazon_ranking as sel;
use super::records::{RankingFields, RankingRecord};
use super::PageScraper;
use crate::crawl::fields::FieldSelector;
use crate::crawl::locator::find_all;
use crate::error::{instrumented, ErrorContext, ScrapeResult};
use crate::session::{BrowserSession, Locator};

/// Amazon best-seller ranking page: one record per ranked card
pub struct AmazonRankingScraper {
    content: Locator,
    rank: FieldSelector,
    name: FieldSelector,
    price: FieldSelector,
    url: FieldSelector,
}

impl Default for AmazonRankingScraper {
    fn default() -> Self {
        Self {
            content: Locator::css(sel::CONTENT),
            rank: FieldSelector::text("rank", Locator::class_name(sel::RANK_CLASS)),
            name: FieldSelector::text("name", Locator::css(sel::NAME)),
            price: FieldSelector::text("price", Locator::class_name(sel::PRICE_CLASS))
                .with_fallback(Locator::class_name(sel::PRICE_FALLBACK_CLASS)),
            url: FieldSelector::attribute("url", Locator::css(sel::LINK), "href"),
        }
    }
}

#[async_trait]
impl PageScraper for AmazonRankingScraper {
    type Record = RankingRecord;

    fn name(&self) -> &'static str {
        "Amazon Product Ranking"
    }

    fn ready_locator(&self) -> Locator {
        self.content.clone()
    }

    async fn scrape<S: BrowserSession>(&self, session: &S) -> ScrapeResult<Vec<RankingRecord>> {
        let context = ErrorContext::new("scrape", "amazon_ranking");
        instrumented(context, async {
            let blocks = find_all(session, &self.content).await?;
            if blocks.is_empty() {
                warn!("{}: no content blocks, the page layout may have changed", self.name());
                return Ok(Vec::new());
            }

            info!("{}: Getting data", self.name());
            let mut records = Vec::with_capacity(blocks.len());
            for block in &blocks {
                let fields = RankingFields {
                    rank: self.rank.extract(block).await?,
                    name: self.name.extract(block).await?,
                    price: self.price.extract(block).await?,
                    url: self.url.extract(block).await?,
                };
                records.push(RankingRecord::assemble(fields));
            }

            info!("{}: {}", self.name(), records.len());
            Ok(records)
        })
        .await
    }
}
