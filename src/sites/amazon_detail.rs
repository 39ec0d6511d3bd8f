use async_trait::async_trait;
use tracing::{info, warn};

use super::records::{DetailFields, DetailRecord};
use super::selectors::amazon_detail as sel;
use super::PageScraper;
use crate::crawl::fields::FieldSelector;
use crate::crawl::locator::find;
use crate::error::{instrumented, ErrorContext, ScrapeResult};
use crate::session::{BrowserSession, Locator};

/// Amazon product detail page.
///
/// The content block is the pair of the left (image) and center (buy box)
/// columns; without both there is nothing to scrape and the result is empty.
pub struct AmazonDetailScraper {
    left_column: Locator,
    center_column: Locator,
    title: FieldSelector,
    rating: FieldSelector,
    rating_count: FieldSelector,
    list_price: FieldSelector,
    price_whole: FieldSelector,
    price_fraction: FieldSelector,
    image_url: FieldSelector,
}

impl Default for AmazonDetailScraper {
    fn default() -> Self {
        Self {
            left_column: Locator::css(sel::LEFT_COLUMN),
            center_column: Locator::css(sel::CENTER_COLUMN),
            title: FieldSelector::text("title", Locator::css(sel::TITLE)),
            rating: FieldSelector::text("rating", Locator::css(sel::RATING)),
            rating_count: FieldSelector::text("rating_count", Locator::css(sel::RATING_COUNT)),
            list_price: FieldSelector::text("list_price", Locator::css(sel::LIST_PRICE)),
            price_whole: FieldSelector::text("price_whole", Locator::css(sel::PRICE_WHOLE)),
            price_fraction: FieldSelector::text("price_fraction", Locator::css(sel::PRICE_FRACTION)),
            image_url: FieldSelector::attribute("image_url", Locator::css(sel::IMAGE), "src"),
        }
    }
}

#[async_trait]
impl PageScraper for AmazonDetailScraper {
    type Record = DetailRecord;

    fn name(&self) -> &'static str {
        "Amazon Product Detail"
    }

    fn ready_locator(&self) -> Locator {
        self.center_column.clone()
    }

    async fn scrape<S: BrowserSession>(&self, session: &S) -> ScrapeResult<Vec<DetailRecord>> {
        let context = ErrorContext::new("scrape", "amazon_detail");
        instrumented(context, async {
            let left = find(session, &self.left_column).await?;
            let center = find(session, &self.center_column).await?;
            let (left, center) = match (left, center) {
                (Some(left), Some(center)) => (left, center),
                _ => {
                    warn!("{}: no content blocks, the page layout may have changed", self.name());
                    return Ok(Vec::new());
                }
            };

            info!("{}: Getting data", self.name());
            let fields = DetailFields {
                title: self.title.extract(&center).await?,
                rating: self.rating.extract(&center).await?,
                rating_count: self.rating_count.extract(&center).await?,
                list_price: self.list_price.extract(&center).await?,
                price_whole: self.price_whole.extract(&center).await?,
                price_fraction: self.price_fraction.extract(&center).await?,
                image_url: self.image_url.extract(&left).await?,
            };
            let record = DetailRecord::assemble(fields);

            info!("{}: {:?}", self.name(), record);
            Ok(vec![record])
        })
        .await
    }
}
