use tracing::info;

use crate::error::{instrumented, ErrorContext, ScrapeResult};
use crate::session::{ElementRoot, Locator};

/// First element matching `locator` under `root`, if any.
pub async fn find<R: ElementRoot>(root: &R, locator: &Locator) -> ScrapeResult<Option<R::Element>> {
    let context = ErrorContext::new("find", "locator").with_data("locator", locator.to_string());
    instrumented(context, async {
        info!("Getting an element by {} with \"{}\" value", locator.strategy(), locator.value());
        let elements = root.query_all(locator).await?;
        Ok(elements.into_iter().next())
    })
    .await
}

/// Every element matching `locator` under `root`, in document order.
pub async fn find_all<R: ElementRoot>(root: &R, locator: &Locator) -> ScrapeResult<Vec<R::Element>> {
    let context = ErrorContext::new("find_all", "locator").with_data("locator", locator.to_string());
    instrumented(context, async {
        info!(
            "Getting a list of elements by {} with \"{}\" value",
            locator.strategy(),
            locator.value()
        );
        root.query_all(locator).await
    })
    .await
}
