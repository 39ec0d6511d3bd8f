use std::time::Duration;
use tracing::info;

use crate::error::{instrumented, ErrorContext, ScrapeResult};
use crate::session::BrowserSession;

/// Press End on the page `max_iterations` times, pausing `settle_delay` after
/// each press so lazy-loaded content can render.
///
/// Runs every iteration; there is no check for whether the page grew.
pub async fn scroll_to_bottom<S: BrowserSession>(
    session: &S,
    max_iterations: usize,
    settle_delay: Duration,
) -> ScrapeResult<()> {
    let context = ErrorContext::new("scroll_to_bottom", "scroll");
    instrumented(context, async {
        for _ in 0..max_iterations {
            let url = session.current_url().await?;
            info!("Scrolling {} to the end", url);
            session.press_end().await?;
            tokio::time::sleep(settle_delay).await;
        }
        Ok(())
    })
    .await
}
