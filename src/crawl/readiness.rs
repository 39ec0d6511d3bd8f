use std::time::Duration;
use tracing::{info, warn};

use crate::config::{ExhaustionPolicy, ReadinessConfig};
use crate::error::{instrumented, ErrorContext, ScrapeResult};
use crate::session::{BrowserSession, Locator};

/// What happened while waiting for a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessOutcome {
    /// The selector was seen
    pub appeared: bool,
    /// Attempts made, including the successful one
    pub attempts: usize,
    /// Reloads issued after timed-out attempts
    pub reloads: usize,
}

impl ReadinessOutcome {
    /// Whether every configured attempt ran without the selector appearing
    pub fn exhausted(&self) -> bool {
        !self.appeared && self.attempts > 0
    }

    /// Value reported to callers under `policy`
    pub fn reported(&self, policy: ExhaustionPolicy) -> bool {
        match policy {
            ExhaustionPolicy::Report => !self.exhausted(),
            ExhaustionPolicy::Ignore => true,
        }
    }
}

/// Wait for `locator` to appear, reloading the page after every attempt that
/// times out. Stops at the first attempt that sees the selector.
pub async fn probe_readiness<S: BrowserSession>(
    session: &S,
    locator: &Locator,
    max_attempts: usize,
    timeout_per_attempt: Duration,
) -> ScrapeResult<ReadinessOutcome> {
    let context = ErrorContext::new("probe_readiness", "readiness").with_data("locator", locator.to_string());
    instrumented(context, async {
        let mut outcome = ReadinessOutcome {
            appeared: false,
            attempts: 0,
            reloads: 0,
        };

        while outcome.attempts < max_attempts {
            outcome.attempts += 1;
            if session.wait_for(locator, timeout_per_attempt).await? {
                outcome.appeared = true;
                break;
            }
            session.reload().await?;
            outcome.reloads += 1;
        }

        let url = session.current_url().await?;
        info!("Waiting for {} with {} attempt(s)", url, outcome.attempts);
        if outcome.exhausted() {
            warn!("{} never appeared on {} after {} attempt(s)", locator, url, outcome.attempts);
        }
        Ok(outcome)
    })
    .await
}

/// Readiness gate with the configured attempt budget and exhaustion policy.
pub async fn wait_until_ready<S: BrowserSession>(
    session: &S,
    locator: &Locator,
    config: &ReadinessConfig,
) -> ScrapeResult<bool> {
    let outcome = probe_readiness(
        session,
        locator,
        config.max_attempts,
        config.timeout_per_attempt(),
    )
    .await?;
    Ok(outcome.reported(config.exhaustion))
}
