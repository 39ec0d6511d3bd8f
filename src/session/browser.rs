#[cfg(feature = "browser")]
use async_trait::async_trait;
#[cfg(feature = "browser")]
use playwright::api::frame::FrameState;
#[cfg(feature = "browser")]
use playwright::api::{Browser, BrowserContext, ElementHandle, Page};
#[cfg(feature = "browser")]
use playwright::Playwright;
#[cfg(feature = "browser")]
use std::time::Duration;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use super::{BrowserSession, ElementRoot, Locator, PageElement};
use super::SessionProvider;
use crate::config::BrowserConfig;
#[cfg(feature = "browser")]
use crate::error::ScrapeError;
use crate::error::ScrapeResult;

#[cfg(feature = "browser")]
fn browser_error(error: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::browser(error.to_string())
}

/// Whether the driver gave up waiting, as opposed to failing
#[cfg(feature = "browser")]
fn is_timeout(error: &playwright::Error) -> bool {
    matches!(error, playwright::Error::Timeout) || is_timeout_message(&error.to_string())
}

/// Driver responses name the JS error class; only `TimeoutError` means "not yet"
#[cfg(any(feature = "browser", test))]
fn is_timeout_message(message: &str) -> bool {
    message.contains("TimeoutError") || message.starts_with("Timeout ")
}

/// Playwright selector string for a locator
#[cfg(feature = "browser")]
fn playwright_selector(locator: &Locator) -> String {
    match locator {
        Locator::XPath(expr) => format!("xpath={}", expr),
        other => format!("css={}", other.to_css().unwrap_or_default()),
    }
}

/// Launches Chromium sessions through Playwright
#[cfg(feature = "browser")]
pub struct PlaywrightProvider {
    config: BrowserConfig,
}

/// Live Chromium page
#[cfg(feature = "browser")]
pub struct PlaywrightSession {
    _playwright: Playwright,
    browser: Browser,
    _context: BrowserContext,
    page: Page,
}

/// Element handle inside a live page
#[cfg(feature = "browser")]
pub struct PlaywrightElement {
    handle: ElementHandle,
}

// Playwright handles are channel proxies to the driver process
#[cfg(feature = "browser")]
unsafe impl Send for PlaywrightSession {}
#[cfg(feature = "browser")]
unsafe impl Sync for PlaywrightSession {}
#[cfg(feature = "browser")]
unsafe impl Send for PlaywrightElement {}
#[cfg(feature = "browser")]
unsafe impl Sync for PlaywrightElement {}

#[cfg(feature = "browser")]
impl PlaywrightProvider {
    pub fn new(config: &BrowserConfig) -> ScrapeResult<Self> {
        Ok(Self {
            config: config.clone(),
        })
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl SessionProvider for PlaywrightProvider {
    type Session = PlaywrightSession;

    async fn open(&self) -> ScrapeResult<PlaywrightSession> {
        info!("Initial Chromium session (headless: {})", self.config.headless);

        let playwright = Playwright::initialize().await.map_err(browser_error)?;
        playwright.prepare().map_err(browser_error)?;

        let browser = playwright
            .chromium()
            .launcher()
            .headless(self.config.headless)
            .launch()
            .await
            .map_err(browser_error)?;

        let mut context_builder = browser.context_builder();
        if let Some(user_agent) = &self.config.user_agent {
            context_builder = context_builder.user_agent(user_agent);
        }
        let context = context_builder.build().await.map_err(browser_error)?;

        let page = context.new_page().await.map_err(browser_error)?;
        page.set_default_timeout((self.config.navigation_timeout_seconds * 1000) as u32)
            .await
            .map_err(browser_error)?;

        tokio::time::sleep(Duration::from_millis(self.config.launch_settle_ms)).await;

        Ok(PlaywrightSession {
            _playwright: playwright,
            browser,
            _context: context,
            page,
        })
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl ElementRoot for PlaywrightSession {
    type Element = PlaywrightElement;

    async fn query_all(&self, locator: &Locator) -> ScrapeResult<Vec<PlaywrightElement>> {
        let handles = self
            .page
            .query_selector_all(&playwright_selector(locator))
            .await
            .map_err(browser_error)?;
        Ok(handles.into_iter().map(|handle| PlaywrightElement { handle }).collect())
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl ElementRoot for PlaywrightElement {
    type Element = PlaywrightElement;

    async fn query_all(&self, locator: &Locator) -> ScrapeResult<Vec<PlaywrightElement>> {
        let handles = self
            .handle
            .query_selector_all(&playwright_selector(locator))
            .await
            .map_err(browser_error)?;
        Ok(handles.into_iter().map(|handle| PlaywrightElement { handle }).collect())
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageElement for PlaywrightElement {
    async fn text(&self) -> ScrapeResult<String> {
        let text = self.handle.inner_text().await.map_err(browser_error)?;
        Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    async fn attribute(&self, name: &str) -> ScrapeResult<Option<String>> {
        self.handle.get_attribute(name).await.map_err(browser_error)
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl BrowserSession for PlaywrightSession {
    async fn current_url(&self) -> ScrapeResult<String> {
        self.page.url().map_err(browser_error)
    }

    async fn navigate(&self, url: &str) -> ScrapeResult<()> {
        self.page
            .goto_builder(url)
            .goto()
            .await
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> ScrapeResult<bool> {
        let waited = self
            .page
            .wait_for_selector_builder(&playwright_selector(locator))
            .state(FrameState::Attached)
            .timeout(timeout.as_millis() as f64)
            .wait_for_selector()
            .await;

        match waited {
            Ok(handle) => Ok(handle.is_some()),
            Err(e) if is_timeout(&e) => {
                debug!("Waiting for {} timed out: {}", locator, e);
                Ok(false)
            }
            Err(e) => Err(browser_error(e)),
        }
    }

    async fn reload(&self) -> ScrapeResult<()> {
        self.page
            .reload_builder()
            .reload()
            .await
            .map_err(browser_error)?;
        Ok(())
    }

    async fn press_end(&self) -> ScrapeResult<()> {
        self.page
            .press_builder("body", "End")
            .press()
            .await
            .map_err(browser_error)
    }

    async fn close(self) -> ScrapeResult<()> {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {}", e);
            return Err(browser_error(e));
        }
        Ok(())
    }
}

// Stub implementation when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct PlaywrightProvider;

#[cfg(not(feature = "browser"))]
impl PlaywrightProvider {
    pub fn new(_config: &BrowserConfig) -> ScrapeResult<Self> {
        Err(crate::error::ScrapeError::FeatureDisabled {
            feature: "browser".to_string(),
        })
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait::async_trait]
impl SessionProvider for PlaywrightProvider {
    type Session = super::SnapshotSession;

    async fn open(&self) -> ScrapeResult<super::SnapshotSession> {
        Err(crate::error::ScrapeError::FeatureDisabled {
            feature: "browser".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_timeouts_count_as_not_yet() {
        assert!(is_timeout_message(
            "TimeoutError: Timeout 5000ms exceeded while waiting for selector \"div#centerCol\""
        ));
        assert!(is_timeout_message("Timeout 5000ms exceeded."));
        assert!(!is_timeout_message(
            "Error: Unexpected token \"[\" while parsing selector \"div[\""
        ));
        assert!(!is_timeout_message("Target page, context or browser has been closed"));
    }

    #[cfg(feature = "browser")]
    #[test]
    fn test_timeout_variant_and_selector_engines() {
        assert!(is_timeout(&playwright::Error::Timeout));
        assert_eq!(playwright_selector(&Locator::class_name("zg-bdg-text")), "css=.zg-bdg-text");
        assert_eq!(playwright_selector(&Locator::xpath("//div")), "xpath=//div");
    }

    #[cfg(not(feature = "browser"))]
    #[test]
    fn test_provider_reports_disabled_feature() {
        let result = PlaywrightProvider::new(&BrowserConfig::default());
        assert!(matches!(
            result,
            Err(crate::error::ScrapeError::FeatureDisabled { .. })
        ));
    }
}
