//! Crawl runs: one session, a list of URLs, and the
//! navigate, gate, scroll, scrape sequence for each.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::crawl::readiness::probe_readiness;
use crate::crawl::scroll::scroll_to_bottom;
use crate::error::{instrumented, ErrorContext, ScrapeError, ScrapeResult};
use crate::logging::{LogContext, PerformanceLogger};
use crate::session::{BrowserSession, SessionProvider};
use crate::sites::SiteKind;

/// Records scraped from one URL
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    pub url: String,
    /// What the readiness gate reported
    pub ready: bool,
    pub records: Vec<serde_json::Value>,
}

/// Outcome of a crawl run
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub run_id: String,
    pub site: String,
    pub pages: Vec<PageResult>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn record_count(&self) -> usize {
        self.pages.iter().map(|page| page.records.len()).sum()
    }
}

/// Drives sessions through the configured crawl sequence
pub struct Crawler {
    config: AppConfig,
}

impl Crawler {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Scrape every URL in order with one session from `provider`.
    ///
    /// The session is closed whether the run succeeds or fails. The first
    /// unexpected failure ends the run.
    pub async fn run<P: SessionProvider>(
        &self,
        provider: &P,
        site: SiteKind,
        urls: &[String],
    ) -> ScrapeResult<CrawlReport> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!("Starting crawl run {} for {} ({} URL(s))", run_id, site, urls.len());

        let session = provider.open().await?;

        let result = async {
            let mut pages = Vec::with_capacity(urls.len());
            for (idx, url) in urls.iter().enumerate() {
                pages.push(self.scrape_url(&session, site, url, &run_id).await?);

                if idx + 1 < urls.len() {
                    let pause = self.config.pacing.next_wait();
                    info!("Waiting {:?} before the next page", pause);
                    tokio::time::sleep(pause).await;
                }
            }
            Ok::<_, ScrapeError>(pages)
        }
        .await;

        if let Err(e) = session.close().await {
            let log_context = LogContext::new("crawler", "close_session")
                .with_run_id(run_id.as_str())
                .with_site(site.as_str())
                .with_error_category(e.category());
            crate::log_error!(log_context, e, "Failed to close session");
        }

        let pages = result?;
        let report = CrawlReport {
            run_id,
            site: site.to_string(),
            pages,
            started_at,
            completed_at: Utc::now(),
        };
        info!(
            "Crawl run {} finished with {} record(s)",
            report.run_id,
            report.record_count()
        );
        Ok(report)
    }

    /// Navigate to `url`, wait for it, optionally scroll, then scrape it
    async fn scrape_url<S: BrowserSession>(
        &self,
        session: &S,
        site: SiteKind,
        url: &str,
        run_id: &str,
    ) -> ScrapeResult<PageResult> {
        let context = ErrorContext::new("scrape_url", "crawler")
            .with_data("url", url)
            .with_data("site", site.as_str());
        instrumented(context, async {
            url::Url::parse(url).map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

            session.navigate(url).await?;

            let readiness = &self.config.readiness;
            let locator = site.ready_locator()?;
            let outcome = probe_readiness(
                session,
                &locator,
                readiness.max_attempts,
                readiness.timeout_per_attempt(),
            )
            .await?;
            let ready = outcome.reported(readiness.exhaustion);
            let gate_context = LogContext::new("crawler", "wait_until_ready")
                .with_run_id(run_id)
                .with_url(url)
                .with_selector(locator.to_string())
                .with_number_field("attempts", outcome.attempts as i64)
                .with_number_field("reloads", outcome.reloads as i64)
                .with_bool_field("ready", ready);
            crate::log_debug!(gate_context, "Readiness gate finished");

            if !ready {
                if readiness.require_ready {
                    return Err(ScrapeError::UnreadyPage {
                        url: url.to_string(),
                        selector: locator.to_string(),
                        attempts: outcome.attempts,
                    });
                }
                let log_context = LogContext::new("crawler", "wait_until_ready")
                    .with_run_id(run_id)
                    .with_site(site.as_str())
                    .with_url(url)
                    .with_selector(locator.to_string())
                    .with_status("unready")
                    .with_number_field("attempts", outcome.attempts as i64);
                crate::log_warn!(log_context, "Page not ready, scraping what is there");
            }

            if self.config.scroll.enabled {
                scroll_to_bottom(
                    session,
                    self.config.scroll.max_iterations,
                    self.config.scroll.settle_delay(),
                )
                .await?;
            }

            let perf = PerformanceLogger::new(
                LogContext::new("crawler", "scrape_page")
                    .with_run_id(run_id)
                    .with_site(site.as_str())
                    .with_url(url),
            );
            match site.scrape_json(session).await {
                Ok(records) => {
                    perf.finish_with_count("Page scraped", records.len());
                    Ok(PageResult {
                        url: url.to_string(),
                        ready,
                        records,
                    })
                }
                Err(e) => {
                    perf.finish_with_error("Page scrape failed", &e);
                    Err(e)
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExhaustionPolicy;
    use crate::session::SnapshotProvider;
    use std::path::PathBuf;

    const DETAIL_PAGE: &str = r#"<html><body>
        <div id="leftCol"><div class="imgTagWrapper"><img src="https://img.example/p.jpg"></div></div>
        <div id="centerCol"><span class="a-size-large product-title-word-break">Desk Lamp</span>
          <span class="a-price-whole">24</span><span class="a-price-fraction">50</span></div>
    </body></html>"#;

    const LOADING_PAGE: &str = "<html><body><p>Loading</p></body></html>";

    fn quiet_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.pacing.wait_ms = 0;
        config.pacing.delta_ms = 0;
        config
    }

    async fn write_pages(dir: &tempfile::TempDir, pages: &[&str]) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for (idx, page) in pages.iter().enumerate() {
            let path = dir.path().join(format!("snapshot-{}.html", idx));
            tokio::fs::write(&path, page).await.unwrap();
            paths.push(path);
        }
        paths
    }

    #[tokio::test]
    async fn test_run_scrapes_ready_page() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_pages(&dir, &[LOADING_PAGE, DETAIL_PAGE]).await;
        let provider = SnapshotProvider::new("https://www.amazon.com/dp/B0LAMP", files);

        let report = Crawler::new(quiet_config())
            .run(&provider, SiteKind::AmazonDetail, &["https://www.amazon.com/dp/B0LAMP".to_string()])
            .await
            .unwrap();

        assert_eq!(report.pages.len(), 1);
        assert!(report.pages[0].ready);
        assert_eq!(report.record_count(), 1);
        assert_eq!(report.pages[0].records[0]["title"], "Desk Lamp");
        assert_eq!(report.pages[0].records[0]["new_price"], "24.50");
        assert!(Uuid::parse_str(&report.run_id).is_ok());
    }

    #[tokio::test]
    async fn test_unready_page_still_scraped_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_pages(&dir, &[LOADING_PAGE]).await;
        let provider = SnapshotProvider::new("https://www.wayfair.com/sofas", files);

        let report = Crawler::new(quiet_config())
            .run(&provider, SiteKind::Wayfair, &["https://www.wayfair.com/sofas".to_string()])
            .await
            .unwrap();

        assert!(!report.pages[0].ready);
        assert!(report.pages[0].records.is_empty());
    }

    #[tokio::test]
    async fn test_require_ready_fails_unready_page() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_pages(&dir, &[LOADING_PAGE]).await;
        let provider = SnapshotProvider::new("https://www.wayfair.com/sofas", files);

        let mut config = quiet_config();
        config.readiness.require_ready = true;
        let result = Crawler::new(config)
            .run(&provider, SiteKind::Wayfair, &["https://www.wayfair.com/sofas".to_string()])
            .await;

        assert!(matches!(result, Err(ScrapeError::UnreadyPage { attempts: 3, .. })));
    }

    #[tokio::test]
    async fn test_ignore_policy_reports_ready() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_pages(&dir, &[LOADING_PAGE]).await;
        let provider = SnapshotProvider::new("https://www.wayfair.com/sofas", files);

        let mut config = quiet_config();
        config.readiness.exhaustion = ExhaustionPolicy::Ignore;
        config.readiness.require_ready = true;
        let report = Crawler::new(config)
            .run(&provider, SiteKind::Wayfair, &["https://www.wayfair.com/sofas".to_string()])
            .await
            .unwrap();

        assert!(report.pages[0].ready);
    }

    #[tokio::test]
    async fn test_zero_attempts_skips_the_gate() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_pages(&dir, &[LOADING_PAGE]).await;
        let provider = SnapshotProvider::new("https://www.wayfair.com/sofas", files);

        let mut config = quiet_config();
        config.readiness.max_attempts = 0;
        config.readiness.require_ready = true;
        assert!(config.validate().is_ok());

        let report = Crawler::new(config)
            .run(&provider, SiteKind::Wayfair, &["https://www.wayfair.com/sofas".to_string()])
            .await
            .unwrap();

        assert!(report.pages[0].ready);
        assert!(report.pages[0].records.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_is_a_navigation_error() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_pages(&dir, &[DETAIL_PAGE]).await;
        let provider = SnapshotProvider::new("https://www.amazon.com/dp/B0LAMP", files);

        let result = Crawler::new(quiet_config())
            .run(&provider, SiteKind::AmazonDetail, &["not a url".to_string()])
            .await;

        assert!(matches!(result, Err(ScrapeError::Navigation { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_and_pacing_between_pages() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_pages(&dir, &[DETAIL_PAGE]).await;
        let provider = SnapshotProvider::new("https://www.amazon.com/dp/B0LAMP", files);

        let mut config = AppConfig::default();
        config.scroll.enabled = true;
        config.scroll.max_iterations = 2;
        config.scroll.settle_delay_ms = 1000;
        config.pacing.wait_ms = 3000;
        config.pacing.delta_ms = 0;

        let started = tokio::time::Instant::now();
        let urls = vec![
            "https://www.amazon.com/dp/B0LAMP".to_string(),
            "https://www.amazon.com/dp/B0LAMP2".to_string(),
        ];
        let report = Crawler::new(config)
            .run(&provider, SiteKind::AmazonDetail, &urls)
            .await
            .unwrap();

        assert_eq!(report.pages.len(), 2);
        // two pages of two 1s scroll pauses plus one 3s pacing pause
        assert!(started.elapsed() >= std::time::Duration::from_secs(7));
    }
}
