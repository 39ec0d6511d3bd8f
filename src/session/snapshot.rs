use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use super::{BrowserSession, ElementRoot, Locator, PageElement, SessionProvider};
use crate::error::{ScrapeError, ScrapeResult};

/// Offline session over saved HTML documents.
///
/// Snapshot `n` is what the page looks like after `n` reloads; reloading past
/// the last snapshot stays on it. Waiting never sleeps because a saved document
/// cannot change while being watched.
pub struct SnapshotSession {
    snapshots: Vec<String>,
    cursor: AtomicUsize,
    url: Mutex<String>,
    reloads: AtomicUsize,
    end_presses: AtomicUsize,
}

/// Element captured from a snapshot
#[derive(Debug, Clone)]
pub struct SnapshotElement {
    html: String,
    text: String,
    attributes: Vec<(String, String)>,
}

impl SnapshotSession {
    pub fn new(url: impl Into<String>, snapshots: Vec<String>) -> Self {
        Self {
            snapshots,
            cursor: AtomicUsize::new(0),
            url: Mutex::new(url.into()),
            reloads: AtomicUsize::new(0),
            end_presses: AtomicUsize::new(0),
        }
    }

    /// Single unchanging document
    pub fn from_html(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self::new(url, vec![html.into()])
    }

    /// Load one snapshot per file, in order
    pub async fn from_files<P: AsRef<Path>>(url: impl Into<String>, paths: &[P]) -> ScrapeResult<Self> {
        let mut snapshots = Vec::with_capacity(paths.len());
        for path in paths {
            snapshots.push(tokio::fs::read_to_string(path.as_ref()).await?);
        }
        Ok(Self::new(url, snapshots))
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    pub fn end_press_count(&self) -> usize {
        self.end_presses.load(Ordering::SeqCst)
    }

    fn current_snapshot(&self) -> &str {
        let index = self.cursor.load(Ordering::SeqCst);
        self.snapshots
            .get(index)
            .or_else(|| self.snapshots.last())
            .map(String::as_str)
            .unwrap_or("")
    }

    fn select_document(&self, locator: &Locator) -> ScrapeResult<Vec<SnapshotElement>> {
        let selector = parse_locator(locator)?;
        let document = Html::parse_document(self.current_snapshot());
        Ok(document.select(&selector).map(SnapshotElement::capture).collect())
    }
}

impl SnapshotElement {
    fn capture(element: ElementRef<'_>) -> Self {
        let text = element.text().collect::<String>();
        Self {
            html: element.html(),
            text: normalize_whitespace(&text),
            attributes: element
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    /// Outer HTML of the element
    pub fn html(&self) -> &str {
        &self.html
    }
}

fn parse_locator(locator: &Locator) -> ScrapeResult<Selector> {
    let css = locator.to_css().ok_or_else(|| ScrapeError::UnsupportedLocator {
        locator: locator.to_string(),
    })?;
    Selector::parse(&css).map_err(|e| ScrapeError::invalid_selector(css.clone(), e.to_string()))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl ElementRoot for SnapshotSession {
    type Element = SnapshotElement;

    async fn query_all(&self, locator: &Locator) -> ScrapeResult<Vec<SnapshotElement>> {
        self.select_document(locator)
    }
}

#[async_trait]
impl ElementRoot for SnapshotElement {
    type Element = SnapshotElement;

    async fn query_all(&self, locator: &Locator) -> ScrapeResult<Vec<SnapshotElement>> {
        let selector = parse_locator(locator)?;
        let fragment = Html::parse_fragment(&self.html);
        let scope = fragment
            .root_element()
            .children()
            .find_map(ElementRef::wrap);

        Ok(match scope {
            Some(scope) => scope.select(&selector).map(SnapshotElement::capture).collect(),
            None => Vec::new(),
        })
    }
}

#[async_trait]
impl PageElement for SnapshotElement {
    async fn text(&self) -> ScrapeResult<String> {
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> ScrapeResult<Option<String>> {
        Ok(self
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone()))
    }
}

#[async_trait]
impl BrowserSession for SnapshotSession {
    async fn current_url(&self) -> ScrapeResult<String> {
        self.url
            .lock()
            .map(|url| url.clone())
            .map_err(|_| ScrapeError::internal("snapshot url lock poisoned"))
    }

    async fn navigate(&self, url: &str) -> ScrapeResult<()> {
        let mut current = self
            .url
            .lock()
            .map_err(|_| ScrapeError::internal("snapshot url lock poisoned"))?;
        *current = url.to_string();
        self.cursor.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn wait_for(&self, locator: &Locator, _timeout: Duration) -> ScrapeResult<bool> {
        Ok(!self.select_document(locator)?.is_empty())
    }

    async fn reload(&self) -> ScrapeResult<()> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        let last = self.snapshots.len().saturating_sub(1);
        let next = (self.cursor.load(Ordering::SeqCst) + 1).min(last);
        self.cursor.store(next, Ordering::SeqCst);
        debug!("Snapshot session reloaded to snapshot {}", next);
        Ok(())
    }

    async fn press_end(&self) -> ScrapeResult<()> {
        self.end_presses.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(self) -> ScrapeResult<()> {
        debug!("Snapshot session closed after {} reloads", self.reload_count());
        Ok(())
    }
}

/// Opens snapshot sessions over a fixed list of files
#[derive(Debug, Clone)]
pub struct SnapshotProvider {
    url: String,
    files: Vec<PathBuf>,
}

impl SnapshotProvider {
    pub fn new(url: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            url: url.into(),
            files,
        }
    }
}

#[async_trait]
impl SessionProvider for SnapshotProvider {
    type Session = SnapshotSession;

    async fn open(&self) -> ScrapeResult<SnapshotSession> {
        if self.files.is_empty() {
            return Err(ScrapeError::config("no snapshot files given"));
        }
        SnapshotSession::from_files(self.url.clone(), &self.files).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="card" data-id="1"><a href="/p/1">First   item</a></div>
          <div class="card" data-id="2"><a href="/p/2">Second item</a></div>
        </body></html>
    "#;

    #[tokio::test]
    async fn test_query_all_and_nested_queries() {
        let session = SnapshotSession::from_html("https://example.com", PAGE);
        let cards = session.query_all(&Locator::class_name("card")).await.unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].attribute("data-id").await.unwrap(), Some("2".to_string()));

        let links = cards[0].query_all(&Locator::css("a")).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].text().await.unwrap(), "First item");
        assert_eq!(links[0].attribute("href").await.unwrap(), Some("/p/1".to_string()));
        assert_eq!(links[0].attribute("title").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_nested_query_excludes_scope_element() {
        let session = SnapshotSession::from_html("https://example.com", PAGE);
        let cards = session.query_all(&Locator::css("div.card")).await.unwrap();
        let inner = cards[0].query_all(&Locator::css("div.card")).await.unwrap();
        assert!(inner.is_empty());
    }

    #[tokio::test]
    async fn test_reload_advances_and_stops_at_last_snapshot() {
        let session = SnapshotSession::new(
            "https://example.com",
            vec!["<p>loading</p>".into(), "<div id=\"ready\"></div>".into()],
        );
        let ready = Locator::css("#ready");

        assert!(!session.wait_for(&ready, Duration::from_secs(5)).await.unwrap());
        session.reload().await.unwrap();
        session.reload().await.unwrap();
        assert!(session.wait_for(&ready, Duration::from_secs(5)).await.unwrap());
        assert_eq!(session.reload_count(), 2);
    }

    #[tokio::test]
    async fn test_xpath_is_unsupported() {
        let session = SnapshotSession::from_html("https://example.com", PAGE);
        let result = session.query_all(&Locator::xpath("//div")).await;
        assert!(matches!(result, Err(ScrapeError::UnsupportedLocator { .. })));
    }

    #[tokio::test]
    async fn test_invalid_css_is_an_error() {
        let session = SnapshotSession::from_html("https://example.com", PAGE);
        let result = session.query_all(&Locator::css("div[")).await;
        assert!(matches!(result, Err(ScrapeError::InvalidSelector { .. })));
    }

    #[tokio::test]
    async fn test_provider_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        tokio::fs::write(&path, PAGE).await.unwrap();

        let provider = SnapshotProvider::new("https://example.com/list", vec![path]);
        let session = provider.open().await.unwrap();
        assert_eq!(session.current_url().await.unwrap(), "https://example.com/list");
        assert_eq!(session.query_all(&Locator::css("a")).await.unwrap().len(), 2);
    }
}
