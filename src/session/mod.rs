//! Browser session abstraction.
//!
//! The crawling core only talks to these traits. Two backends implement them:
//! [`snapshot::SnapshotSession`] replays saved HTML documents, and
//! `browser::PlaywrightSession` (feature `browser`) drives a live Chromium.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::ScrapeResult;

pub mod browser;
pub mod snapshot;

pub use snapshot::{SnapshotElement, SnapshotProvider, SnapshotSession};

/// How an element is looked up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    Css(String),
    ClassName(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn class_name(name: impl Into<String>) -> Self {
        Self::ClassName(name.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Strategy name used in log lines
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Css(_) => "css selector",
            Self::ClassName(_) => "class name",
            Self::XPath(_) => "xpath",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Css(value) | Self::ClassName(value) | Self::XPath(value) => value,
        }
    }

    /// CSS form of the locator, if one exists
    pub fn to_css(&self) -> Option<String> {
        match self {
            Self::Css(selector) => Some(selector.clone()),
            Self::ClassName(name) => Some(format!(".{}", name)),
            Self::XPath(_) => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.strategy(), self.value())
    }
}

/// Anything elements can be searched under: a page or another element.
#[async_trait]
pub trait ElementRoot: Send + Sync {
    type Element: PageElement;

    /// All matches in document order. No match is an empty `Vec`, not an error.
    async fn query_all(&self, locator: &Locator) -> ScrapeResult<Vec<Self::Element>>;
}

/// A located element
#[async_trait]
pub trait PageElement: ElementRoot<Element = Self> + Sized + 'static {
    /// Rendered text with whitespace collapsed
    async fn text(&self) -> ScrapeResult<String>;

    /// Attribute value, `None` when the attribute is missing
    async fn attribute(&self, name: &str) -> ScrapeResult<Option<String>>;
}

/// An open, navigable browser page
#[async_trait]
pub trait BrowserSession: ElementRoot + Sized {
    async fn current_url(&self) -> ScrapeResult<String>;

    async fn navigate(&self, url: &str) -> ScrapeResult<()>;

    /// Wait up to `timeout` for `locator` to match. `Ok(false)` on timeout.
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> ScrapeResult<bool>;

    /// Full page reload
    async fn reload(&self) -> ScrapeResult<()>;

    /// Send the End key to the document body
    async fn press_end(&self) -> ScrapeResult<()>;

    /// Release the session
    async fn close(self) -> ScrapeResult<()>;
}

/// Supplies opened sessions
#[async_trait]
pub trait SessionProvider: Send + Sync {
    type Session: BrowserSession;

    async fn open(&self) -> ScrapeResult<Self::Session>;
}
