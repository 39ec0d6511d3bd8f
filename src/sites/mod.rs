//! Page scrapers, one per supported site and page type.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::error::ScrapeResult;
use crate::session::{BrowserSession, Locator};

pub mod amazon_detail;
pub mod amazon_ranking;
pub mod records;
pub mod selectors;
pub mod wayfair;

pub use amazon_detail::AmazonDetailScraper;
pub use amazon_ranking::AmazonRankingScraper;
pub use records::{DetailRecord, RankingRecord, WayfairRecord};
pub use wayfair::WayfairScraper;

/// Turns one loaded page into records.
///
/// `scrape` decides once, from the content-block selector, whether there is
/// anything to read. No blocks is an empty `Vec`; blocks are read in page order.
#[async_trait]
pub trait PageScraper: Send + Sync {
    type Record: Serialize + Send;

    /// Name used in log lines
    fn name(&self) -> &'static str;

    /// Selector the readiness gate waits for before scraping
    fn ready_locator(&self) -> Locator;

    async fn scrape<S: BrowserSession>(&self, session: &S) -> ScrapeResult<Vec<Self::Record>>;
}

/// Supported page types
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SiteKind {
    AmazonRanking,
    AmazonDetail,
    Wayfair,
}

impl SiteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AmazonRanking => "amazon-ranking",
            Self::AmazonDetail => "amazon-detail",
            Self::Wayfair => "wayfair",
        }
    }

    pub fn ready_locator(&self) -> ScrapeResult<Locator> {
        Ok(match self {
            Self::AmazonRanking => AmazonRankingScraper::default().ready_locator(),
            Self::AmazonDetail => AmazonDetailScraper::default().ready_locator(),
            Self::Wayfair => WayfairScraper::new()?.ready_locator(),
        })
    }

    /// Scrape the current page and serialize each record
    pub async fn scrape_json<S: BrowserSession>(&self, session: &S) -> ScrapeResult<Vec<serde_json::Value>> {
        match self {
            Self::AmazonRanking => to_json(AmazonRankingScraper::default().scrape(session).await?),
            Self::AmazonDetail => to_json(AmazonDetailScraper::default().scrape(session).await?),
            Self::Wayfair => to_json(WayfairScraper::new()?.scrape(session).await?),
        }
    }
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn to_json<R: Serialize>(records: Vec<R>) -> ScrapeResult<Vec<serde_json::Value>> {
    records
        .iter()
        .map(|record| serde_json::to_value(record).map_err(Into::into))
        .collect()
}
