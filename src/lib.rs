//! product-crawl - product record extraction from rendered e-commerce pages
//!
//! This library provides:
//! - A session abstraction over a live browser or saved HTML snapshots
//! - Page readiness, scrolling and tolerant field extraction
//! - Page scrapers for Amazon ranking, Amazon detail and Wayfair listing pages
//! - Crawl runs that tie the above together for a list of URLs

pub mod config;
pub mod core;
pub mod crawl;
pub mod error;
pub mod logging;
pub mod session;
pub mod sites;

// Re-export main types for convenience
pub use crate::config::AppConfig;
pub use crate::core::{CrawlReport, Crawler, PageResult};
pub use crate::crawl::Field;
pub use crate::error::{ScrapeError, ScrapeResult};
pub use crate::sites::{PageScraper, SiteKind};
