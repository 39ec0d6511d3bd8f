//! The crawling core: element lookup, page readiness, scrolling and
//! tolerant field extraction.

pub mod fields;
pub mod locator;
pub mod pacing;
pub mod readiness;
pub mod scroll;

pub use fields::{
    compose_price, extract_attribute, extract_text, rating_digits, sponsored_flag, Field,
    FieldSelector, Read,
};
pub use locator::{find, find_all};
pub use pacing::random_wait;
pub use readiness::{wait_until_ready, ReadinessOutcome};
pub use scroll::scroll_to_bottom;
