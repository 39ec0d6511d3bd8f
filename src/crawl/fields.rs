//! Tolerant field extraction.
//!
//! A missing element is an ordinary outcome here: every extraction yields a
//! [`Field`], and only session or selector failures come back as errors.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::locator::find;
use crate::error::{instrumented, ErrorContext, ScrapeResult};
use crate::session::{ElementRoot, Locator, PageElement};

/// An extracted value, or the fact that nothing was there
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field<T> {
    Present(T),
    Absent,
}

impl<T> Field<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }

    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Self::Present(value) => Field::Present(value),
            Self::Absent => Field::Absent,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Field<U> {
        match self {
            Self::Present(value) => Field::Present(f(value)),
            Self::Absent => Field::Absent,
        }
    }

    pub fn unwrap_or(self, sentinel: T) -> T {
        match self {
            Self::Present(value) => value,
            Self::Absent => sentinel,
        }
    }
}

impl<T: Default> Field<T> {
    pub fn unwrap_or_default(self) -> T {
        self.unwrap_or(T::default())
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Present(value),
            None => Self::Absent,
        }
    }
}

impl<T> From<Field<T>> for Option<T> {
    fn from(field: Field<T>) -> Self {
        field.into_option()
    }
}

/// What to read from a located element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Read {
    Text,
    Attribute(&'static str),
}

/// Where one logical field lives inside a content block
#[derive(Debug, Clone)]
pub struct FieldSelector {
    pub name: &'static str,
    pub primary: Locator,
    pub fallback: Option<Locator>,
    pub read: Read,
}

impl FieldSelector {
    pub fn text(name: &'static str, primary: Locator) -> Self {
        Self {
            name,
            primary,
            fallback: None,
            read: Read::Text,
        }
    }

    pub fn attribute(name: &'static str, primary: Locator, attribute: &'static str) -> Self {
        Self {
            name,
            primary,
            fallback: None,
            read: Read::Attribute(attribute),
        }
    }

    pub fn with_fallback(mut self, fallback: Locator) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Extract this field under `root`
    pub async fn extract<R: ElementRoot>(&self, root: &R) -> ScrapeResult<Field<String>> {
        match self.read {
            Read::Text => extract_text(root, &self.primary, self.fallback.as_ref()).await,
            Read::Attribute(attribute) => {
                let field = extract_attribute(root, &self.primary, attribute).await?;
                match (field, &self.fallback) {
                    (Field::Absent, Some(fallback)) => extract_attribute(root, fallback, attribute).await,
                    (field, _) => Ok(field),
                }
            }
        }
    }
}

/// Text of the first `primary` match, else of the first `fallback` match.
pub async fn extract_text<R: ElementRoot>(
    root: &R,
    primary: &Locator,
    fallback: Option<&Locator>,
) -> ScrapeResult<Field<String>> {
    let context = ErrorContext::new("extract_text", "fields").with_data("locator", primary.to_string());
    instrumented(context, async {
        let mut element = find(root, primary).await?;
        if element.is_none() {
            if let Some(fallback) = fallback {
                element = find(root, fallback).await?;
            }
        }

        match element {
            Some(element) => Ok(Field::Present(element.text().await?)),
            None => Ok(Field::Absent),
        }
    })
    .await
}

/// Named attribute of the first `locator` match.
pub async fn extract_attribute<R: ElementRoot>(
    root: &R,
    locator: &Locator,
    attribute: &str,
) -> ScrapeResult<Field<String>> {
    let context = ErrorContext::new("extract_attribute", "fields")
        .with_data("locator", locator.to_string())
        .with_data("attribute", attribute);
    instrumented(context, async {
        match find(root, locator).await? {
            Some(element) => Ok(element.attribute(attribute).await?.into()),
            None => Ok(Field::Absent),
        }
    })
    .await
}

/// `"{whole}.{fraction}"`, with absent parts left empty.
///
/// The result is not validated: `(Absent, "99")` gives `".99"` and two absent
/// parts give `"."`.
pub fn compose_price(whole: Field<String>, fraction: Field<String>) -> String {
    format!(
        "{}.{}",
        whole.unwrap_or_default(),
        fraction.unwrap_or_default()
    )
}

/// First capture group of `pattern` over the rating text; `""` when there is
/// no text or no match.
pub fn rating_digits(raw: Field<String>, pattern: &Regex) -> String {
    let raw = raw.unwrap_or_default();
    pattern
        .captures(&raw)
        .and_then(|captures| captures.get(1))
        .map(|digits| digits.as_str().to_string())
        .unwrap_or_default()
}

/// Presence check: any non-empty text counts as flagged.
pub fn sponsored_flag(badge: Field<String>) -> bool {
    matches!(badge, Field::Present(text) if !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SnapshotSession;

    const CARD: &str = r#"
        <div class="card">
          <span class="_cDEzb_p13n-sc-price_3mJ9Z">$12.49</span>
          <a class="link" href="/dp/B01">Item</a>
          <img class="pic">
        </div>
    "#;

    fn session() -> SnapshotSession {
        SnapshotSession::from_html("https://www.amazon.com/bestsellers", CARD)
    }

    #[tokio::test]
    async fn test_fallback_used_when_primary_missing() {
        let price = extract_text(
            &session(),
            &Locator::class_name("p13n-sc-price"),
            Some(&Locator::class_name("_cDEzb_p13n-sc-price_3mJ9Z")),
        )
        .await
        .unwrap();

        assert_eq!(price, Field::Present("$12.49".to_string()));
    }

    #[tokio::test]
    async fn test_absent_when_primary_and_fallback_missing() {
        let price = extract_text(
            &session(),
            &Locator::class_name("p13n-sc-price"),
            Some(&Locator::class_name("a-price")),
        )
        .await
        .unwrap();

        assert_eq!(price, Field::Absent);
    }

    #[tokio::test]
    async fn test_attribute_extraction() {
        let href = extract_attribute(&session(), &Locator::css("a.link"), "href").await.unwrap();
        assert_eq!(href, Field::Present("/dp/B01".to_string()));

        let missing_attr = extract_attribute(&session(), &Locator::css("img.pic"), "src").await.unwrap();
        assert_eq!(missing_attr, Field::Absent);

        let missing_element = extract_attribute(&session(), &Locator::css("img.hero"), "src").await.unwrap();
        assert_eq!(missing_element, Field::Absent);
    }

    #[tokio::test]
    async fn test_field_selector_reads_through_fallback() {
        let selector = FieldSelector::text("price", Locator::class_name("p13n-sc-price"))
            .with_fallback(Locator::class_name("_cDEzb_p13n-sc-price_3mJ9Z"));
        assert_eq!(
            selector.extract(&session()).await.unwrap(),
            Field::Present("$12.49".to_string())
        );

        let selector = FieldSelector::attribute("url", Locator::css("a.missing"), "href")
            .with_fallback(Locator::css("a.link"));
        assert_eq!(
            selector.extract(&session()).await.unwrap(),
            Field::Present("/dp/B01".to_string())
        );
    }

    #[test]
    fn test_price_composition() {
        let present = |s: &str| Field::Present(s.to_string());
        assert_eq!(compose_price(present("19"), present("99")), "19.99");
        assert_eq!(compose_price(Field::Absent, present("99")), ".99");
        assert_eq!(compose_price(present("19"), Field::Absent), "19.");
        assert_eq!(compose_price(Field::Absent, Field::Absent), ".");
    }

    #[test]
    fn test_rating_digits() {
        let pattern = Regex::new(r"\.(\d+)").unwrap();
        assert_eq!(
            rating_digits(Field::Present("4.5 out of 5 stars".to_string()), &pattern),
            "5"
        );
        assert_eq!(rating_digits(Field::Present("4 out of 5".to_string()), &pattern), "");
        assert_eq!(rating_digits(Field::Absent, &pattern), "");
    }

    #[test]
    fn test_sponsored_flag_is_presence_check() {
        assert!(sponsored_flag(Field::Present("Sponsored".to_string())));
        assert!(!sponsored_flag(Field::Present(String::new())));
        assert!(!sponsored_flag(Field::Absent));
    }

    #[test]
    fn test_field_option_conversions() {
        let field: Field<u8> = Some(3).into();
        assert!(field.is_present());
        assert_eq!(field.as_ref().map(|v| *v + 1).into_option(), Some(4));
        assert_eq!(Option::<u8>::from(Field::Absent), None);
    }
}
