//! Output records and their assemblers.
//!
//! Assembly is pure: each `*Fields` struct carries what the extractor found
//! and the record decides how absence is represented.

use serde::{Deserialize, Serialize};

use crate::crawl::fields::{compose_price, rating_digits, sponsored_flag, Field};

/// One entry of an Amazon best-seller ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRecord {
    pub rank: Option<String>,
    pub name: Option<String>,
    pub price: Option<String>,
    pub url: Option<String>,
}

/// Amazon product detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub title: Option<String>,
    /// `"{whole}.{fraction}"`, possibly degenerate such as `"."`
    pub new_price: String,
    pub list_price: Option<String>,
    pub rating: Option<String>,
    pub rating_count: Option<String>,
    pub image_url: Option<String>,
}

/// One Wayfair listing card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WayfairRecord {
    pub title: Option<String>,
    pub brand: Option<String>,
    pub new_price: Option<String>,
    pub list_price: Option<String>,
    /// Empty when no rating was found
    pub rating: String,
    pub rating_count: Option<String>,
    pub shipping_fee: Option<String>,
    pub sponsored: bool,
}

#[derive(Debug, Clone)]
pub struct RankingFields {
    pub rank: Field<String>,
    pub name: Field<String>,
    pub price: Field<String>,
    pub url: Field<String>,
}

#[derive(Debug, Clone)]
pub struct DetailFields {
    pub title: Field<String>,
    pub price_whole: Field<String>,
    pub price_fraction: Field<String>,
    pub list_price: Field<String>,
    pub rating: Field<String>,
    pub rating_count: Field<String>,
    pub image_url: Field<String>,
}

#[derive(Debug, Clone)]
pub struct WayfairFields {
    pub title: Field<String>,
    pub brand: Field<String>,
    pub new_price: Field<String>,
    pub list_price: Field<String>,
    pub rating: Field<String>,
    pub rating_count: Field<String>,
    pub shipping_fee: Field<String>,
    pub sponsored: Field<String>,
}

impl RankingRecord {
    pub fn assemble(fields: RankingFields) -> Self {
        Self {
            rank: fields.rank.into_option(),
            name: fields.name.into_option(),
            price: fields.price.into_option(),
            url: fields.url.into_option(),
        }
    }
}

impl DetailRecord {
    pub fn assemble(fields: DetailFields) -> Self {
        Self {
            title: fields.title.into_option(),
            new_price: compose_price(fields.price_whole, fields.price_fraction),
            list_price: fields.list_price.into_option(),
            rating: fields.rating.into_option(),
            rating_count: fields.rating_count.into_option(),
            image_url: fields.image_url.into_option(),
        }
    }
}

impl WayfairRecord {
    pub fn assemble(fields: WayfairFields, rating_pattern: &regex::Regex) -> Self {
        Self {
            title: fields.title.into_option(),
            brand: fields.brand.into_option(),
            new_price: fields.new_price.into_option(),
            list_price: fields.list_price.into_option(),
            rating: rating_digits(fields.rating, rating_pattern),
            rating_count: fields.rating_count.into_option(),
            shipping_fee: fields.shipping_fee.into_option(),
            sponsored: sponsored_flag(fields.sponsored),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present(value: &str) -> Field<String> {
        Field::Present(value.to_string())
    }

    #[test]
    fn test_detail_record_with_missing_whole_price() {
        let record = DetailRecord::assemble(DetailFields {
            title: present("Kettle"),
            price_whole: Field::Absent,
            price_fraction: present("99"),
            list_price: Field::Absent,
            rating: present("4.6 out of 5 stars"),
            rating_count: Field::Absent,
            image_url: Field::Absent,
        });

        assert_eq!(record.title.as_deref(), Some("Kettle"));
        assert_eq!(record.new_price, ".99");
        assert_eq!(record.list_price, None);
    }

    #[test]
    fn test_wayfair_record_serializes_absent_as_null() {
        let pattern = regex::Regex::new(r"\.(\d+)").unwrap();
        let record = WayfairRecord::assemble(
            WayfairFields {
                title: present("Sofa"),
                brand: Field::Absent,
                new_price: present("$499.99"),
                list_price: Field::Absent,
                rating: Field::Absent,
                rating_count: Field::Absent,
                shipping_fee: present("Free Shipping"),
                sponsored: Field::Absent,
            },
            &pattern,
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["brand"], serde_json::Value::Null);
        assert_eq!(json["rating"], "");
        assert_eq!(json["sponsored"], false);
        assert_eq!(json["shipping_fee"], "Free Shipping");
    }
}
