//! Selectors for the supported page layouts.
//!
//! These track the live markup of each site. When a scraper starts returning
//! empty results, save a copy of the page, fix the selector here and check it
//! with `crawl replay`.

/// Amazon best-seller ranking page
pub mod amazon_ranking {
    /// One ranked product card
    pub const CONTENT: &str = "div.a-column.a-span12.a-text-center._cDEzb_grid-column_2hIsc";
    /// Badge class holding "#1", "#2", ...
    pub const RANK_CLASS: &str = "zg-bdg-text";
    pub const NAME: &str = "div > div:nth-of-type(2) > div > a:nth-of-type(2) > span > div";
    pub const LINK: &str = "div > div:nth-of-type(2) > div > a:nth-of-type(2)";
    pub const PRICE_CLASS: &str = "p13n-sc-price";
    pub const PRICE_FALLBACK_CLASS: &str = "_cDEzb_p13n-sc-price_3mJ9Z";
}

/// Amazon product detail page
pub mod amazon_detail {
    pub const LEFT_COLUMN: &str = "div#leftCol";
    pub const CENTER_COLUMN: &str = "div#centerCol";
    pub const TITLE: &str = "span.a-size-large.product-title-word-break";
    pub const RATING: &str = "span.a-icon-alt";
    pub const RATING_COUNT: &str = "span.a-size-base";
    pub const LIST_PRICE: &str = "span.a-offscreen";
    pub const PRICE_WHOLE: &str = "span.a-price-whole";
    pub const PRICE_FRACTION: &str = "span.a-price-fraction";
    pub const IMAGE: &str = "div.imgTagWrapper > img";
}

/// Wayfair category listing page
pub mod wayfair {
    /// One product card link
    pub const CONTENT: &str = "div.TrackedProductCardWrapper-inView > div > a";
    pub const TITLE: &str = "h2.kb51y90_6101.kb51y91_6101";
    pub const BRAND: &str = "p._1vgix4w0_6101._1vgix4w2_6101._1vgix4w6_6101";
    pub const RATING: &str = "p.vdvxm0_6101";
    pub const RATING_COUNT: &str = "div._1xxktfua_6101.undefined";
    pub const LIST_PRICE: &str = "s.oakhm627_6101.oakhm6y5_6101.oakhm610g_6101.oakhm6aj_6101";
    pub const SHIPPING_FEE: &str =
        "div > p.oakhm65j_6101.oakhm610g_6101.oakhm6b3_6101.nhya890_6101.nhya891_6101";
    pub const SHIPPING_FEE_FALLBACK: &str = "span.ShippingBadge-text";
    pub const NEW_PRICE: &str = "span.oakhm627_6101.oakhm6y5_6101.oakhm610g_6101.oakhm6aj_6101";
    pub const SPONSORED: &str = "div.FeaturedProductFlag";
    /// Digits after the decimal point of "4.5 out of 5 stars"
    pub const RATING_PATTERN: &str = r"\.(\d+)";
}
