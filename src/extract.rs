use std::sync::LazyLock;

use anyhow::{anyhow, Result};
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{Html, Selector};

use crate::rating::Rating;

static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.?\d*").unwrap());

/// Sentinel stored when a detail page carries no meta description.
pub const NO_DESCRIPTION: &str = "No description available";

/// Summary fields of one catalog item as shown on a listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingItem {
    pub title: String,
    pub price: Option<Decimal>,
    pub rating: i32,
    pub relative_url: String,
}

/// Extract every product summary from a listing page.
///
/// Title and href are taken verbatim from the item anchor. A pod missing
/// any expected element or carrying an unknown rating word is an error;
/// a price with no numeric token is not (the price is just absent).
pub fn parse_listing(html: &str) -> Result<Vec<ListingItem>> {
    let doc = Html::parse_document(html);
    let pod_sel = Selector::parse("article.product_pod").unwrap();
    let anchor_sel = Selector::parse("h3 a").unwrap();
    let price_sel = Selector::parse("p.price_color").unwrap();
    let stars_sel = Selector::parse("p.star-rating").unwrap();

    let mut items = Vec::new();
    for pod in doc.select(&pod_sel) {
        let anchor = pod
            .select(&anchor_sel)
            .next()
            .ok_or_else(|| anyhow!("product pod without title anchor"))?;
        let title = anchor
            .value()
            .attr("title")
            .ok_or_else(|| anyhow!("title anchor without title attribute"))?
            .to_string();
        let relative_url = anchor
            .value()
            .attr("href")
            .ok_or_else(|| anyhow!("title anchor without href"))?
            .to_string();

        let price_text: String = pod
            .select(&price_sel)
            .next()
            .ok_or_else(|| anyhow!("product pod without price element"))?
            .text()
            .collect();
        let price = extract_decimal(&price_text);

        let stars = pod
            .select(&stars_sel)
            .next()
            .ok_or_else(|| anyhow!("product pod without star-rating element"))?;
        // Rating word rides as the second class token: "star-rating Three"
        let word = stars
            .value()
            .attr("class")
            .unwrap_or_default()
            .split_whitespace()
            .nth(1)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("star-rating element without rating class"))?;
        let rating = Rating::from_word(&word)
            .ok_or_else(|| anyhow!("unknown rating word: {}", word))?
            .as_int();

        items.push(ListingItem {
            title,
            price,
            rating,
            relative_url,
        });
    }
    Ok(items)
}

/// Pull the meta description off a detail page, trimmed. A missing tag
/// (or missing content attribute) yields the sentinel, never an error.
pub fn parse_description(html: &str) -> String {
    let doc = Html::parse_document(html);
    let meta_sel = Selector::parse(r#"meta[name="description"]"#).unwrap();
    doc.select(&meta_sel)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_else(|| NO_DESCRIPTION.to_string())
}

/// First numeric token of a currency-formatted string, if any.
pub fn extract_decimal(text: &str) -> Option<Decimal> {
    PRICE_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<Decimal>().ok())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
    }

    #[test]
    fn listing_page_items() {
        let html = fixture("listing.html");
        let items = parse_listing(&html).unwrap();
        assert_eq!(items.len(), 4);

        assert_eq!(items[0].title, "A Light in the Attic");
        assert_eq!(items[0].price, Some("51.77".parse().unwrap()));
        assert_eq!(items[0].rating, 3);
        assert_eq!(items[0].relative_url, "a-light-in-the-attic_1000/index.html");

        assert_eq!(items[1].title, "Tipping the Velvet");
        assert_eq!(items[1].rating, 1);

        assert_eq!(items[2].title, "Sharp Objects");
        assert_eq!(items[2].rating, 4);
        assert_eq!(items[2].price, Some("47.82".parse().unwrap()));

        assert_eq!(items[3].title, "Sapiens: A Brief History of Humankind");
        assert_eq!(items[3].rating, 5);
    }

    #[test]
    fn unknown_rating_word_is_an_error() {
        let html = r#"
            <article class="product_pod">
                <p class="star-rating Six"></p>
                <h3><a href="x/index.html" title="Bad Book">Bad Book</a></h3>
                <div class="product_price"><p class="price_color">£10.00</p></div>
            </article>
        "#;
        let err = parse_listing(html).unwrap_err();
        assert!(err.to_string().contains("unknown rating word"));
    }

    #[test]
    fn price_without_digits_is_absent() {
        let html = r#"
            <article class="product_pod">
                <p class="star-rating Two"></p>
                <h3><a href="x/index.html" title="Free Book">Free Book</a></h3>
                <div class="product_price"><p class="price_color">FREE</p></div>
            </article>
        "#;
        let items = parse_listing(html).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, None);
        assert_eq!(items[0].rating, 2);
    }

    #[test]
    fn description_trimmed_from_meta() {
        let html = fixture("detail.html");
        let description = parse_description(&html);
        assert!(description.starts_with("It's hard to imagine"));
        assert!(description.ends_with("special edition."));
        assert_eq!(description, description.trim());
    }

    #[test]
    fn missing_meta_yields_sentinel() {
        let html = fixture("detail_no_meta.html");
        assert_eq!(parse_description(&html), "No description available");
    }

    #[test]
    fn decimal_extraction() {
        assert_eq!(extract_decimal("£51.77"), Some("51.77".parse().unwrap()));
        assert_eq!(extract_decimal("£23"), Some("23".parse().unwrap()));
        assert_eq!(extract_decimal("no digits"), None);
        assert_eq!(extract_decimal(""), None);
    }
}
