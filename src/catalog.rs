use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::db::BookRow;
use crate::extract;

const LISTING_BASE: &str = "http://books.toscrape.com/catalogue";
const DETAIL_BASE: &str = "https://books.toscrape.com/catalogue/";

/// Walk listing pages 1..=pages in order, pulling every item's summary
/// fields plus its detail-page description. The whole catalog accumulates
/// in memory; nothing persists until the caller hands the batch to the
/// store. Any fetch failure, HTTP error status, or parse failure aborts
/// the walk with no partial save.
pub async fn scrape_catalog(pages: u32) -> Result<Vec<BookRow>> {
    let client = reqwest::Client::new();

    let pb = ProgressBar::new(pages as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut books = Vec::new();
    for page in 1..=pages {
        let url = format!("{}/page-{}.html", LISTING_BASE, page);
        let listing_html = fetch(&client, &url).await?;
        let items = extract::parse_listing(&listing_html)
            .with_context(|| format!("Failed to parse listing page {}", page))?;
        debug!("page {}: {} items", page, items.len());

        for item in items {
            let detail_url = format!("{}{}", DETAIL_BASE, item.relative_url);
            let detail_html = fetch(&client, &detail_url).await?;
            let description = extract::parse_description(&detail_html);
            books.push(BookRow {
                title: item.title,
                description,
                rating: item.rating,
                price: item.price,
            });
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    info!("Walked {} pages, {} books collected", pages, books.len());

    Ok(books)
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<String> {
    client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?
        .error_for_status()
        .with_context(|| format!("Error status from {}", url))?
        .text()
        .await
        .with_context(|| format!("Failed to read body of {}", url))
}
