//! Fetches a search or product page without a browser and reports what the
//! extraction selectors see. Usage: `inspect_product <article-number | product-url>`

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use std::fs;

use ean_scraper::config::Config;
use ean_scraper::parsers::{
    extract_barcode, extract_image_url, extract_product_link, FIELD_GROUP, FIELD_VALUE,
    GALLERY_IMAGE, SEARCH_RESULT_IMAGE,
};
use ean_scraper::utils::http::{create_client, fetch};

#[tokio::main]
async fn main() -> Result<()> {
    let target = std::env::args()
        .nth(1)
        .context("usage: inspect_product <article-number | product-url>")?;

    let config = Config::load()?;
    let client = create_client(&config)?;

    let url = if target.starts_with("http") {
        target.clone()
    } else {
        config.site.search_url(&target)
    };

    println!("Fetching {}...", url);
    let html = fetch(&client, &url).await?.text().await?;
    let sample = "inspect_sample.html";
    fs::write(sample, &html)?;
    println!("Saved raw HTML to {}", sample);

    let document = Html::parse_document(&html);
    for selector_str in [SEARCH_RESULT_IMAGE, FIELD_GROUP, FIELD_VALUE, GALLERY_IMAGE] {
        if let Ok(selector) = Selector::parse(selector_str) {
            let count = document.select(&selector).count();
            println!("Selector '{}' matched {} elements", selector_str, count);
        }
    }

    match extract_product_link(&html) {
        Some(href) => println!("Product link: {}", config.site.product_url(&href)),
        None => println!("Product link: none"),
    }
    match extract_barcode(&html) {
        Some(barcode) => println!("EAN: {}", barcode),
        None => println!("EAN: none"),
    }
    match extract_image_url(&html, &url) {
        Some(image) => println!("Gallery image: {}", image),
        None => println!("Gallery image: none"),
    }

    println!("\nPages rendered client-side may show fewer matches here than in the browser.");
    Ok(())
}
