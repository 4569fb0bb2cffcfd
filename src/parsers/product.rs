use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::clean_text;
use crate::error::{Result, ScrapeError};
use crate::models::{Barcode, ProductFields};

pub const SEARCH_RESULT_IMAGE: &str = ".msmcd-img";
pub const FIELD_GROUP: &str = ".form-group";
pub const FIELD_VALUE: &str = ".form-control-static";
pub const GALLERY_IMAGE: &str = ".fotorama__img";
pub const EAN_MARKER: &str = "EAN:";

fn selector(css: &str) -> Selector {
    // Only called with the constants above
    Selector::parse(css).expect("Invalid built-in selector")
}

/// `href` of the link wrapping the first search result image.
pub fn extract_product_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let image = document.select(&selector(SEARCH_RESULT_IMAGE)).next()?;

    image
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "a")
        .and_then(|link| link.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

/// Value next to the first field group labelled `EAN:`.
pub fn extract_barcode(html: &str) -> Option<Barcode> {
    let document = Html::parse_document(html);
    let value_selector = selector(FIELD_VALUE);

    let group = document
        .select(&selector(FIELD_GROUP))
        .find(|group| group.text().collect::<String>().contains(EAN_MARKER))?;

    let value = group.select(&value_selector).next()?;
    Barcode::parse(&clean_text(&value.text().collect::<String>()))
}

/// Gallery image `src`, resolved against the page it was found on.
pub fn extract_image_url(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let src = document
        .select(&selector(GALLERY_IMAGE))
        .next()?
        .value()
        .attr("src")?
        .trim();

    if src.is_empty() {
        return None;
    }

    match Url::parse(page_url).and_then(|base| base.join(src)) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(_) => Some(src.to_string()),
    }
}

/// Both fields or `ExtractionEmpty` naming the first one missing.
pub fn extract_product(html: &str, page_url: &str) -> Result<ProductFields> {
    let barcode = extract_barcode(html).ok_or_else(|| ScrapeError::ExtractionEmpty {
        url: page_url.to_string(),
        field: "EAN",
    })?;

    let image_url =
        extract_image_url(html, page_url).ok_or_else(|| ScrapeError::ExtractionEmpty {
            url: page_url.to_string(),
            field: "gallery image",
        })?;

    Ok(ProductFields { barcode, image_url })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SEARCH_PAGE: &str = r#"
        <html><body>
          <div class="listing">
            <a href="/de/produkte/tee-67890">
              <div class="frame"><img class="msmcd-img" src="/thumb.jpg"></div>
            </a>
            <a href="/de/produkte/other"><img class="msmcd-img" src="/other.jpg"></a>
          </div>
        </body></html>"#;

    const PRODUCT_PAGE: &str = r#"
        <html><body>
          <div class="fotorama">
            <img class="fotorama__img" src="/media/catalog/tee.jpg">
          </div>
          <div class="form-group">
            <label>Artikelnummer:</label>
            <p class="form-control-static">67890</p>
          </div>
          <div class="form-group">
            <label>EAN:</label>
            <p class="form-control-static">
              4006381333931
            </p>
          </div>
        </body></html>"#;

    #[test]
    fn product_link_comes_from_the_enclosing_anchor() {
        assert_eq!(
            extract_product_link(SEARCH_PAGE),
            Some("/de/produkte/tee-67890".to_string())
        );
    }

    #[test]
    fn product_link_missing_without_results() {
        assert_eq!(extract_product_link("<html><body><p>Keine Treffer</p></body></html>"), None);
        assert_eq!(
            extract_product_link(r#"<div><img class="msmcd-img" src="/x.jpg"></div>"#),
            None
        );
    }

    #[test]
    fn barcode_is_read_from_the_ean_group_only() {
        assert_eq!(
            extract_barcode(PRODUCT_PAGE),
            Some(Barcode("4006381333931".to_string()))
        );
    }

    #[test]
    fn blank_ean_value_is_not_a_barcode() {
        let html = r#"<div class="form-group">EAN: <span class="form-control-static"> </span></div>"#;
        assert_eq!(extract_barcode(html), None);
    }

    #[test]
    fn image_url_is_made_absolute() {
        assert_eq!(
            extract_image_url(PRODUCT_PAGE, "https://www.dovgan.de/de/produkte/tee-67890"),
            Some("https://www.dovgan.de/media/catalog/tee.jpg".to_string())
        );

        let cdn = r#"<img class="fotorama__img" src="https://cdn.dovgan.de/tee.jpg">"#;
        assert_eq!(
            extract_image_url(cdn, "https://www.dovgan.de/p"),
            Some("https://cdn.dovgan.de/tee.jpg".to_string())
        );
    }

    #[test]
    fn extract_product_reports_the_missing_field() {
        let fields = extract_product(PRODUCT_PAGE, "https://www.dovgan.de/p").unwrap();
        assert_eq!(fields.barcode.as_str(), "4006381333931");

        let no_image = r#"<div class="form-group">EAN: <p class="form-control-static">4006381333931</p></div>"#;
        match extract_product(no_image, "https://www.dovgan.de/p") {
            Err(ScrapeError::ExtractionEmpty { field, .. }) => assert_eq!(field, "gallery image"),
            other => panic!("unexpected result: {:?}", other),
        }

        match extract_product("<html></html>", "https://www.dovgan.de/p") {
            Err(ScrapeError::ExtractionEmpty { field, .. }) => assert_eq!(field, "EAN"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
