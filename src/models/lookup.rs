use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::NOT_FOUND;

static EAN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{8}|\d{12,14})$").expect("Invalid EAN regex")
});

// NewType so barcodes and article numbers can't be mixed up
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Barcode(pub String);

impl Barcode {
    /// Returns `None` for blank input.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Barcode(trimmed.to_string()))
        }
    }

    /// EAN-8, UPC-A, EAN-13 or GTIN-14 digit shape.
    pub fn looks_like_ean(&self) -> bool {
        EAN_REGEX.is_match(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fields read from a rendered product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub barcode: Barcode,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found {
        barcode: Barcode,
        image_url: String,
        image_saved: bool,
    },
    /// The product page rendered but a field was empty.
    NotFound { reason: String },
    /// Every attempt failed.
    Failed { attempts: u32, last_error: String },
}

impl LookupOutcome {
    pub fn barcode(&self) -> Option<&Barcode> {
        match self {
            LookupOutcome::Found { barcode, .. } => Some(barcode),
            _ => None,
        }
    }

    /// Value written into the barcode column.
    pub fn cell_value(&self) -> String {
        match self.barcode() {
            Some(barcode) => barcode.to_string(),
            None => NOT_FOUND.to_string(),
        }
    }
}
