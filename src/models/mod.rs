pub mod lookup;
pub mod row;

pub use lookup::*;
pub use row::*;

// Column names and sentinel of the product sheet
pub const ARTICLE_COLUMN: &str = "Art.-NR";
pub const BARCODE_COLUMN: &str = "Stregkode";
pub const NOT_FOUND: &str = "Ikke fundet";
