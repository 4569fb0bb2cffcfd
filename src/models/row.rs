use super::{ARTICLE_COLUMN, BARCODE_COLUMN};

/// One spreadsheet row as `(column, value)` cells in column order. Sheets may
/// repeat a header name (blank headers often do), so cells are positional and
/// name lookups return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Replaces the first cell named `column`, or appends a new one.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column, value)),
        }
    }

    /// Appends a cell even if the column name is already present.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.push((column.into(), value.into()));
    }

    /// Value for `column` at `position`, falling back to a lookup by name.
    pub fn value_at(&self, position: usize, column: &str) -> &str {
        match self.cells.get(position) {
            Some((name, value)) if name == column => value.as_str(),
            _ => self.get(column).unwrap_or(""),
        }
    }

    /// The trimmed article number, if the row has a non-empty one.
    pub fn article_number(&self) -> Option<&str> {
        self.get(ARTICLE_COLUMN)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn barcode(&self) -> Option<&str> {
        self.get(BARCODE_COLUMN)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}

/// Header order plus rows in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    /// Source headers followed by the barcode column, which is never repeated.
    pub fn output_headers(&self) -> Vec<String> {
        let mut headers = self.headers.clone();
        if !headers.iter().any(|header| header == BARCODE_COLUMN) {
            headers.push(BARCODE_COLUMN.to_string());
        }
        headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn article_number_ignores_blank_values() {
        let row: Row = [(ARTICLE_COLUMN, "  ")].into_iter().collect();
        assert_eq!(row.article_number(), None);

        let row: Row = [(ARTICLE_COLUMN, " 12345 ")].into_iter().collect();
        assert_eq!(row.article_number(), Some("12345"));

        assert_eq!(Row::new().article_number(), None);
    }

    #[test]
    fn repeated_column_names_keep_their_own_values() {
        let mut row: Row = [("Art.-NR", "1"), ("", "a"), ("", "b")].into_iter().collect();
        row.set(BARCODE_COLUMN, "Ikke fundet");

        assert_eq!(row.value_at(1, ""), "a");
        assert_eq!(row.value_at(2, ""), "b");
        assert_eq!(row.value_at(3, BARCODE_COLUMN), "Ikke fundet");
        assert_eq!(row.get(""), Some("a"));
    }

    #[test]
    fn set_replaces_an_existing_cell() {
        let mut row: Row = [(BARCODE_COLUMN, "old"), ("Navn", "te")].into_iter().collect();
        row.set(BARCODE_COLUMN, "4006381333931");

        assert_eq!(row.barcode(), Some("4006381333931"));
        assert_eq!(row.value_at(0, BARCODE_COLUMN), "4006381333931");
        assert_eq!(row.value_at(1, "Navn"), "te");
    }

    #[test]
    fn output_headers_append_barcode_column_once() {
        let table = Table::new(vec!["Art.-NR".into(), "Navn".into()], vec![]);
        assert_eq!(table.output_headers(), vec!["Art.-NR", "Navn", "Stregkode"]);

        let table = Table::new(vec!["Stregkode".into(), "Art.-NR".into()], vec![]);
        assert_eq!(table.output_headers(), vec!["Stregkode", "Art.-NR"]);
    }
}
