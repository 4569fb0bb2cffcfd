//! Fetching the product sheet and writing the updated copy.

use reqwest::Client;
use std::path::Path;
use tracing::info;

use crate::error::{Result, ScrapeError};
use crate::models::{Row, Table, BARCODE_COLUMN};
use crate::utils::http::fetch;

/// Downloads the published sheet and parses it. No retries here.
pub async fn fetch_table(client: &Client, url: &str) -> Result<Table> {
    let network_error = |e: anyhow::Error| ScrapeError::Network {
        url: url.to_string(),
        message: format!("{:#}", e),
    };

    let response = fetch(client, url).await.map_err(network_error)?;
    let body = response
        .bytes()
        .await
        .map_err(|e| network_error(e.into()))?;

    let table = parse_table(&body)?;
    info!("Fetched {} rows with columns {:?}", table.len(), table.headers);
    Ok(table)
}

/// Header row defines the column names; rows keep source order.
pub fn parse_table(data: &[u8]) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(row);
    }

    Ok(Table::new(headers, rows))
}

/// Writes every row with the barcode column appended.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    let headers = table.output_headers();
    writer.write_record(&headers)?;

    for row in &table.rows {
        writer.write_record(
            headers
                .iter()
                .enumerate()
                .map(|(position, header)| row.value_at(position, header)),
        )?;
    }

    writer.flush()?;
    info!(
        "Wrote {} rows to {} ({} column added)",
        table.len(),
        path.display(),
        BARCODE_COLUMN
    );
    Ok(())
}
