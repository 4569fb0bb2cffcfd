use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::browser::BrowserSession;
use crate::error::Result;
use crate::models::{Barcode, LookupOutcome, Table, BARCODE_COLUMN, NOT_FOUND};
use crate::scrapers::ProductLookup;
use crate::sheet::write_table;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub rows: usize,
    pub looked_up: usize,
    pub found: usize,
    pub not_found: usize,
    pub failed: usize,
    pub images_missing: usize,
    /// Barcodes shared by more than one article; their image file was overwritten.
    pub duplicate_barcodes: Vec<String>,
}

/// Looks up every row with an article number, at most `max_concurrent` pages
/// at a time, and writes the barcode column into each row.
pub async fn run_batch(
    table: &mut Table,
    session: Arc<dyn BrowserSession>,
    lookup: Arc<dyn ProductLookup>,
    max_concurrent: usize,
) -> BatchSummary {
    let jobs: Vec<(usize, String)> = table
        .rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| row.article_number().map(|article| (index, article.to_string())))
        .collect();

    let mut summary = BatchSummary {
        rows: table.len(),
        looked_up: jobs.len(),
        ..Default::default()
    };
    info!(
        "Looking up {} of {} rows with up to {} pages",
        jobs.len(),
        table.len(),
        max_concurrent.max(1)
    );

    let outcomes: Vec<(usize, String, LookupOutcome)> = stream::iter(jobs)
        .map(|(index, article)| {
            let session = session.clone();
            let lookup = lookup.clone();
            async move {
                let outcome = lookup.lookup(session.as_ref(), &article).await;
                (index, article, outcome)
            }
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;

    let mut articles_by_barcode: BTreeMap<Barcode, Vec<String>> = BTreeMap::new();

    for (index, article, outcome) in outcomes {
        let value = outcome.cell_value();
        info!("Updating row with article number {}: {}", article, value);

        match &outcome {
            LookupOutcome::Found {
                barcode,
                image_saved,
                ..
            } => {
                summary.found += 1;
                if !image_saved {
                    summary.images_missing += 1;
                }
                articles_by_barcode
                    .entry(barcode.clone())
                    .or_default()
                    .push(article);
            }
            LookupOutcome::NotFound { .. } => summary.not_found += 1,
            LookupOutcome::Failed { .. } => summary.failed += 1,
        }

        table.rows[index].set(BARCODE_COLUMN, value);
    }

    // Rows without an article number are never looked up
    for row in table.rows.iter_mut() {
        if row.article_number().is_none() {
            row.set(BARCODE_COLUMN, NOT_FOUND);
        }
    }

    for (barcode, articles) in articles_by_barcode {
        if articles.len() > 1 {
            warn!(
                "Articles {:?} share EAN {}; {} holds the last image saved",
                articles,
                barcode,
                crate::storage::image_file_name(&barcode)
            );
            summary.duplicate_barcodes.push(barcode.to_string());
        }
    }

    summary
}

/// Runs the batch, writes the updated sheet to `output` and closes the
/// browser, also when the write fails.
pub async fn process_table(
    table: &mut Table,
    session: Arc<dyn BrowserSession>,
    lookup: Arc<dyn ProductLookup>,
    max_concurrent: usize,
    output: &Path,
) -> Result<BatchSummary> {
    let summary = run_batch(table, session.clone(), lookup, max_concurrent).await;
    let written = write_table(table, output);

    if let Err(e) = session.close().await {
        error!("Failed to close browser: {}", e);
    }

    written.map(|()| summary)
}
