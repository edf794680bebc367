use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use seo_engine_core::{api::DashboardApi, error::DashboardError, site::SiteId};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    #[error("could not write export file: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Dashboard(e) => e.user_message(),
            Self::Io(e) => format!("Error: could not write export file: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub rows: usize,
}

/// `gsc-data-{siteId}-{YYYY-MM-DD}.csv`
pub fn export_filename(site_id: &SiteId, date: NaiveDate) -> String {
    format!("gsc-data-{}-{}.csv", site_id, date.format("%Y-%m-%d"))
}

/// Count data records (header excluded).
pub fn count_records(csv_data: &str) -> usize {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes())
        .records()
        .filter_map(Result::ok)
        .count()
}

/// Download the search-performance CSV for `site_id` and write it into `dir`.
pub async fn export_search_csv(
    api: &dyn DashboardApi,
    site_id: &SiteId,
    dir: &Path,
    date: NaiveDate,
) -> Result<ExportedFile, ExportError> {
    let export = api.export_search_data(site_id).await?;

    let rows = count_records(&export.csv_data);
    if let Some(reported) = export.rows_count {
        if reported != rows as u64 {
            warn!(site_id = %site_id, reported, counted = rows, "CSV row count mismatch");
        }
    }

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(export_filename(site_id, date));
    tokio::fs::write(&path, export.csv_data.as_bytes()).await?;
    info!(site_id = %site_id, path = %path.display(), rows, "CSV export written");

    Ok(ExportedFile { path, rows })
}
