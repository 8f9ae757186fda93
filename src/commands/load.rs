use crate::api::{self, Mode};
use crate::ingest::load_sheets_data;
use crate::model::{Expenses, RawTable};
use crate::normalize::normalize_expenses;
use crate::snapshot::SnapshotCache;
use crate::{Config, Result};
use anyhow::Context;
use chrono::Utc;
use tracing::{debug, info, warn};

/// Gets the normalized expenses for the configured spreadsheet.
///
/// A fresh snapshot is used when one exists, unless `refresh` is set. Otherwise every tab is read
/// from the sheet and the result is written back to the snapshot cache. A failure to write the
/// snapshot is logged and does not fail the load.
pub(super) async fn load_expenses(config: &Config, mode: Mode, refresh: bool) -> Result<Expenses> {
    let raw = load_raw(config, mode, refresh).await?;
    let expenses = normalize_expenses(&raw, &config.normalize_options())
        .context("Unable to normalize the expense data")?;
    debug!("Normalized {} expenses", expenses.len());
    Ok(expenses)
}

async fn load_raw(config: &Config, mode: Mode, refresh: bool) -> Result<RawTable> {
    let cache = SnapshotCache::from_config(config);
    let sheet_id = config.spreadsheet_id();

    if refresh {
        debug!("Skipping the snapshot cache because a refresh was requested");
    } else if let Some(snapshot) = cache.load_fresh(sheet_id, Utc::now()).await {
        info!(
            "Using the expense data fetched at {}",
            snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        return Ok(snapshot.data);
    }

    let mut sheet = api::sheet(config, mode).await?;
    let raw = load_sheets_data(sheet.as_mut(), config.excluded_tabs())
        .await
        .context("Unable to read the expense sheet")?;

    if let Err(e) = cache.save(sheet_id, &raw, Utc::now()).await {
        warn!("Unable to cache the expense data: {e:#}");
    }
    Ok(raw)
}
