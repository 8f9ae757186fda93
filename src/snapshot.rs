//! A short-lived local copy of the fetched sheet data, so that repeated commands do not hit the
//! Sheets API every time.

use crate::model::RawTable;
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// How long a snapshot is reused unless configured otherwise.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

/// Prefix for snapshot files.
const SNAPSHOT: &str = "snapshot";

/// The raw data of one spreadsheet along with when it was fetched.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Snapshot {
    pub sheet_id: String,
    pub fetched_at: DateTime<Utc>,
    pub data: RawTable,
}

/// Stores snapshots as JSON files named `snapshot.{sheet_id}.json`.
///
/// The `SnapshotCache` is immutable. Create one with `SnapshotCache::new` or
/// `SnapshotCache::from_config`.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    dir: PathBuf,
    ttl: Duration,
}

impl SnapshotCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let ttl = i64::try_from(config.cache_ttl_secs())
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self::new(config.cache_dir(), ttl)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file holding the snapshot for `sheet_id`.
    pub fn path(&self, sheet_id: &str) -> PathBuf {
        let safe: String = sheet_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{SNAPSHOT}.{safe}.json"))
    }

    /// Returns the snapshot for `sheet_id` if one exists and is younger than the TTL at `now`.
    ///
    /// A missing, stale or unreadable file is a miss, as is a file written for another sheet or one
    /// whose fetch time is later than `now`.
    pub async fn load_fresh(&self, sheet_id: &str, now: DateTime<Utc>) -> Option<Snapshot> {
        let path = self.path(sheet_id);
        if !path.is_file() {
            debug!("No snapshot at {}", path.display());
            return None;
        }

        let snapshot: Snapshot = match utils::deserialize(&path).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Ignoring unreadable snapshot: {e:#}");
                return None;
            }
        };

        if snapshot.sheet_id != sheet_id {
            debug!("The snapshot at {} is for another sheet", path.display());
            return None;
        }

        let age = now - snapshot.fetched_at;
        if age < Duration::zero() {
            debug!(
                "The snapshot was fetched after now ({}), treating it as stale",
                snapshot.fetched_at
            );
            return None;
        }
        if age >= self.ttl {
            debug!(
                "The snapshot is stale ({}s old, TTL {}s)",
                age.num_seconds(),
                self.ttl.num_seconds()
            );
            return None;
        }

        debug!("Using the snapshot fetched at {}", snapshot.fetched_at);
        Some(snapshot)
    }

    /// Writes `data` as the snapshot for `sheet_id`, fetched at `now`. Returns the snapshot path.
    pub async fn save(
        &self,
        sheet_id: &str,
        data: &RawTable,
        now: DateTime<Utc>,
    ) -> Result<PathBuf> {
        utils::make_dir(&self.dir).await?;
        let snapshot = Snapshot {
            sheet_id: sheet_id.to_string(),
            fetched_at: now,
            data: data.clone(),
        };
        let json =
            serde_json::to_string(&snapshot).context("Failed to serialize the snapshot to JSON")?;

        // Write to a temporary file first so a reader never sees a partial snapshot.
        let path = self.path(sheet_id);
        let tmp = path.with_extension("json.tmp");
        utils::write(&tmp, json).await?;
        utils::rename(&tmp, &path).await?;
        debug!("Saved the snapshot to {}", path.display());
        Ok(path)
    }
}
