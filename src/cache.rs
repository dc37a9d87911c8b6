use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;

pub(crate) const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Sentinel window for artifacts that never need a refresh once written,
/// like finished seasons.
pub(crate) const KEEP: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// The schools registry changes only when institutions join or leave.
pub(crate) const SCHOOLS_MAX_AGE: Duration = Duration::from_secs(90 * 24 * 60 * 60);

/// Box scores get corrections for about a month after a game.
pub(crate) const GAME_MAX_AGE: Duration = Duration::from_secs(35 * 24 * 60 * 60);

/// Raw play-by-play occasionally gets backfilled long after the fact.
pub(crate) const PBP_MAX_AGE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Team lists for the running season refresh daily, recent seasons every two
/// weeks, and anything older monthly (conference realignment backfills).
pub(crate) fn team_list_max_age(season: u16, today: NaiveDate) -> Duration {
    let year = today.year();
    if i32::from(season) >= year && today.month() <= 7 {
        DAY
    } else if i32::from(season) >= year - 1 && today.month() <= 7 {
        DAY * 14
    } else {
        DAY * 35
    }
}

/// Per-team artifacts (schedules, rosters, season stats) refresh on a short
/// window while the season is running and are kept as-is afterwards.
pub(crate) fn in_season_max_age(season: u16, today: NaiveDate, fresh_days: u32) -> Duration {
    if i32::from(season) >= today.year() && today.month() <= 7 {
        DAY * fresh_days
    } else {
        KEEP
    }
}

/// Flat CSV cache tree. One file per entity, path segments mirror the
/// sport/artifact layout, rows round-trip through serde.
pub(crate) struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Read rows back if the file exists, is younger than `max_age`, and
    /// still parses. Any other outcome means the caller refetches.
    pub fn load_if_fresh<T: DeserializeOwned>(&self, rel: &str, max_age: Duration) -> Option<Vec<T>> {
        let path = self.path(rel);
        let age = file_age(&path)?;
        if age > max_age {
            debug!(file = rel, "cache entry is stale, refetching");
            return None;
        }
        match read_rows(&path) {
            Ok(rows) => {
                debug!(file = rel, rows = rows.len(), "serving from cache");
                Some(rows)
            }
            Err(err) => {
                warn!(file = rel, "unreadable cache file, refetching: {err}");
                None
            }
        }
    }

    pub fn store<T: Serialize>(&self, rel: &str, rows: &[T]) -> Result<()> {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(&path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        debug!(file = rel, rows = rows.len(), "cache entry written");
        Ok(())
    }
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

fn file_age(path: &Path) -> Option<Duration> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO),
    )
}
