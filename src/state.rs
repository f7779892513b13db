//! Persisted scan state: per-feed markers plus [`Stats`].
//!
//! The file is JSON with camelCase keys.  Every field is optional on read and
//! unknown fields are ignored, so older and newer files both load.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PersistenceError;
use crate::source::Marker;
use crate::stats::Stats;

/// Feed URL → marker of the newest article seen on its last good fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanState {
    markers: BTreeMap<String, Marker>,
}

impl ScanState {
    pub fn marker(&self, url: &str) -> Option<&Marker> {
        self.markers.get(url)
    }

    pub fn set_marker(&mut self, url: &str, marker: Marker) {
        self.markers.insert(url.to_string(), marker);
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }
}

/// On-disk record.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedState {
    pub last_articles: ScanState,
    pub stats: Stats,
    pub last_saved: Option<DateTime<Utc>>,
}

/// Reads and writes [`PersistedState`] at a fixed path.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load state, falling back to empty defaults.
    ///
    /// A missing file is normal on first run.  Any other failure is logged
    /// and also yields defaults.
    pub async fn load(&self) -> (ScanState, Stats) {
        match self.read().await {
            Ok(Some(state)) => {
                info!(
                    path = %self.path.display(),
                    feeds = state.last_articles.len(),
                    "loaded saved state"
                );
                let mut stats = state.stats;
                stats.trim_errors();
                (state.last_articles, stats)
            }
            Ok(None) => {
                info!(path = %self.path.display(), "no saved state, starting fresh");
                Default::default()
            }
            Err(e) => {
                warn!(error = %e, "failed to load saved state, starting fresh");
                Default::default()
            }
        }
    }

    /// Read the file; `Ok(None)` when it does not exist.
    pub async fn read(&self) -> Result<Option<PersistedState>, PersistenceError> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }

    /// Write state, logging instead of failing.  In-memory state is
    /// untouched either way.
    pub async fn save(&self, scan: &ScanState, stats: &Stats) {
        match self.write(scan, stats).await {
            Ok(()) => info!(path = %self.path.display(), "state saved"),
            Err(e) => warn!(error = %e, "failed to save state"),
        }
    }

    /// Serialise to a sibling temp file, then rename over the target.
    pub async fn write(&self, scan: &ScanState, stats: &Stats) -> Result<(), PersistenceError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Record<'a> {
            last_articles: &'a ScanState,
            stats: &'a Stats,
            last_saved: DateTime<Utc>,
        }

        let json = serde_json::to_vec_pretty(&Record {
            last_articles: scan,
            stats,
            last_saved: Utc::now(),
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let io_err = |source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        };
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}
