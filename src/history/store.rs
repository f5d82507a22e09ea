use crate::history::types::{HistoryLimits, Interaction};
use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

/// Failures reading or writing the history file
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to access history file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("History file {path:?} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The persisted interaction log.
///
/// The file holds a JSON array, oldest first, and is always rewritten in full.
/// No locking is done: concurrent invocations race and the last writer wins.
pub struct InteractionStore {
    path: PathBuf,
    limits: HistoryLimits,
}

impl InteractionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_limits(path, HistoryLimits::default())
    }

    pub fn with_limits(path: impl Into<PathBuf>, limits: HistoryLimits) -> Self {
        Self {
            path: path.into(),
            limits,
        }
    }

    /// Reads every stored interaction. A missing file is an empty history.
    pub async fn load_all(&self) -> Result<Vec<Interaction>, HistoryError> {
        let json = match fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "No history file yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(HistoryError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&json).map_err(|source| HistoryError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Loads the interactions eligible for replay at `now`.
    pub async fn load_working_set(
        &self,
        now: NaiveDateTime,
    ) -> Result<Vec<Interaction>, HistoryError> {
        let all = self.load_all().await?;
        let stored = all.len();
        let working = select_working_set(all, now, &self.limits);

        debug!(
            stored = stored,
            selected = working.len(),
            "Loaded history working set"
        );
        Ok(working)
    }

    /// Overwrites the history file with `interactions`.
    pub async fn save(&self, interactions: &[Interaction]) -> Result<(), HistoryError> {
        let io_err = |source| HistoryError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(io_err)?;
            }
        }

        let json = serde_json::to_string_pretty(interactions).map_err(|source| {
            HistoryError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;

        fs::write(&self.path, json).await.map_err(io_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(io_err)?;
        }

        info!(count = interactions.len(), path = ?self.path, "Saved history");
        Ok(())
    }

    /// Appends `interaction` to `working`, applies the durable cap and persists.
    ///
    /// Returns the list as written to disk.
    pub async fn record(
        &self,
        mut working: Vec<Interaction>,
        interaction: Interaction,
    ) -> Result<Vec<Interaction>, HistoryError> {
        working.push(interaction);
        apply_durable_cap(&mut working, self.limits.max_entries);
        self.save(&working).await?;
        Ok(working)
    }
}

/// Picks the interactions to replay from the full stored list.
///
/// Walks newest to oldest. Interactions at or before `now - max_age` are
/// skipped. The first in-window interaction that would push the cumulative
/// content length over the budget ends the scan, even if older ones would fit.
/// The result is oldest first.
pub fn select_working_set(
    all: Vec<Interaction>,
    now: NaiveDateTime,
    limits: &HistoryLimits,
) -> Vec<Interaction> {
    let cutoff = now - limits.max_age;
    let mut selected = Vec::new();
    let mut total = 0;

    for interaction in all.into_iter().rev() {
        if interaction.timestamp <= cutoff {
            continue;
        }

        let len = interaction.content_len();
        if total + len > limits.char_budget {
            break;
        }

        total += len;
        selected.push(interaction);
    }

    selected.reverse();
    selected
}

/// Drops the oldest interactions until at most `max_entries` remain.
pub fn apply_durable_cap(interactions: &mut Vec<Interaction>, max_entries: usize) {
    if interactions.len() > max_entries {
        let excess = interactions.len() - max_entries;
        interactions.drain(..excess);
    }
}
