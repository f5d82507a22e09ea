//! Append-only diagnostic log
//!
//! Every invocation records the query, the system prompt and the model's
//! responses so a surprising answer can be inspected after the fact. Nothing
//! ever reads this file back.

use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Width of the separator line closing each entry
pub const SEPARATOR_WIDTH: usize = 80;

#[derive(Error, Debug)]
pub enum DiagnosticError {
    #[error("Failed to {operation} {path:?}: {source}")]
    StorageFailed {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handle on the diagnostic log file
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    path: PathBuf,
}

impl DiagnosticLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one timestamped entry.
    ///
    /// Entries never overwrite each other. Callers treat a failure as a warning.
    pub async fn append(&self, content: &str) -> Result<(), DiagnosticError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.storage_err("create directory for", e))?;
            }
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.storage_err("open", e))?;

        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        file.write_all(format_entry(&timestamp, content).as_bytes())
            .await
            .map_err(|e| self.storage_err("write", e))?;

        tracing::trace!(path = %self.path.display(), bytes = content.len(), "Appended diagnostic entry");
        Ok(())
    }

    fn storage_err(&self, operation: &'static str, source: std::io::Error) -> DiagnosticError {
        DiagnosticError::StorageFailed {
            operation,
            path: self.path.clone(),
            source,
        }
    }

    /// Appends an entry with a `label:` heading line
    pub async fn append_labeled(&self, label: &str, content: &str) -> Result<(), DiagnosticError> {
        self.append(&format!("{label}:\n{content}")).await
    }
}

fn format_entry(timestamp: &str, content: &str) -> String {
    format!(
        "\n{}\n{}\n{}\n",
        timestamp,
        content,
        "=".repeat(SEPARATOR_WIDTH)
    )
}
