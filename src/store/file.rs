use crate::core::document::{Document, DocumentStore, Snapshot, merge_document};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Settings document kept as a JSON file.
///
/// Subscribers are notified by polling the file. A snapshot is emitted
/// whenever the parsed document differs from the last one emitted, so writes
/// within the same timestamp tick are not lost.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    path: PathBuf,
    poll_interval: Duration,
}

impl FileDocumentStore {
    pub fn new<P: AsRef<Path>>(path: P, poll_interval: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            poll_interval,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(path: &Path) -> Result<Snapshot> {
        if !path.exists() {
            debug!("Settings document not found at {}", path.display());
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings document: {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings document: {}", path.display()))?;
        match value {
            Value::Object(doc) => Ok(Some(doc)),
            _ => bail!("Settings document is not a JSON object: {}", path.display()),
        }
    }

    fn write(path: &Path, doc: &Document) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(doc)?;
        // Replace via rename so pollers never see a half-written file.
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    fn modified(path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}

struct PollState {
    path: PathBuf,
    interval: Duration,
    last_emitted: Option<Snapshot>,
    // Modification time of the last unreadable version, warned about once.
    failed_at: Option<Option<SystemTime>>,
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn get(&self) -> Result<Snapshot> {
        Self::read(&self.path)
    }

    async fn subscribe(&self) -> Result<BoxStream<'static, Snapshot>> {
        let state = PollState {
            path: self.path.clone(),
            interval: self.poll_interval,
            last_emitted: None,
            failed_at: None,
        };

        let updates = stream::unfold(state, |mut state| async move {
            loop {
                match FileDocumentStore::read(&state.path) {
                    Ok(snapshot) => {
                        state.failed_at = None;
                        if state.last_emitted.as_ref() != Some(&snapshot) {
                            state.last_emitted = Some(snapshot.clone());
                            return Some((snapshot, state));
                        }
                    }
                    Err(e) => {
                        let modified = FileDocumentStore::modified(&state.path);
                        if state.failed_at != Some(modified) {
                            warn!(error = %e, "Skipping unreadable settings document");
                            state.failed_at = Some(modified);
                        }
                    }
                }
                tokio::time::sleep(state.interval).await;
            }
        });
        Ok(updates.boxed())
    }

    async fn merge(&self, patch: Document) -> Result<()> {
        let mut doc = Self::read(&self.path)?.unwrap_or_default();
        merge_document(&mut doc, patch);
        Self::write(&self.path, &doc)?;
        debug!("Merged settings into {}", self.path.display());
        Ok(())
    }
}
