use crate::core::document::{Document, DocumentStore, Snapshot, merge_document};
use anyhow::Result;
use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedSender};
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct Inner {
    document: Snapshot,
    subscribers: Vec<UnboundedSender<Snapshot>>,
}

/// In-memory document store that pushes every write to its subscribers.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDocumentStore {
    /// Creates a store without a document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: Document) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                document: Some(document),
                subscribers: Vec::new(),
            })),
        }
    }

    /// Replaces the whole document and notifies subscribers.
    pub async fn set(&self, document: Document) {
        let mut inner = self.inner.lock().await;
        inner.document = Some(document);
        Self::publish(&mut inner);
    }

    fn publish(inner: &mut Inner) {
        let snapshot = inner.document.clone();
        inner
            .subscribers
            .retain(|tx| tx.unbounded_send(snapshot.clone()).is_ok());
        debug!(subscribers = inner.subscribers.len(), "Published snapshot");
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self) -> Result<Snapshot> {
        Ok(self.inner.lock().await.document.clone())
    }

    async fn subscribe(&self) -> Result<BoxStream<'static, Snapshot>> {
        let (tx, rx) = mpsc::unbounded();
        let mut inner = self.inner.lock().await;
        // A fresh channel cannot be closed yet.
        let _ = tx.unbounded_send(inner.document.clone());
        inner.subscribers.push(tx);
        Ok(rx.boxed())
    }

    async fn merge(&self, patch: Document) -> Result<()> {
        let mut inner = self.inner.lock().await;
        merge_document(inner.document.get_or_insert_with(Document::new), patch);
        Self::publish(&mut inner);
        Ok(())
    }
}
