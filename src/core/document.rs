//! Document store abstractions

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::{Map, Value};

/// A settings document, as held by the external store.
pub type Document = Map<String, Value>;

/// State of the document at one point in time. `None` when it does not exist.
pub type Snapshot = Option<Document>;

/// An external store holding the pricing settings document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads the current snapshot.
    async fn get(&self) -> Result<Snapshot>;

    /// Subscribes to changes. The first item is the current snapshot, every
    /// later item is a whole-document snapshot in the order writes happened.
    async fn subscribe(&self) -> Result<BoxStream<'static, Snapshot>>;

    /// Deep-merges `patch` into the document, creating it if missing, and
    /// notifies subscribers.
    async fn merge(&self, patch: Document) -> Result<()>;
}

/// Merges `patch` into `target`. Nested objects are merged key by key, any
/// other value replaces the existing one.
pub fn merge_document(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        match value {
            Value::Object(nested) => match target.get_mut(&key) {
                Some(Value::Object(existing)) => merge_document(existing, nested),
                _ => {
                    target.insert(key, Value::Object(nested));
                }
            },
            value => {
                target.insert(key, value);
            }
        }
    }
}
