//! Core business logic: pricing, settings and their synchronization

pub mod config;
pub mod document;
pub mod log;
pub mod pricing;
pub mod settings;
pub mod sync;

// Re-export main types for cleaner imports
pub use document::{Document, DocumentStore, Snapshot};
pub use pricing::{Quote, quote};
pub use settings::PricingConfig;
pub use sync::{ConfigHandle, ConfigSync};
