use crate::core::config::AppConfig;
use crate::core::document::DocumentStore;
use crate::core::settings::PricingConfig;
use crate::store::file::FileDocumentStore;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

// Embedded so `setup` works from an installed binary.
const EXAMPLE_CONFIG: &str = include_str!("../../docs/example_config.yaml");

/// Creates the default configuration file and seeds the settings document
/// with the built-in pricing defaults.
pub async fn setup() -> Result<()> {
    let path = AppConfig::default_config_path()?;
    setup_at_path(&path)?;

    let config = AppConfig::load_from_path(&path)?;
    let store = FileDocumentStore::new(config.document_path()?, config.poll_interval());
    if seed_document(&store).await? {
        info!("Seeded pricing settings at {}", store.path().display());
    }
    Ok(())
}

/// Creates a default configuration file with example content at the specified path
pub fn setup_at_path<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    info!("Created default configuration at {}", path.display());
    Ok(())
}

/// Writes the built-in defaults unless a settings document already exists.
/// Returns whether anything was written.
pub async fn seed_document(store: &dyn DocumentStore) -> Result<bool> {
    if store.get().await?.is_some() {
        return Ok(false);
    }
    store
        .merge(PricingConfig::default().to_document())
        .await
        .context("Failed to seed pricing settings")?;
    Ok(true)
}
