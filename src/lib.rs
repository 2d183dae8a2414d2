pub mod cli;
pub mod core;
pub mod store;

use crate::cli::set::SettingsUpdate;
use crate::core::config::AppConfig;
use crate::core::document::DocumentStore;
use crate::core::pricing::Quote;
use crate::core::sync::{ConfigHandle, ConfigSync};
use crate::store::file::FileDocumentStore;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Quote {
        price: String,
        category: Option<String>,
    },
    Categories,
    Watch {
        price: String,
        category: Option<String>,
        count: Option<usize>,
    },
    Set(SettingsUpdate),
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Markup starting...");
    let (config, store) = open_store(config_path)?;

    match command {
        AppCommand::Quote { price, category } => {
            quote_with(&config, store.as_ref(), &price, category.as_deref())
                .await
                .map(|_| ())
        }
        AppCommand::Categories => {
            let handle = load_settings(store.as_ref()).await?;
            cli::categories::run(&handle.config(), &config.currency)
        }
        AppCommand::Watch {
            price,
            category,
            count,
        } => {
            cli::watch::run(
                store,
                cli::parse_price(&price),
                cli::parse_category(category.as_deref()),
                &config.currency,
                count,
            )
            .await
        }
        AppCommand::Set(update) => cli::set::run(store.as_ref(), &update).await,
    }
}

/// Runs the `quote` command and returns the quote it printed.
pub async fn quote(
    price: &str,
    category: Option<&str>,
    config_path: Option<&str>,
) -> Result<Quote> {
    let (config, store) = open_store(config_path)?;
    quote_with(&config, store.as_ref(), price, category).await
}

fn open_store(config_path: Option<&str>) -> Result<(AppConfig, Arc<dyn DocumentStore>)> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let document_path = config.document_path()?;
    debug!("Using settings document at {}", document_path.display());
    let store: Arc<dyn DocumentStore> =
        Arc::new(FileDocumentStore::new(document_path, config.poll_interval()));
    Ok((config, store))
}

async fn quote_with(
    config: &AppConfig,
    store: &dyn DocumentStore,
    price: &str,
    category: Option<&str>,
) -> Result<Quote> {
    let handle = load_settings(store).await?;
    cli::quote::run(
        &handle.config(),
        cli::parse_price(price),
        cli::parse_category(category),
        &config.currency,
    )
}

/// Reads the current settings once, showing a spinner while loading.
async fn load_settings(store: &dyn DocumentStore) -> Result<ConfigHandle> {
    let (sync, handle) = ConfigSync::new();
    let pb = cli::ui::new_spinner("Loading pricing settings...");
    let snapshot = store.get().await;
    pb.finish_and_clear();

    sync.apply(&snapshot?);
    Ok(handle)
}
