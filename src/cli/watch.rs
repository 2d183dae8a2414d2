use super::{quote, ui};
use crate::core::config::CurrencyConfig;
use crate::core::document::DocumentStore;
use crate::core::pricing;
use crate::core::sync::ConfigSync;
use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use tracing::{debug, info};

/// Prints a fresh quote every time the settings change.
///
/// Stops on Ctrl-C, or after `limit` quotes when one is given.
pub async fn run(
    store: Arc<dyn DocumentStore>,
    input_price: f64,
    category: Option<&str>,
    currency: &CurrencyConfig,
    limit: Option<usize>,
) -> Result<()> {
    let (sync, mut handle) = ConfigSync::new();
    let sync_task = tokio::spawn(async move { sync.run(store.as_ref()).await });

    let pb = ui::new_spinner("Loading pricing settings...");
    let loaded = handle.wait_loaded().await;
    pb.finish_and_clear();
    if let Err(e) = loaded {
        return Err(stopped_error(sync_task, e).await);
    }

    let mut printed = 0;
    loop {
        let config = handle.config();
        let current = pricing::quote(input_price, category, &config);
        println!(
            "\n{}\n{}",
            ui::style_text(
                &format!("Updated {}", Local::now().format("%H:%M:%S")),
                ui::StyleType::Subtle
            ),
            quote::render(&current, config.exchange_rate, currency)
        );
        printed += 1;
        if limit.is_some_and(|max| printed >= max) {
            debug!(printed, "Reached quote limit");
            break;
        }

        tokio::select! {
            changed = handle.changed() => {
                if let Err(e) = changed {
                    return Err(stopped_error(sync_task, e).await);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watch");
                break;
            }
        }
    }

    sync_task.abort();
    Ok(())
}

/// Prefers the synchronization task's own error over the closed channel.
async fn stopped_error(
    sync_task: tokio::task::JoinHandle<Result<()>>,
    fallback: anyhow::Error,
) -> anyhow::Error {
    match sync_task.await {
        Ok(Err(e)) => e,
        _ => fallback,
    }
}
