use crate::core::document::{Document, DocumentStore};
use crate::core::settings::{
    FIELD_BASE_DELIVERY_FEE, FIELD_CATEGORY_COEFFICIENTS, FIELD_EXCHANGE_RATE, FIELD_SERVICE_FEE,
};
use anyhow::{Result, bail};
use serde_json::{Map, Value, json};
use tracing::info;

/// Fields to change in the settings document. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsUpdate {
    pub exchange_rate: Option<f64>,
    pub service_fee: Option<f64>,
    pub base_delivery_fee: Option<f64>,
    pub coefficients: Vec<(String, f64)>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.exchange_rate.is_none()
            && self.service_fee.is_none()
            && self.base_delivery_fee.is_none()
            && self.coefficients.is_empty()
    }

    /// Partial document for a deep merge into the store.
    pub fn to_patch(&self) -> Result<Document> {
        if self.is_empty() {
            bail!("Nothing to update, pass at least one setting");
        }

        let mut patch = Document::new();
        for (field, value) in [
            (FIELD_EXCHANGE_RATE, self.exchange_rate),
            (FIELD_SERVICE_FEE, self.service_fee),
            (FIELD_BASE_DELIVERY_FEE, self.base_delivery_fee),
        ] {
            if let Some(value) = value {
                patch.insert(field.to_string(), json!(checked(field, value)?));
            }
        }

        if !self.coefficients.is_empty() {
            let mut categories = Map::new();
            for (name, coefficient) in &self.coefficients {
                if name.trim().is_empty() {
                    bail!("Category name cannot be empty");
                }
                categories.insert(name.clone(), json!(checked(name, *coefficient)?));
            }
            patch.insert(
                FIELD_CATEGORY_COEFFICIENTS.to_string(),
                Value::Object(categories),
            );
        }
        Ok(patch)
    }
}

fn checked(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        bail!("{field} must be a non-negative number, got {value}");
    }
    Ok(value)
}

/// Parses a `NAME=COEFFICIENT` pair.
pub fn parse_coefficient(input: &str) -> Result<(String, f64)> {
    let Some((name, value)) = input.rsplit_once('=') else {
        bail!("Expected NAME=COEFFICIENT, got '{input}'");
    };
    let name = name.trim();
    let coefficient: f64 = value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid coefficient for '{name}': '{value}'"))?;
    Ok((name.to_string(), checked(name, coefficient)?))
}

pub async fn run(store: &dyn DocumentStore, update: &SettingsUpdate) -> Result<()> {
    let patch = update.to_patch()?;
    store.merge(patch).await?;
    info!(?update, "Saved pricing settings");
    println!("Settings saved.");
    Ok(())
}
