use markup::core::document::DocumentStore;
use markup::core::settings::PricingConfig;
use markup::store::file::FileDocumentStore;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

mod test_utils {
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Writes an app config pointing at `document_path` and returns its path.
    pub fn write_config(dir: &Path, document_path: &Path) -> PathBuf {
        let config_path = dir.join("config.yaml");
        let config_content = format!(
            r#"
            currency:
              source: "CNY"
              target: "RUB"
            store:
              path: "{}"
              poll_interval_ms: 10
        "#,
            document_path.display()
        );
        fs::write(&config_path, config_content).expect("Failed to write config file");
        config_path
    }
}

fn read_config(document_path: &Path) -> PricingConfig {
    let content = fs::read_to_string(document_path).expect("Failed to read settings document");
    let value: serde_json::Value = serde_json::from_str(&content).expect("Invalid JSON");
    PricingConfig::from_document(value.as_object().expect("Expected an object"))
}

#[test_log::test(tokio::test)]
async fn test_quote_with_settings_document() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let document_path = dir.path().join("calculator.json");
    fs::write(
        &document_path,
        r#"{
            "exchangeRate": "12.7",
            "serviceFee": 0,
            "deliveryFee": 1300,
            "deliveryCategories": { "Sneakers": 1.5 },
            "rubleRate": 5791.2
        }"#,
    )
    .expect("Failed to write settings document");
    let config_path = test_utils::write_config(dir.path(), &document_path);
    let config_path = config_path.to_str().unwrap();

    for (category, delivery, total) in [
        (None, 1300.0, "3205.00"),
        (Some("-"), 1300.0, "3205.00"),
        (Some("Sneakers"), 1950.0, "3855.00"),
    ] {
        let quote = markup::quote("100", category, Some(config_path))
            .await
            .expect("Quote failed");
        info!(?quote, "Quoted with legacy fields");
        assert_eq!(quote.converted_price, 1270.0);
        assert_eq!(quote.commission, 635.0);
        assert_eq!(quote.delivery_fee, delivery);
        assert_eq!(quote.service_fee, 0.0);
        assert_eq!(quote.display_total(), total);
    }

    let result = markup::run_command(
        markup::AppCommand::Quote {
            price: "100".to_string(),
            category: Some("Sneakers".to_string()),
        },
        Some(config_path),
    )
    .await;
    assert!(result.is_ok(), "Quote failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_quote_without_settings_document_uses_defaults() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let document_path = dir.path().join("missing").join("calculator.json");
    let config_path = test_utils::write_config(dir.path(), &document_path);

    let quote = markup::quote("abc", Some("Unknown"), Some(config_path.to_str().unwrap()))
        .await
        .expect("Quote failed");
    assert_eq!(quote.input_price, 0.0);
    assert_eq!(quote.total_price, 0.0);
    assert_eq!(quote.delivery_fee, 1300.0);
    assert_eq!(quote.service_fee, 1500.0);
    assert!(!document_path.exists());
}

#[test_log::test(tokio::test)]
async fn test_quote_fails_on_corrupt_document() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let document_path = dir.path().join("calculator.json");
    fs::write(&document_path, "{ not json").expect("Failed to write settings document");
    let config_path = test_utils::write_config(dir.path(), &document_path);

    let result = markup::run_command(
        markup::AppCommand::Categories,
        Some(config_path.to_str().unwrap()),
    )
    .await;
    let err = result.expect_err("Corrupt document should fail");
    assert!(err.to_string().contains("Failed to parse settings document"));
}

#[test_log::test(tokio::test)]
async fn test_set_then_categories() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let document_path = dir.path().join("settings").join("calculator.json");
    let config_path = test_utils::write_config(dir.path(), &document_path);
    let config_path = config_path.to_str().unwrap();

    let update = markup::cli::set::SettingsUpdate {
        exchange_rate: Some(13.1),
        base_delivery_fee: Some(1000.0),
        coefficients: vec![("Sneakers".to_string(), 1.8), ("Caps".to_string(), 0.5)],
        ..Default::default()
    };
    markup::run_command(markup::AppCommand::Set(update), Some(config_path))
        .await
        .expect("Set failed");

    let saved = read_config(&document_path);
    info!(?saved, "Saved settings");
    assert_eq!(saved.exchange_rate, 13.1);
    assert_eq!(saved.base_delivery_fee, 1000.0);
    assert_eq!(saved.service_fee, 0.0);
    assert_eq!(saved.coefficient("Sneakers"), Some(1.8));
    assert_eq!(saved.coefficient("Caps"), Some(0.5));
    assert_eq!(saved.coefficient("Hoodies"), Some(1.6));

    let result = markup::run_command(markup::AppCommand::Categories, Some(config_path)).await;
    assert!(result.is_ok(), "Categories failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_set_requires_a_field() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let document_path = dir.path().join("calculator.json");
    let config_path = test_utils::write_config(dir.path(), &document_path);

    let result = markup::run_command(
        markup::AppCommand::Set(Default::default()),
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_err());
    assert!(!document_path.exists());
}

#[test_log::test(tokio::test)]
async fn test_watch_picks_up_file_changes() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let document_path = dir.path().join("calculator.json");
    let config_path = test_utils::write_config(dir.path(), &document_path);

    let writer = FileDocumentStore::new(&document_path, Duration::from_millis(10));
    writer
        .merge(PricingConfig::default().to_document())
        .await
        .expect("Failed to seed settings");

    let update = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let patch = serde_json::json!({ "exchangeRate": 14.2 })
            .as_object()
            .cloned()
            .unwrap();
        writer.merge(patch).await
    });

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        markup::run_command(
            markup::AppCommand::Watch {
                price: "250".to_string(),
                category: Some("Sneakers".to_string()),
                count: Some(2),
            },
            Some(config_path.to_str().unwrap()),
        ),
    )
    .await
    .expect("Watch did not see the update in time");
    assert!(result.is_ok(), "Watch failed with: {:?}", result.err());
    update.await.unwrap().expect("Failed to update settings");

    assert_eq!(read_config(&document_path).exchange_rate, 14.2);
}
