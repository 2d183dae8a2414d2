use super::ui;
use crate::core::config::CurrencyConfig;
use crate::core::pricing::{self, Quote};
use crate::core::settings::PricingConfig;
use anyhow::Result;
use comfy_table::Cell;
use tracing::{debug, warn};

/// Quotes against one settings snapshot and prints the breakdown.
pub fn run(
    config: &PricingConfig,
    input_price: f64,
    category: Option<&str>,
    currency: &CurrencyConfig,
) -> Result<Quote> {
    if let Some(name) = category
        && config.coefficient(name).is_none()
    {
        warn!(category = name, "Unknown category, delivery is not scaled");
    }

    let quote = pricing::quote(input_price, category, config);
    debug!(?quote, "Calculated quote");
    println!("{}", render(&quote, config.exchange_rate, currency));
    Ok(quote)
}

/// Renders the breakdown table followed by the total line.
pub fn render(quote: &Quote, exchange_rate: f64, currency: &CurrencyConfig) -> String {
    let target = &currency.target;
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Item"),
        ui::header_cell(&format!("Amount ({target})")),
    ]);

    let category_label = quote.category.as_deref().unwrap_or("none");
    table.add_row(vec![
        Cell::new(format!(
            "Price {} {} @ {exchange_rate}",
            quote.input_price, currency.source
        )),
        ui::amount_cell(quote.converted_price),
    ]);
    table.add_row(vec![
        Cell::new(format!("Commission ({:.0}%)", quote.commission_rate * 100.0)),
        ui::amount_cell(quote.commission),
    ]);
    table.add_row(vec![
        Cell::new(format!("Delivery ({category_label})")),
        ui::amount_cell(quote.delivery_fee),
    ]);
    table.add_row(vec![
        Cell::new("Service fee"),
        ui::amount_cell(quote.service_fee),
    ]);

    let mut output = table.to_string();
    output.push_str(&format!(
        "\n\nTotal Price ({}): {}",
        ui::style_text(target, ui::StyleType::TotalLabel),
        ui::style_text(&quote.display_total(), ui::StyleType::TotalValue)
    ));
    output
}
