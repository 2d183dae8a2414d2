use super::ui;
use crate::core::config::CurrencyConfig;
use crate::core::pricing::{delivery_fee, format_amount};
use crate::core::settings::PricingConfig;
use anyhow::Result;
use comfy_table::Cell;

pub fn run(config: &PricingConfig, currency: &CurrencyConfig) -> Result<()> {
    println!("{}", render(config, currency));
    Ok(())
}

/// Current parameters followed by one row per category.
pub fn render(config: &PricingConfig, currency: &CurrencyConfig) -> String {
    let target = &currency.target;
    let mut output = format!(
        "{}\n\n",
        ui::style_text("Pricing settings", ui::StyleType::Title)
    );
    output.push_str(&format!(
        "Exchange rate: {} {target}/{}\nService fee: {} {target}\nBase delivery fee: {} {target}\n\n",
        config.exchange_rate,
        currency.source,
        format_amount(config.service_fee),
        format_amount(config.base_delivery_fee),
    ));

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell("Coefficient"),
        ui::header_cell(&format!("Delivery ({target})")),
    ]);
    for (name, coefficient) in &config.category_coefficients {
        table.add_row(vec![
            Cell::new(name),
            ui::factor_cell(*coefficient),
            ui::amount_cell(delivery_fee(Some(name.as_str()), config)),
        ]);
    }
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n{}",
        ui::style_text(
            "Unlisted or unselected categories use a coefficient of 1.",
            ui::StyleType::Subtle
        )
    ));
    output
}
