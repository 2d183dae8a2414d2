//! Quote calculation for goods priced in a foreign currency.
//!
//! Everything here is a pure function of its arguments. Invalid numbers are
//! never reported, they simply contribute nothing to the result.
use crate::core::settings::{PricingConfig, sanitize};
use serde::Serialize;

/// Category value meaning "nothing selected".
pub const UNSELECTED_CATEGORY: &str = "-";

/// A commission rate applying to every price from `from` upwards, up to the
/// start of the next band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommissionBand {
    pub from: f64,
    pub rate: f64,
}

/// Commission schedule, ordered by `from`. The whole price is charged at the
/// rate of the band it falls in.
pub const COMMISSION_BANDS: [CommissionBand; 7] = [
    CommissionBand { from: 1.0, rate: 0.50 },
    CommissionBand { from: 141.0, rate: 0.27 },
    CommissionBand { from: 251.0, rate: 0.20 },
    CommissionBand { from: 501.0, rate: 0.18 },
    CommissionBand { from: 601.0, rate: 0.15 },
    CommissionBand { from: 851.0, rate: 0.14 },
    CommissionBand { from: 1401.0, rate: 0.12 },
];

/// Result of pricing one item under one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub input_price: f64,
    pub category: Option<String>,
    pub commission_rate: f64,
    pub converted_price: f64,
    pub commission: f64,
    pub delivery_fee: f64,
    pub service_fee: f64,
    pub total_price: f64,
}

impl Quote {
    /// Total rounded to two decimals for display.
    pub fn display_total(&self) -> String {
        format_amount(self.total_price)
    }
}

/// Formats an amount with two decimals. This is the only place rounding
/// happens.
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", sanitize(value))
}

/// Converts a foreign price to domestic currency. Non-positive or invalid
/// prices convert to `0`.
pub fn convert(input_price: f64, exchange_rate: f64) -> f64 {
    let price = sanitize(input_price);
    if price > 0.0 {
        price * sanitize(exchange_rate)
    } else {
        0.0
    }
}

/// Rate of the commission band `input_price` falls in, `0` below the first
/// band.
pub fn commission_rate(input_price: f64) -> f64 {
    let price = sanitize(input_price);
    if price <= 0.0 {
        return 0.0;
    }
    COMMISSION_BANDS
        .iter()
        .rev()
        .find(|band| price >= band.from)
        .map_or(0.0, |band| band.rate)
}

/// Commission in foreign currency units.
pub fn commission(input_price: f64) -> f64 {
    sanitize(input_price) * commission_rate(input_price)
}

/// Delivery fee for a category. Unknown or unselected categories use a
/// neutral coefficient of `1`.
pub fn delivery_fee(category: Option<&str>, config: &PricingConfig) -> f64 {
    let coefficient = category
        .and_then(|name| config.coefficient(name))
        .unwrap_or(1.0);
    sanitize(config.base_delivery_fee) * sanitize(coefficient)
}

/// Prices `input_price` of `category` under `config`.
///
/// A non-positive converted price yields a zero total, whatever the fees.
pub fn quote(input_price: f64, category: Option<&str>, config: &PricingConfig) -> Quote {
    let converted_price = convert(input_price, config.exchange_rate);
    let commission = commission(input_price) * sanitize(config.exchange_rate);
    let delivery_fee = delivery_fee(category, config);
    let service_fee = sanitize(config.service_fee);

    let total_price = if converted_price > 0.0 {
        converted_price + service_fee + delivery_fee + commission
    } else {
        0.0
    };

    Quote {
        input_price: sanitize(input_price),
        category: category.map(str::to_string),
        commission_rate: commission_rate(input_price),
        converted_price,
        commission,
        delivery_fee,
        service_fee,
        total_price,
    }
}
