//! # WaterWise Common
//!
//! Shared types, errors, and tariff constants for WaterWise.
//!
//! ## Core Types
//!
//! - [`CustomerCategory`]: Subscriber category driving the tariff discount
//! - [`RateSchedule`]/[`RateOverrides`]: Per-m³ prices and partial overrides
//! - [`BillResult`]: Itemized bill produced by the tariff calculator
//! - [`ActivityType`]: Water-using activities and their litre coefficients

pub mod error;
pub mod types;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Re-export commonly used types at crate root
pub use error::{Result, TariffError, WaterwiseError};
pub use types::{
    activity::ActivityType,
    bill::BillResult,
    category::CustomerCategory,
    rates::{RateKey, RateOverrides, RateSchedule},
};

/// WaterWise version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Currency tag attached to every bill
pub const CURRENCY: &str = "TL";

/// Width of each consumption band (m³)
pub const TIER_BAND_M3: Decimal = dec!(15);

/// Usage window eligible for the humanitarian allowance (m³)
pub const DEDUCTION_WINDOW_M3: Decimal = dec!(15);

/// Each full block of this size earns one allowance (m³)
pub const DEDUCTION_BLOCK_M3: Decimal = dec!(2.5);

/// Free allowance granted per full block (m³)
pub const DEDUCTION_PER_BLOCK_M3: Decimal = dec!(0.5);

/// Discount on water and wastewater cost for discounted categories
pub const CATEGORY_DISCOUNT_RATE: Decimal = dec!(0.50);

/// Litres per cubic meter
pub const LITERS_PER_M3: Decimal = dec!(1000);

/// Default daily consumption target in litres
pub const DEFAULT_DAILY_TARGET_LITERS: Decimal = dec!(150);

/// Days covered by one bill
pub const BILLING_PERIOD_DAYS: u32 = 30;

/// Largest usage the tariff bills (m³); larger figures are clamped to it
pub const MAX_USAGE_M3: Decimal = dec!(1000000);

/// Largest accepted per-m³ price or fractional rate in an override
pub const MAX_RATE: Decimal = dec!(1000000);

/// Largest minutes/cycles/units accepted for one logged activity
pub const MAX_ACTIVITY_AMOUNT: Decimal = dec!(1000000);

/// Round a monetary amount or volume to 2 decimal places (half away from zero)
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Clamp a usage figure into `[0, MAX_USAGE_M3]`
pub fn clamp_usage(usage_m3: Decimal) -> Decimal {
    usage_m3.max(Decimal::ZERO).min(MAX_USAGE_M3)
}
