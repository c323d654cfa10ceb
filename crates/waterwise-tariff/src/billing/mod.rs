//! Billing module
//!
//! Progressive tariff calculation with:
//! - Three ordered consumption bands
//! - Humanitarian allowance on the first band
//! - Category discount on water and wastewater
//! - Environmental levy and VAT

pub mod calculator;

pub use calculator::{compute_bill, deduction_m3, tier_bands, TariffCalculator, TierBand};
