//! Bill analysis module
//!
//! Compares the consumption recovered from a bill with the daily target.

pub mod bill_analysis;

pub use bill_analysis::{BillAnalysis, BillAnalyzer, ConsumptionStatus, UsageSource, DANGER_FACTOR};
