//! Metering module
//!
//! Aggregates logged water-using activities:
//! - ConsumptionEntry: One activity converted to litres
//! - ConsumptionAggregator: Totals by day and activity, trends, breakdowns,
//!   summaries, and the bill history

pub mod aggregator;

pub use aggregator::{
    BillRecord, ConsumptionAggregator, ConsumptionEntry, ConsumptionSummary, ConsumptionTrend,
    DailyConsumption, DailyKey, DayStatus, TrendPeriod, TrendPoint,
};
