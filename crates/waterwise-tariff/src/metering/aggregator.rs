//! Consumption aggregation with DashMap
//!
//! Aggregates logged activities by day and activity type for the daily
//! status check, trend charts, and per-activity breakdowns.
//!
//! Bill entries record a whole billing period, so they are kept out of the
//! daily totals and only surface through [`ConsumptionAggregator::bill_history`].

use chrono::{Datelike, Duration, NaiveDate};
use dashmap::DashMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use waterwise_common::{
    round_money, ActivityType, TariffError, LITERS_PER_M3, MAX_ACTIVITY_AMOUNT,
};

/// One logged water-using activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionEntry {
    pub activity: ActivityType,
    /// Minutes, cycles, or units depending on the activity
    pub amount: Decimal,
    /// Litres derived from the activity coefficient
    pub liters: Decimal,
    pub date: NaiveDate,
}

impl ConsumptionEntry {
    /// Create an entry, deriving litres from the activity
    pub fn new(activity: ActivityType, amount: Decimal, date: NaiveDate) -> Self {
        Self {
            activity,
            amount,
            liters: activity.liters_for(amount),
            date,
        }
    }

    pub fn validate(&self) -> Result<(), TariffError> {
        if self.amount < Decimal::ZERO {
            return Err(TariffError::invalid("amount", "cannot be negative"));
        }
        if self.amount > MAX_ACTIVITY_AMOUNT {
            return Err(TariffError::invalid(
                "amount",
                format!("{} exceeds {}", self.amount, MAX_ACTIVITY_AMOUNT),
            ));
        }
        Ok(())
    }
}

/// Aggregation key: one bucket per day and activity
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyKey {
    pub date: NaiveDate,
    pub activity: ActivityType,
}

impl DailyKey {
    pub fn from_entry(entry: &ConsumptionEntry) -> Self {
        Self {
            date: entry.date,
            activity: entry.activity,
        }
    }
}

/// Aggregated consumption for one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyConsumption {
    pub key: DailyKey,
    pub total_liters: Decimal,
    pub entry_count: u64,
}

/// Bucket size for trend charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendPeriod {
    Daily,
    /// Tuesday through Monday, labelled by the closing Monday
    Weekly,
    /// Calendar months
    Monthly,
}

impl TrendPeriod {
    /// Daily target multiplier for one bucket
    pub fn target_multiplier(&self) -> Decimal {
        match self {
            TrendPeriod::Daily => Decimal::ONE,
            TrendPeriod::Weekly => Decimal::from(7),
            TrendPeriod::Monthly => Decimal::from(30),
        }
    }

    /// Label of the bucket containing `date`
    ///
    /// Weekly buckets are named after the Monday that closes them, monthly
    /// buckets after the first of the month.
    pub fn bucket_label(&self, date: NaiveDate) -> NaiveDate {
        match self {
            TrendPeriod::Daily => date,
            TrendPeriod::Weekly => {
                let to_monday = (7 - date.weekday().num_days_from_monday()) % 7;
                date + Duration::days(i64::from(to_monday))
            }
            TrendPeriod::Monthly => date.with_day(1).unwrap_or(date),
        }
    }
}

/// One bucket of a trend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub label: NaiveDate,
    pub liters: Decimal,
}

/// Consumption over a date range, bucketed by period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionTrend {
    pub period: TrendPeriod,
    pub points: Vec<TrendPoint>,
    /// Target for one bucket
    pub target_liters: Decimal,
}

/// A single day's total against the daily target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStatus {
    pub date: NaiveDate,
    pub total_liters: Decimal,
    pub daily_target_liters: Decimal,
    pub exceeded: bool,
}

impl DayStatus {
    /// Litres left before the target is reached (zero once exceeded)
    pub fn remaining_liters(&self) -> Decimal {
        (self.daily_target_liters - self.total_liters).max(Decimal::ZERO)
    }
}

/// Week-over-week and month-over-month comparison as of one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionSummary {
    pub today: NaiveDate,
    /// Litres in the seven days ending today
    pub recent_week_liters: Decimal,
    /// Litres in the seven days before that
    pub previous_week_liters: Decimal,
    /// `None` when the previous week is empty
    pub week_change_pct: Option<f64>,
    pub this_month_daily_avg: Decimal,
    pub last_month_daily_avg: Decimal,
    /// Only reported after the 10th and when last month has entries
    pub month_change_pct: Option<f64>,
    /// Activity with the most litres across everything logged
    pub top_activity: Option<(ActivityType, Decimal)>,
}

/// One logged bill, newest first in [`ConsumptionAggregator::bill_history`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillRecord {
    pub date: NaiveDate,
    pub liters: Decimal,
    pub amount_m3: Decimal,
}

/// Percentage change from `previous` to `current`
fn change_pct(current: Decimal, previous: Decimal) -> Option<f64> {
    if previous <= Decimal::ZERO {
        return None;
    }
    let (current, previous) = (current.to_f64()?, previous.to_f64()?);
    Some((current - previous) / previous * 100.0)
}

/// Consumption aggregator
#[derive(Debug, Clone, Default)]
pub struct ConsumptionAggregator {
    aggregations: Arc<DashMap<DailyKey, DailyConsumption>>,
}

impl ConsumptionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a logged activity
    #[instrument(skip(self, entry), fields(activity = %entry.activity, date = %entry.date))]
    pub fn record(&self, entry: &ConsumptionEntry) -> Result<(), TariffError> {
        entry.validate()?;
        let key = DailyKey::from_entry(entry);

        self.aggregations
            .entry(key)
            .and_modify(|agg| {
                agg.total_liters += entry.liters;
                agg.entry_count += 1;
            })
            .or_insert_with(|| DailyConsumption {
                key,
                total_liters: entry.liters,
                entry_count: 1,
            });

        debug!(liters = %entry.liters, "recorded consumption");
        Ok(())
    }

    /// Undo a previously recorded entry; returns false if nothing matched
    pub fn remove(&self, entry: &ConsumptionEntry) -> bool {
        let key = DailyKey::from_entry(entry);
        let Some(mut agg) = self.aggregations.get_mut(&key) else {
            return false;
        };

        agg.total_liters = (agg.total_liters - entry.liters).max(Decimal::ZERO);
        agg.entry_count = agg.entry_count.saturating_sub(1);
        drop(agg);

        // A concurrent record may have refilled the bucket since the guard dropped
        self.aggregations.remove_if(&key, |_, agg| agg.entry_count == 0);
        true
    }

    /// Drop everything logged on `date`; returns the number of buckets removed
    pub fn reset_day(&self, date: NaiveDate) -> usize {
        let mut removed = 0usize;
        self.aggregations.retain(|key, _| {
            if key.date == date {
                removed += 1;
                false
            } else {
                true
            }
        });
        info!(%date, removed, "reset day");
        removed
    }

    pub fn get_aggregation(&self, key: &DailyKey) -> Option<DailyConsumption> {
        self.aggregations.get(key).map(|r| r.clone())
    }

    /// Total litres logged on `date`, bills excluded
    pub fn day_total(&self, date: NaiveDate) -> Decimal {
        self.aggregations
            .iter()
            .filter(|entry| entry.key().date == date && !entry.key().activity.is_bill())
            .map(|entry| entry.value().total_liters)
            .sum()
    }

    pub fn day_status(&self, date: NaiveDate, daily_target_liters: Decimal) -> DayStatus {
        let total_liters = self.day_total(date);
        DayStatus {
            date,
            total_liters,
            daily_target_liters,
            exceeded: total_liters > daily_target_liters,
        }
    }

    /// Bucketed totals for `start..=end`; days with no entries count as zero
    #[instrument(skip(self))]
    pub fn trend(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        period: TrendPeriod,
        daily_target_liters: Decimal,
    ) -> ConsumptionTrend {
        let per_day = self.totals_by_day(start, end);
        let mut points: Vec<TrendPoint> = Vec::new();

        for day in start.iter_days().take_while(|day| *day <= end) {
            let liters = per_day.get(&day).copied().unwrap_or(Decimal::ZERO);
            let bucket = period.bucket_label(day);

            match points.last_mut() {
                Some(point) if point.label == bucket => {
                    point.liters += liters;
                    continue;
                }
                _ => {}
            }
            points.push(TrendPoint {
                label: bucket,
                liters,
            });
        }

        ConsumptionTrend {
            period,
            points,
            target_liters: daily_target_liters
                .checked_mul(period.target_multiplier())
                .unwrap_or(Decimal::MAX),
        }
    }

    /// Litres per activity for `start..=end`, largest first; bills excluded
    pub fn category_breakdown(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<(ActivityType, Decimal)> {
        let mut totals: HashMap<ActivityType, Decimal> = HashMap::new();
        for entry in self.aggregations.iter() {
            let key = entry.key();
            if key.date >= start && key.date <= end && !key.activity.is_bill() {
                *totals.entry(key.activity).or_default() += entry.value().total_liters;
            }
        }

        let mut breakdown: Vec<_> = totals.into_iter().collect();
        breakdown.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
        breakdown
    }

    /// Compare the last week and the current month with the periods before
    #[instrument(skip(self))]
    pub fn summary(&self, today: NaiveDate) -> ConsumptionSummary {
        let week_ago = today - Duration::days(7);
        let two_weeks_ago = today - Duration::days(14);
        let month_start = today.with_day(1).unwrap_or(today);
        let last_month_end = month_start - Duration::days(1);
        let last_month_start = last_month_end.with_day(1).unwrap_or(last_month_end);

        let range_total = |from: NaiveDate, to: NaiveDate| -> Decimal {
            self.totals_by_day(from, to).values().copied().sum()
        };

        let recent_week_liters = range_total(week_ago + Duration::days(1), today);
        let previous_week_liters = range_total(two_weeks_ago + Duration::days(1), week_ago);
        let this_month_liters = range_total(month_start, today);
        let last_month_liters = range_total(last_month_start, last_month_end);

        let this_month_daily_avg = this_month_liters / Decimal::from(today.day());
        let last_month_daily_avg = last_month_liters / Decimal::from(last_month_end.day());
        let month_change_pct = if today.day() > 10 {
            change_pct(this_month_daily_avg, last_month_daily_avg)
        } else {
            None
        };

        let top_activity = self
            .category_breakdown(NaiveDate::MIN, NaiveDate::MAX)
            .into_iter()
            .next();

        debug!(%recent_week_liters, %previous_week_liters, "built consumption summary");

        ConsumptionSummary {
            today,
            recent_week_liters,
            previous_week_liters,
            week_change_pct: change_pct(recent_week_liters, previous_week_liters),
            this_month_daily_avg,
            last_month_daily_avg,
            month_change_pct,
            top_activity,
        }
    }

    /// Most recent bills, newest first
    ///
    /// Bills logged on the same day share a bucket and come back merged.
    pub fn bill_history(&self, limit: usize) -> Vec<BillRecord> {
        let mut bills: Vec<BillRecord> = self
            .aggregations
            .iter()
            .filter(|entry| entry.key().activity.is_bill())
            .map(|entry| {
                let liters = entry.value().total_liters;
                BillRecord {
                    date: entry.key().date,
                    liters,
                    amount_m3: round_money(liters / LITERS_PER_M3),
                }
            })
            .collect();

        bills.sort_by(|a, b| b.date.cmp(&a.date));
        bills.truncate(limit);
        bills
    }

    /// Clear all aggregations
    pub fn clear(&self) {
        self.aggregations.clear();
    }

    fn totals_by_day(&self, start: NaiveDate, end: NaiveDate) -> HashMap<NaiveDate, Decimal> {
        let mut totals: HashMap<NaiveDate, Decimal> = HashMap::new();
        for entry in self.aggregations.iter() {
            let key = entry.key();
            if key.date >= start && key.date <= end && !key.activity.is_bill() {
                *totals.entry(key.date).or_default() += entry.value().total_liters;
            }
        }
        totals
    }
}
