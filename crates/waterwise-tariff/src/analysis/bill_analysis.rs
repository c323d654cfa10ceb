//! Bill analysis
//!
//! Turns a usage figure recovered from a bill (a solved price, a printed
//! daily average, or a meter reading) into a daily-average consumption and
//! compares it with the user's daily target.

use crate::solver::{Confidence, UsageSolver};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use waterwise_common::{
    clamp_usage, round_money, CustomerCategory, BILLING_PERIOD_DAYS, DEFAULT_DAILY_TARGET_LITERS,
    LITERS_PER_M3,
};

/// Daily average above `target * DANGER_FACTOR` is flagged as danger
pub const DANGER_FACTOR: Decimal = dec!(1.5);

/// Where the bill's usage figure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UsageSource {
    /// Usage solved from the bill total
    PriceEstimate { price: Decimal },
    /// Daily average printed on the bill (m³/day)
    DailyAverage { daily_m3: Decimal },
    /// Usage read directly (m³)
    Metered { usage_m3: Decimal },
}

/// Daily consumption against target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionStatus {
    Danger,
    Warning,
    Success,
}

impl ConsumptionStatus {
    pub fn classify(daily_avg_liters: Decimal, target_liters: Decimal) -> Self {
        let danger_above = target_liters
            .checked_mul(DANGER_FACTOR)
            .unwrap_or(Decimal::MAX);
        if daily_avg_liters > danger_above {
            ConsumptionStatus::Danger
        } else if daily_avg_liters > target_liters {
            ConsumptionStatus::Warning
        } else {
            ConsumptionStatus::Success
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ConsumptionStatus::Danger => "High Consumption",
            ConsumptionStatus::Warning => "Target Exceeded",
            ConsumptionStatus::Success => "Ideal Consumption",
        }
    }
}

/// Outcome of analysing one bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillAnalysis {
    pub source: UsageSource,
    pub usage_m3: Decimal,
    pub liters_total: Decimal,
    pub daily_avg_liters: Decimal,
    pub daily_target_liters: Decimal,
    /// Daily average as a percentage of target
    pub usage_ratio_pct: f64,
    pub status: ConsumptionStatus,
    pub estimated_from_price: bool,
    /// Solver confidence, for price-derived usage only
    pub confidence: Option<Confidence>,
}

impl BillAnalysis {
    /// One-paragraph advice for the user
    pub fn advice(&self) -> String {
        let daily = self.daily_avg_liters.round();
        let ratio = self.usage_ratio_pct.round();
        let mut text = match self.status {
            ConsumptionStatus::Danger => format!(
                "Daily average ({} L) is far above your target ({}%). Consider saving measures.",
                daily, ratio
            ),
            ConsumptionStatus::Warning => format!(
                "Daily average ({} L) exceeds your target ({}%). More careful use may be needed.",
                daily, ratio
            ),
            ConsumptionStatus::Success => format!(
                "Daily consumption ({} L) is within your target ({}%). Thanks for using water efficiently.",
                daily, ratio
            ),
        };
        if self.estimated_from_price {
            text.push_str(" Estimated from the bill total; the actual meter reading may differ.");
        }
        text
    }
}

/// Analyses bills over a fixed billing period
#[derive(Debug, Clone, Copy)]
pub struct BillAnalyzer {
    solver: UsageSolver,
    period_days: u32,
}

impl BillAnalyzer {
    pub fn new(solver: UsageSolver, period_days: u32) -> Self {
        Self {
            solver,
            period_days: period_days.max(1),
        }
    }

    /// Analyse a bill; `None` when no usage could be recovered
    ///
    /// A non-positive target falls back to the default daily target.
    #[instrument(skip(self))]
    pub fn analyze(
        &self,
        source: UsageSource,
        category: &CustomerCategory,
        daily_target_liters: Decimal,
    ) -> Option<BillAnalysis> {
        let (usage_m3, confidence) = match source {
            UsageSource::PriceEstimate { price } => {
                let estimate = self.solver.solve(price, category);
                (estimate.usage_m3, Some(estimate.confidence))
            }
            UsageSource::DailyAverage { daily_m3 } => {
                let period_m3 = clamp_usage(daily_m3) * Decimal::from(self.period_days);
                (round_money(clamp_usage(period_m3)), None)
            }
            UsageSource::Metered { usage_m3 } => (clamp_usage(usage_m3), None),
        };

        if usage_m3 <= Decimal::ZERO {
            debug!(?source, "no usage recovered from bill");
            return None;
        }

        let target = if daily_target_liters > Decimal::ZERO {
            daily_target_liters
        } else {
            DEFAULT_DAILY_TARGET_LITERS
        };

        let liters_total = usage_m3 * LITERS_PER_M3;
        let daily_avg_liters = liters_total / Decimal::from(self.period_days);
        let usage_ratio_pct = match (daily_avg_liters.to_f64(), target.to_f64()) {
            (Some(daily), Some(target)) => daily / target * 100.0,
            _ => 0.0,
        };
        let status = ConsumptionStatus::classify(daily_avg_liters, target);

        info!(%usage_m3, %daily_avg_liters, ?status, "bill analysed");

        Some(BillAnalysis {
            source,
            usage_m3,
            liters_total,
            daily_avg_liters,
            daily_target_liters: target,
            usage_ratio_pct,
            status,
            estimated_from_price: matches!(source, UsageSource::PriceEstimate { .. }),
            confidence,
        })
    }
}

impl Default for BillAnalyzer {
    fn default() -> Self {
        Self::new(UsageSolver::default(), BILLING_PERIOD_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waterwise_common::MAX_USAGE_M3;

    fn analyze(source: UsageSource, target: Decimal) -> Option<BillAnalysis> {
        BillAnalyzer::default().analyze(source, &CustomerCategory::Residential, target)
    }

    #[test]
    fn test_price_derived_analysis() {
        let analysis = analyze(
            UsageSource::PriceEstimate {
                price: dec!(715.00),
            },
            dec!(150),
        )
        .unwrap();

        assert_eq!(analysis.usage_m3, dec!(15.47));
        assert_eq!(analysis.liters_total, dec!(15470));
        // 15470 / 30 = 515.67 L/day, ~344% of 150
        assert!((analysis.daily_avg_liters - dec!(515.67)).abs() < dec!(0.01));
        assert_eq!(analysis.status, ConsumptionStatus::Danger);
        assert!(analysis.estimated_from_price);
        assert_eq!(analysis.confidence, Some(Confidence::Converged));
        assert!((analysis.usage_ratio_pct - 343.78).abs() < 0.01);
        assert!(analysis.advice().contains("Estimated from the bill total"));
    }

    #[test]
    fn test_daily_average_source() {
        let analysis = analyze(
            UsageSource::DailyAverage {
                daily_m3: dec!(0.16),
            },
            dec!(150),
        )
        .unwrap();

        // 0.16 * 30 = 4.8 m3 -> 160 L/day
        assert_eq!(analysis.usage_m3, dec!(4.80));
        assert_eq!(analysis.daily_avg_liters, dec!(160));
        assert_eq!(analysis.status, ConsumptionStatus::Warning);
        assert!(!analysis.estimated_from_price);
        assert!(analysis.confidence.is_none());
    }

    #[test]
    fn test_within_target() {
        let analysis = analyze(UsageSource::Metered { usage_m3: dec!(3) }, dec!(150)).unwrap();
        assert_eq!(analysis.daily_avg_liters, dec!(100));
        assert_eq!(analysis.status, ConsumptionStatus::Success);
        assert_eq!(analysis.status.title(), "Ideal Consumption");
    }

    #[test]
    fn test_danger_threshold_is_exclusive() {
        // Exactly 1.5x target is still only a warning
        assert_eq!(
            ConsumptionStatus::classify(dec!(225), dec!(150)),
            ConsumptionStatus::Warning
        );
        assert_eq!(
            ConsumptionStatus::classify(dec!(225.01), dec!(150)),
            ConsumptionStatus::Danger
        );
        assert_eq!(
            ConsumptionStatus::classify(dec!(150), dec!(150)),
            ConsumptionStatus::Success
        );
    }

    #[test]
    fn test_non_positive_target_uses_default() {
        let analysis = analyze(UsageSource::Metered { usage_m3: dec!(3) }, Decimal::ZERO).unwrap();
        assert_eq!(analysis.daily_target_liters, dec!(150));
    }

    #[test]
    fn test_nothing_recovered() {
        assert!(analyze(UsageSource::Metered { usage_m3: Decimal::ZERO }, dec!(150)).is_none());
        assert!(analyze(
            UsageSource::DailyAverage {
                daily_m3: Decimal::ZERO
            },
            dec!(150)
        )
        .is_none());
    }

    #[test]
    fn test_extreme_inputs_stay_bounded() {
        let metered = analyze(UsageSource::Metered { usage_m3: Decimal::MAX }, dec!(150)).unwrap();
        assert_eq!(metered.usage_m3, MAX_USAGE_M3);
        assert_eq!(metered.status, ConsumptionStatus::Danger);

        let daily = analyze(UsageSource::DailyAverage { daily_m3: Decimal::MAX }, dec!(150)).unwrap();
        assert_eq!(daily.usage_m3, MAX_USAGE_M3);

        let huge_target = analyze(UsageSource::Metered { usage_m3: dec!(3) }, Decimal::MAX).unwrap();
        assert_eq!(huge_target.status, ConsumptionStatus::Success);

        let tiny_target =
            analyze(UsageSource::Metered { usage_m3: dec!(3) }, Decimal::new(1, 28)).unwrap();
        assert_eq!(tiny_target.status, ConsumptionStatus::Danger);
        assert!(tiny_target.usage_ratio_pct > 1e20);
    }

    #[test]
    fn test_usage_source_wire_format() {
        let source: UsageSource =
            serde_json::from_str(r#"{"kind":"daily_average","daily_m3":"0.16"}"#).unwrap();
        assert_eq!(
            source,
            UsageSource::DailyAverage {
                daily_m3: dec!(0.16)
            }
        );

        let json = serde_json::to_value(ConsumptionStatus::Danger).unwrap();
        assert_eq!(json, serde_json::json!("danger"));
    }

    #[test]
    fn test_legacy_solver_miss_yields_no_analysis() {
        let solver = UsageSolver::new(
            crate::billing::TariffCalculator::default(),
            crate::solver::SolverConfig::legacy(),
        )
        .unwrap();
        let analyzer = BillAnalyzer::new(solver, BILLING_PERIOD_DAYS);

        let analysis = analyzer.analyze(
            UsageSource::PriceEstimate {
                price: dec!(1000000),
            },
            &CustomerCategory::Residential,
            dec!(150),
        );
        assert!(analysis.is_none());
    }
}
