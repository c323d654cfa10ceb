//! # WaterWise Tariff
//!
//! Progressive water tariff, usage recovery from bill totals, and
//! consumption metering.
//!
//! ## Bill Formula
//!
//! ```text
//! allowance = floor(min(usage, 15) / 2.5) * 0.5
//! water     = Σ band_quantity × water_rate   (band 1 reduced by allowance)
//! waste     = Σ band_quantity × waste_rate
//! levy      = (usage - allowance) × ctv_rate
//! vat       = (water + waste) × kdv_rate
//! total     = water + waste + levy + vat
//! ```
//!
//! Students, disabled subscribers and martyr families pay half of water
//! and waste (before VAT). The usage solver inverts `total` by bisection.

pub mod analysis;
pub mod billing;
pub mod metering;
pub mod solver;

use analysis::{BillAnalysis, BillAnalyzer, UsageSource};
use billing::TariffCalculator;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solver::{SolverConfig, UsageEstimate, UsageSolver};
use tracing::instrument;
use waterwise_common::{
    BillResult, CustomerCategory, RateOverrides, RateSchedule, Result, TariffError,
    BILLING_PERIOD_DAYS, DEFAULT_DAILY_TARGET_LITERS,
};

/// Tariff configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffConfig {
    /// Schedule used when a call carries no overrides
    pub rates: RateSchedule,
    /// Bisection settings
    pub solver: SolverConfig,
    /// Daily consumption target in litres
    pub daily_target_liters: Decimal,
    /// Days covered by one bill
    pub billing_period_days: u32,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            rates: RateSchedule::default(),
            solver: SolverConfig::default(),
            daily_target_liters: DEFAULT_DAILY_TARGET_LITERS,
            billing_period_days: BILLING_PERIOD_DAYS,
        }
    }
}

/// Tariff service
#[derive(Debug, Clone)]
pub struct Tariff {
    config: TariffConfig,
    calculator: TariffCalculator,
    analyzer: BillAnalyzer,
    solver: UsageSolver,
}

impl Tariff {
    pub fn new(config: TariffConfig) -> Result<Self> {
        if config.billing_period_days == 0 {
            return Err(
                TariffError::invalid("billing_period_days", "must be at least one day").into(),
            );
        }
        let calculator = TariffCalculator::new(config.rates);
        let solver = UsageSolver::new(calculator, config.solver)?;
        let analyzer = BillAnalyzer::new(solver, config.billing_period_days);

        Ok(Self {
            config,
            calculator,
            analyzer,
            solver,
        })
    }

    pub fn config(&self) -> &TariffConfig {
        &self.config
    }

    /// Itemized bill for `usage_m3`, optionally with rate overrides
    #[instrument(skip(self, overrides))]
    pub fn compute_bill(
        &self,
        usage_m3: Decimal,
        category: &CustomerCategory,
        overrides: Option<&RateOverrides>,
    ) -> BillResult {
        match overrides {
            Some(overrides) if !overrides.is_empty() => self
                .calculator
                .with_overrides(overrides)
                .compute_bill(usage_m3, category),
            _ => self.calculator.compute_bill(usage_m3, category),
        }
    }

    /// Usage whose bill total matches `price`
    pub fn estimate_usage(&self, price: Decimal, category: &CustomerCategory) -> UsageEstimate {
        self.solver.solve(price, category)
    }

    /// Analyse a bill against a daily target (configured target when `None`)
    pub fn analyze_bill(
        &self,
        source: UsageSource,
        category: &CustomerCategory,
        daily_target_liters: Option<Decimal>,
    ) -> Option<BillAnalysis> {
        let target = daily_target_liters.unwrap_or(self.config.daily_target_liters);
        self.analyzer.analyze(source, category, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use waterwise_common::{RateKey, TariffError, WaterwiseError};

    #[test]
    fn test_default_tariff() {
        let tariff = Tariff::new(TariffConfig::default()).unwrap();
        let bill = tariff.compute_bill(dec!(10), &CustomerCategory::Residential, None);
        assert_eq!(bill.total, dec!(449.44));

        let estimate = tariff.estimate_usage(dec!(715), &CustomerCategory::Residential);
        assert_eq!(estimate.usage_m3, dec!(15.47));
    }

    #[test]
    fn test_injected_schedule() {
        let config = TariffConfig {
            rates: RateSchedule {
                vat_rate: Decimal::ZERO,
                environmental_levy_rate: Decimal::ZERO,
                ..RateSchedule::default()
            },
            ..TariffConfig::default()
        };
        let tariff = Tariff::new(config).unwrap();
        let bill = tariff.compute_bill(dec!(10), &CustomerCategory::Residential, None);

        assert_eq!(bill.vat, Decimal::ZERO);
        assert_eq!(bill.total, dec!(416.04));
    }

    #[test]
    fn test_overrides_apply_per_call() {
        let tariff = Tariff::new(TariffConfig::default()).unwrap();
        let overrides = RateOverrides::new().with(RateKey::Vat, dec!(0.20)).unwrap();

        let with = tariff.compute_bill(dec!(10), &CustomerCategory::Residential, Some(&overrides));
        let without = tariff.compute_bill(dec!(10), &CustomerCategory::Residential, None);

        assert_eq!(with.vat, dec!(83.21));
        assert_eq!(without.vat, dec!(33.28));
    }

    #[test]
    fn test_configured_target_used_by_default() {
        let config = TariffConfig {
            daily_target_liters: dec!(600),
            ..TariffConfig::default()
        };
        let tariff = Tariff::new(config).unwrap();
        let source = UsageSource::PriceEstimate { price: dec!(715) };

        let analysis = tariff
            .analyze_bill(source, &CustomerCategory::Residential, None)
            .unwrap();
        assert_eq!(analysis.daily_target_liters, dec!(600));
        assert_eq!(analysis.status, analysis::ConsumptionStatus::Success);

        let analysis = tariff
            .analyze_bill(source, &CustomerCategory::Residential, Some(dec!(150)))
            .unwrap();
        assert_eq!(analysis.status, analysis::ConsumptionStatus::Danger);
    }

    #[test]
    fn test_invalid_solver_config_rejected() {
        let config = TariffConfig {
            solver: SolverConfig {
                iterations: 0,
                ..SolverConfig::default()
            },
            ..TariffConfig::default()
        };
        assert!(matches!(
            Tariff::new(config),
            Err(WaterwiseError::Tariff(TariffError::InvalidInput { .. }))
        ));
    }

    #[test]
    fn test_zero_billing_period_rejected() {
        let config = TariffConfig {
            billing_period_days: 0,
            ..TariffConfig::default()
        };
        assert!(matches!(
            Tariff::new(config),
            Err(WaterwiseError::Tariff(TariffError::InvalidInput { .. }))
        ));
    }
}
