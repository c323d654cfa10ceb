//! Bill-total to usage inversion
//!
//! Bisects usage over `[0, search_upper_m3]` for a fixed number of
//! iterations, evaluating the tariff calculator at each midpoint and
//! stopping early once the midpoint's total is within `tolerance` of the
//! target.
//!
//! The search assumes the total grows with usage. That holds from 15 m³
//! upwards; below that each allowance block lowers the total slightly, so
//! a target under roughly 700 TL (residential, default rates) can have
//! more than one matching usage and the solver returns whichever one the
//! bisection path reaches first.

use crate::billing::TariffCalculator;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use waterwise_common::{round_money, CustomerCategory, TariffError, LITERS_PER_M3, MAX_USAGE_M3};

/// Bisection settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Upper end of the usage search range (m³)
    pub search_upper_m3: Decimal,
    /// Number of halvings; the loop never runs longer than this
    pub iterations: u32,
    /// Accepted absolute gap between computed and target total
    pub tolerance: Decimal,
    /// Report zero usage instead of the last midpoint when nothing lands
    /// within tolerance
    pub zero_on_miss: bool,
}

impl SolverConfig {
    pub const DEFAULT_SEARCH_UPPER_M3: Decimal = dec!(500);
    pub const DEFAULT_ITERATIONS: u32 = 50;
    pub const DEFAULT_TOLERANCE: Decimal = dec!(0.5);

    /// Settings that report zero usage on a miss (legacy behaviour)
    pub fn legacy() -> Self {
        Self {
            zero_on_miss: true,
            ..Self::default()
        }
    }

    pub fn with_search_upper(mut self, upper_m3: Decimal) -> Self {
        self.search_upper_m3 = upper_m3;
        self
    }

    pub fn validate(&self) -> Result<(), TariffError> {
        if self.search_upper_m3 <= Decimal::ZERO || self.search_upper_m3 > MAX_USAGE_M3 {
            return Err(TariffError::InvalidSearchRange {
                upper: self.search_upper_m3,
            });
        }
        if self.iterations == 0 {
            return Err(TariffError::invalid("iterations", "must be at least 1"));
        }
        if self.tolerance < Decimal::ZERO {
            return Err(TariffError::invalid("tolerance", "cannot be negative"));
        }
        Ok(())
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            search_upper_m3: Self::DEFAULT_SEARCH_UPPER_M3,
            iterations: Self::DEFAULT_ITERATIONS,
            tolerance: Self::DEFAULT_TOLERANCE,
            zero_on_miss: false,
        }
    }
}

/// How far an estimate can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// A midpoint's total landed within tolerance of the target
    Converged,
    /// Iterations ran out first; the usage is a best effort (or zero)
    LowConfidence,
}

/// Result of inverting a bill total
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEstimate {
    /// Target total after clamping
    pub target_price: Decimal,
    /// Estimated usage, rounded to 2 decimals (m³)
    pub usage_m3: Decimal,
    /// Bill total at the unrounded estimate
    pub matched_total: Decimal,
    /// Midpoints evaluated
    pub iterations: u32,
    pub confidence: Confidence,
}

impl UsageEstimate {
    pub fn is_converged(&self) -> bool {
        self.confidence == Confidence::Converged
    }

    /// Estimated usage in litres
    pub fn liters(&self) -> Decimal {
        self.usage_m3 * LITERS_PER_M3
    }

    /// Fail with [`TariffError::NoConvergence`] unless the estimate converged
    pub fn require_converged(self) -> Result<Self, TariffError> {
        if self.is_converged() {
            Ok(self)
        } else {
            Err(TariffError::NoConvergence {
                target: self.target_price,
                best_usage: self.usage_m3,
                iterations: self.iterations,
            })
        }
    }
}

/// Inverts the tariff calculator by bisection
#[derive(Debug, Clone, Copy)]
pub struct UsageSolver {
    calculator: TariffCalculator,
    config: SolverConfig,
}

impl UsageSolver {
    /// Create a solver; fails if the settings are unusable
    pub fn new(calculator: TariffCalculator, config: SolverConfig) -> Result<Self, TariffError> {
        config.validate()?;
        Ok(Self { calculator, config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Estimate the usage whose bill total matches `target_price`
    ///
    /// A negative target is clamped to zero.
    #[instrument(skip(self), fields(upper = %self.config.search_upper_m3))]
    pub fn solve(&self, target_price: Decimal, category: &CustomerCategory) -> UsageEstimate {
        let target = if target_price < Decimal::ZERO {
            warn!(%target_price, "negative target price clamped to zero");
            Decimal::ZERO
        } else {
            target_price
        };

        let mut low = Decimal::ZERO;
        let mut high = self.config.search_upper_m3;
        let mut mid = Decimal::ZERO;
        let mut mid_total = Decimal::ZERO;

        for iteration in 1..=self.config.iterations {
            mid = (low + high) / Decimal::TWO;
            mid_total = self.calculator.compute_bill(mid, category).total;

            if (mid_total - target).abs() < self.config.tolerance {
                debug!(iteration, %mid, %mid_total, "usage estimate converged");
                return UsageEstimate {
                    target_price: target,
                    usage_m3: round_money(mid),
                    matched_total: mid_total,
                    iterations: iteration,
                    confidence: Confidence::Converged,
                };
            }

            if mid_total < target {
                low = mid;
            } else {
                high = mid;
            }
        }

        warn!(
            %target,
            last_mid = %mid,
            %mid_total,
            zero_on_miss = self.config.zero_on_miss,
            "usage estimate did not converge"
        );

        if self.config.zero_on_miss {
            UsageEstimate {
                target_price: target,
                usage_m3: Decimal::ZERO,
                matched_total: self.calculator.compute_bill(Decimal::ZERO, category).total,
                iterations: self.config.iterations,
                confidence: Confidence::LowConfidence,
            }
        } else {
            UsageEstimate {
                target_price: target,
                usage_m3: round_money(mid),
                matched_total: mid_total,
                iterations: self.config.iterations,
                confidence: Confidence::LowConfidence,
            }
        }
    }
}

impl Default for UsageSolver {
    fn default() -> Self {
        Self {
            calculator: TariffCalculator::default(),
            config: SolverConfig::default(),
        }
    }
}

/// Usage (m³, 2 decimals) for a bill total under the default schedule
///
/// Legacy contract: returns zero when the search misses.
pub fn solve_usage_from_price(target_price: Decimal, category: &CustomerCategory) -> Decimal {
    let solver = UsageSolver {
        calculator: TariffCalculator::default(),
        config: SolverConfig::legacy(),
    };
    solver.solve(target_price, category).usage_m3
}
