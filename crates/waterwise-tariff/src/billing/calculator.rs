//! Progressive tariff calculator
//!
//! Bills consumption across ordered bands, deducts the humanitarian
//! allowance from the first band, applies the category discount, and then
//! adds the environmental levy and VAT.
//!
//! For a fixed schedule and category the total only rises within a
//! deduction block; each full 2.5 m³ below 15 m³ earns another 0.5 m³ of
//! allowance, so the total steps down at those boundaries. From 15 m³
//! upwards the allowance is constant and the total is non-decreasing as
//! long as the tier prices are.

use rust_decimal::Decimal;
use tracing::{instrument, warn};
use waterwise_common::{
    clamp_usage, round_money, BillResult, CustomerCategory, RateOverrides, RateSchedule, CURRENCY,
    DEDUCTION_BLOCK_M3, DEDUCTION_PER_BLOCK_M3, DEDUCTION_WINDOW_M3, TIER_BAND_M3,
};

/// One consumption band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierBand {
    /// Cumulative usage at which the band is full (`None` = open-ended)
    pub upper_m3: Option<Decimal>,
    pub water_rate: Decimal,
    pub waste_rate: Decimal,
}

/// Ordered bands for a schedule: 0-15, 15-30, 30+
pub fn tier_bands(rates: &RateSchedule) -> [TierBand; 3] {
    [
        TierBand {
            upper_m3: Some(TIER_BAND_M3),
            water_rate: rates.water_tier1,
            waste_rate: rates.waste_tier1,
        },
        TierBand {
            upper_m3: Some(TIER_BAND_M3 + TIER_BAND_M3),
            water_rate: rates.water_tier2,
            waste_rate: rates.waste_tier2,
        },
        TierBand {
            upper_m3: None,
            water_rate: rates.water_tier3,
            waste_rate: rates.waste_tier3,
        },
    ]
}

/// Humanitarian allowance: 0.5 m³ per full 2.5 m³ within the first 15 m³
pub fn deduction_m3(usage_m3: Decimal) -> Decimal {
    let eligible = usage_m3.max(Decimal::ZERO).min(DEDUCTION_WINDOW_M3);
    (eligible / DEDUCTION_BLOCK_M3).floor() * DEDUCTION_PER_BLOCK_M3
}

/// Tariff calculator bound to one rate schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TariffCalculator {
    rates: RateSchedule,
}

impl TariffCalculator {
    pub fn new(rates: RateSchedule) -> Self {
        Self { rates }
    }

    /// Calculator with overrides merged over this one's schedule
    pub fn with_overrides(&self, overrides: &RateOverrides) -> Self {
        Self::new(self.rates.merged(overrides))
    }

    pub fn rates(&self) -> &RateSchedule {
        &self.rates
    }

    /// Compute the itemized bill for `usage_m3`
    ///
    /// Usage is clamped into `[0, MAX_USAGE_M3]`.
    #[instrument(level = "trace", skip(self))]
    pub fn compute_bill(&self, usage_m3: Decimal, category: &CustomerCategory) -> BillResult {
        let usage = clamp_usage(usage_m3);
        if usage != usage_m3 {
            warn!(%usage_m3, %usage, "usage clamped to billable range");
        }

        let deduction = deduction_m3(usage);

        let mut water_cost = Decimal::ZERO;
        let mut waste_cost = Decimal::ZERO;
        let mut lower = Decimal::ZERO;

        for (index, band) in tier_bands(&self.rates).iter().enumerate() {
            let filled = match band.upper_m3 {
                Some(upper) => usage.min(upper),
                None => usage,
            } - lower;

            // Allowance only reduces the first band's chargeable quantity
            let quantity = if index == 0 {
                (filled - deduction).max(Decimal::ZERO)
            } else {
                filled.max(Decimal::ZERO)
            };

            water_cost += quantity * band.water_rate;
            waste_cost += quantity * band.waste_rate;

            match band.upper_m3 {
                Some(upper) => lower = upper,
                None => break,
            }
        }

        let keep = Decimal::ONE - category.discount_rate();
        water_cost *= keep;
        waste_cost *= keep;

        let billed_m3 = (usage - deduction).max(Decimal::ZERO);
        let levy = billed_m3 * self.rates.environmental_levy_rate;
        let vat = (water_cost + waste_cost) * self.rates.vat_rate;
        let total = water_cost + waste_cost + levy + vat;

        BillResult {
            usage_m3: usage,
            deduction_m3: deduction,
            billed_m3,
            water_cost: round_money(water_cost),
            waste_cost: round_money(waste_cost),
            levy: round_money(levy),
            vat: round_money(vat),
            total: round_money(total),
            currency: CURRENCY.to_string(),
        }
    }
}

/// Compute a bill against the default schedule, with optional overrides
pub fn compute_bill(
    usage_m3: Decimal,
    category: &CustomerCategory,
    overrides: Option<&RateOverrides>,
) -> BillResult {
    let rates = match overrides {
        Some(overrides) => RateSchedule::default().merged(overrides),
        None => RateSchedule::default(),
    };
    TariffCalculator::new(rates).compute_bill(usage_m3, category)
}
