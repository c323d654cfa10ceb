//! Bill Result - itemized output of the tariff calculator

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Itemized water bill
///
/// Monetary fields are rounded to 2 decimal places; totals are computed from
/// unrounded components, so `total` may differ from the sum of the rounded
/// items by a cent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillResult {
    /// Consumption the bill was computed for (m³)
    pub usage_m3: Decimal,
    /// Humanitarian allowance (m³)
    pub deduction_m3: Decimal,
    /// Usage minus allowance, floored at zero (m³)
    pub billed_m3: Decimal,
    /// Water charge after category discount
    pub water_cost: Decimal,
    /// Wastewater charge after category discount
    pub waste_cost: Decimal,
    /// Environmental levy (ÇTV)
    #[serde(rename = "ctv")]
    pub levy: Decimal,
    /// Value-added tax (KDV)
    #[serde(rename = "kdv")]
    pub vat: Decimal,
    /// Grand total
    pub total: Decimal,
    pub currency: String,
}

impl BillResult {
    /// Bill for zero consumption
    pub fn zero() -> Self {
        Self {
            usage_m3: Decimal::ZERO,
            deduction_m3: Decimal::ZERO,
            billed_m3: Decimal::ZERO,
            water_cost: Decimal::ZERO,
            waste_cost: Decimal::ZERO,
            levy: Decimal::ZERO,
            vat: Decimal::ZERO,
            total: Decimal::ZERO,
            currency: crate::CURRENCY.to_string(),
        }
    }

    /// Water + wastewater charge (pre-tax)
    pub fn subtotal(&self) -> Decimal {
        self.water_cost + self.waste_cost
    }

    /// Average price paid per consumed m³
    pub fn effective_rate(&self) -> Option<Decimal> {
        if self.usage_m3 > Decimal::ZERO {
            Some(self.total / self.usage_m3)
        } else {
            None
        }
    }
}
