//! Rate Schedule - per-m³ prices for the three consumption bands
//!
//! ```text
//! Band 1:  0-15 m³   water_tier1 + waste_tier1
//! Band 2: 15-30 m³   water_tier2 + waste_tier2
//! Band 3:   30+ m³   water_tier3 + waste_tier3
//! ```
//!
//! The environmental levy (ÇTV) is charged per billed m³ and the VAT (KDV)
//! applies to the water + wastewater subtotal only.

use crate::error::TariffError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Immutable set of tariff rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSchedule {
    pub water_tier1: Decimal,
    pub water_tier2: Decimal,
    pub water_tier3: Decimal,
    pub waste_tier1: Decimal,
    pub waste_tier2: Decimal,
    pub waste_tier3: Decimal,
    /// Levy per billed m³
    #[serde(alias = "ctv_rate")]
    pub environmental_levy_rate: Decimal,
    /// Fractional tax on the water + wastewater subtotal
    #[serde(alias = "kdv_rate")]
    pub vat_rate: Decimal,
}

impl RateSchedule {
    /// ISKI 2025 residential tariff
    pub const ISKI_2025: RateSchedule = RateSchedule {
        water_tier1: dec!(34.67),
        water_tier2: dec!(52.83),
        water_tier3: dec!(76.41),
        waste_tier1: dec!(17.335),
        waste_tier2: dec!(26.415),
        waste_tier3: dec!(38.205),
        environmental_levy_rate: dec!(0.015),
        vat_rate: dec!(0.08),
    };

    /// Read a single rate by key
    pub fn get(&self, key: RateKey) -> Decimal {
        match key {
            RateKey::WaterTier1 => self.water_tier1,
            RateKey::WaterTier2 => self.water_tier2,
            RateKey::WaterTier3 => self.water_tier3,
            RateKey::WasteTier1 => self.waste_tier1,
            RateKey::WasteTier2 => self.waste_tier2,
            RateKey::WasteTier3 => self.waste_tier3,
            RateKey::EnvironmentalLevy => self.environmental_levy_rate,
            RateKey::Vat => self.vat_rate,
        }
    }

    fn slot(&mut self, key: RateKey) -> &mut Decimal {
        match key {
            RateKey::WaterTier1 => &mut self.water_tier1,
            RateKey::WaterTier2 => &mut self.water_tier2,
            RateKey::WaterTier3 => &mut self.water_tier3,
            RateKey::WasteTier1 => &mut self.waste_tier1,
            RateKey::WasteTier2 => &mut self.waste_tier2,
            RateKey::WasteTier3 => &mut self.waste_tier3,
            RateKey::EnvironmentalLevy => &mut self.environmental_levy_rate,
            RateKey::Vat => &mut self.vat_rate,
        }
    }

    /// Return a copy with the given overrides applied
    pub fn merged(&self, overrides: &RateOverrides) -> RateSchedule {
        let mut merged = *self;
        for (key, value) in overrides.iter() {
            *merged.slot(key) = value;
        }
        merged
    }

    /// Whether tier prices never decrease from band to band
    pub fn is_progressive(&self) -> bool {
        self.water_tier1 <= self.water_tier2
            && self.water_tier2 <= self.water_tier3
            && self.waste_tier1 <= self.waste_tier2
            && self.waste_tier2 <= self.waste_tier3
    }
}

impl Default for RateSchedule {
    fn default() -> Self {
        Self::ISKI_2025
    }
}

/// Names of the individual rates in a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateKey {
    WaterTier1,
    WaterTier2,
    WaterTier3,
    WasteTier1,
    WasteTier2,
    WasteTier3,
    EnvironmentalLevy,
    Vat,
}

impl RateKey {
    pub const ALL: [RateKey; 8] = [
        RateKey::WaterTier1,
        RateKey::WaterTier2,
        RateKey::WaterTier3,
        RateKey::WasteTier1,
        RateKey::WasteTier2,
        RateKey::WasteTier3,
        RateKey::EnvironmentalLevy,
        RateKey::Vat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RateKey::WaterTier1 => "water_tier1",
            RateKey::WaterTier2 => "water_tier2",
            RateKey::WaterTier3 => "water_tier3",
            RateKey::WasteTier1 => "waste_tier1",
            RateKey::WasteTier2 => "waste_tier2",
            RateKey::WasteTier3 => "waste_tier3",
            RateKey::EnvironmentalLevy => "ctv_rate",
            RateKey::Vat => "kdv_rate",
        }
    }

    fn index(&self) -> usize {
        match self {
            RateKey::WaterTier1 => 0,
            RateKey::WaterTier2 => 1,
            RateKey::WaterTier3 => 2,
            RateKey::WasteTier1 => 3,
            RateKey::WasteTier2 => 4,
            RateKey::WasteTier3 => 5,
            RateKey::EnvironmentalLevy => 6,
            RateKey::Vat => 7,
        }
    }
}

impl FromStr for RateKey {
    type Err = TariffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "water_tier1" => Ok(RateKey::WaterTier1),
            "water_tier2" => Ok(RateKey::WaterTier2),
            "water_tier3" => Ok(RateKey::WaterTier3),
            "waste_tier1" => Ok(RateKey::WasteTier1),
            "waste_tier2" => Ok(RateKey::WasteTier2),
            "waste_tier3" => Ok(RateKey::WasteTier3),
            "ctv_rate" | "environmental_levy_rate" => Ok(RateKey::EnvironmentalLevy),
            "kdv_rate" | "vat_rate" => Ok(RateKey::Vat),
            other => Err(TariffError::UnknownRateKey(other.to_string())),
        }
    }
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial rate schedule merged over the defaults
///
/// Unspecified keys keep the value of the schedule they are merged into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateOverrides {
    values: [Option<Decimal>; 8],
}

impl RateOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one override; rates must lie in `[0, MAX_RATE]`
    pub fn set(&mut self, key: RateKey, value: Decimal) -> Result<(), TariffError> {
        if value < Decimal::ZERO {
            return Err(TariffError::invalid(
                key.as_str(),
                format!("rate cannot be negative ({})", value),
            ));
        }
        if value > crate::MAX_RATE {
            return Err(TariffError::invalid(
                key.as_str(),
                format!("rate {} exceeds {}", value, crate::MAX_RATE),
            ));
        }
        self.values[key.index()] = Some(value);
        Ok(())
    }

    /// Builder-style variant of [`RateOverrides::set`]
    pub fn with(mut self, key: RateKey, value: Decimal) -> Result<Self, TariffError> {
        self.set(key, value)?;
        Ok(self)
    }

    /// Build from `(key, value)` pairs using schedule key names
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, TariffError>
    where
        I: IntoIterator<Item = (&'a str, Decimal)>,
    {
        let mut overrides = Self::new();
        for (name, value) in pairs {
            overrides.set(name.parse()?, value)?;
        }
        Ok(overrides)
    }

    /// Parse a `key=value` assignment and store it
    pub fn set_assignment(&mut self, assignment: &str) -> Result<(), TariffError> {
        let (name, raw) = assignment.split_once('=').ok_or_else(|| {
            TariffError::invalid(
                "rate override",
                format!("expected key=value, got '{}'", assignment),
            )
        })?;
        let key: RateKey = name.parse()?;
        let value: Decimal = raw.trim().replace(',', ".").parse().map_err(|_| {
            TariffError::invalid(key.as_str(), format!("not a number: '{}'", raw.trim()))
        })?;
        self.set(key, value)
    }

    pub fn get(&self, key: RateKey) -> Option<Decimal> {
        self.values[key.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Iterate over the keys that carry an override
    pub fn iter(&self) -> impl Iterator<Item = (RateKey, Decimal)> + '_ {
        RateKey::ALL
            .iter()
            .filter_map(move |key| self.get(*key).map(|value| (*key, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_iski_2025() {
        let rates = RateSchedule::default();
        assert_eq!(rates.water_tier1, dec!(34.67));
        assert_eq!(rates.waste_tier3, dec!(38.205));
        assert_eq!(rates.environmental_levy_rate, dec!(0.015));
        assert_eq!(rates.vat_rate, dec!(0.08));
        assert!(rates.is_progressive());
    }

    #[test]
    fn test_merge_keeps_unspecified_keys() {
        let overrides =
            RateOverrides::from_pairs([("water_tier1", dec!(40)), ("vat_rate", dec!(0.18))])
                .unwrap();
        let merged = RateSchedule::default().merged(&overrides);

        assert_eq!(merged.water_tier1, dec!(40));
        assert_eq!(merged.vat_rate, dec!(0.18));
        assert_eq!(merged.waste_tier1, dec!(17.335));
        assert_eq!(merged.water_tier2, dec!(52.83));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = RateOverrides::from_pairs([("water_tier4", dec!(1))]).unwrap_err();
        assert!(matches!(err, TariffError::UnknownRateKey(key) if key == "water_tier4"));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let err = RateOverrides::new()
            .with(RateKey::WasteTier2, dec!(-1))
            .unwrap_err();
        assert!(matches!(err, TariffError::InvalidInput { .. }));
    }

    #[test]
    fn test_oversized_rate_rejected() {
        let mut overrides = RateOverrides::new();
        assert!(overrides.set(RateKey::WaterTier1, Decimal::MAX).is_err());
        assert!(overrides.set_assignment("water_tier1=1000000.01").is_err());
        assert!(overrides.set(RateKey::WaterTier1, crate::MAX_RATE).is_ok());
    }

    #[test]
    fn test_assignment_parsing() {
        let mut overrides = RateOverrides::new();
        overrides.set_assignment("ctv_rate=0,02").unwrap();
        overrides.set_assignment(" waste_tier1 = 20 ").unwrap();

        assert_eq!(overrides.get(RateKey::EnvironmentalLevy), Some(dec!(0.02)));
        assert_eq!(overrides.get(RateKey::WasteTier1), Some(dec!(20)));
        assert_eq!(overrides.iter().count(), 2);

        assert!(overrides.set_assignment("water_tier1").is_err());
        assert!(overrides.set_assignment("water_tier1=abc").is_err());
    }

    #[test]
    fn test_schedule_deserializes_legacy_keys() {
        let json = r#"{
            "water_tier1": "34.67", "water_tier2": "52.83", "water_tier3": "76.41",
            "waste_tier1": "17.335", "waste_tier2": "26.415", "waste_tier3": "38.205",
            "ctv_rate": "0.015", "kdv_rate": "0.08"
        }"#;
        let rates: RateSchedule = serde_json::from_str(json).unwrap();
        assert_eq!(rates, RateSchedule::ISKI_2025);
    }
}
