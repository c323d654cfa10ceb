//! Water-using activities and their litre coefficients

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logged activity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    /// Per minute
    Shower,
    /// Per minute
    Tap,
    /// Per cycle (legacy records without a program)
    Dishwasher,
    DishwasherEco,
    DishwasherStd,
    DishwasherInt,
    /// Per cycle (legacy records without a program)
    WashingMachine,
    WashingMachineEco,
    WashingMachineStd,
    WashingMachineInt,
    /// Per minute
    Garden,
    /// Per wash
    CarWash,
    /// Per bucket
    Bucket,
    /// Amount is already in litres (converted from a bill)
    Bill,
    /// Amount is already in litres
    Custom,
}

impl ActivityType {
    /// Litres consumed per unit of amount
    pub fn liters_per_unit(&self) -> Decimal {
        match self {
            ActivityType::Shower => dec!(12),
            ActivityType::Tap => dec!(6),
            ActivityType::Dishwasher => dec!(15),
            ActivityType::DishwasherEco => dec!(10),
            ActivityType::DishwasherStd => dec!(15),
            ActivityType::DishwasherInt => dec!(20),
            ActivityType::WashingMachine => dec!(50),
            ActivityType::WashingMachineEco => dec!(35),
            ActivityType::WashingMachineStd => dec!(50),
            ActivityType::WashingMachineInt => dec!(70),
            ActivityType::Garden => dec!(20),
            ActivityType::CarWash => dec!(100),
            ActivityType::Bucket => dec!(10),
            ActivityType::Bill | ActivityType::Custom => Decimal::ONE,
        }
    }

    /// Litres consumed for `amount` minutes/cycles/units (saturating)
    pub fn liters_for(&self, amount: Decimal) -> Decimal {
        let saturated = if amount.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        };
        amount.checked_mul(self.liters_per_unit()).unwrap_or(saturated)
    }

    /// Bill entries record a whole billing period, not a daily activity
    pub fn is_bill(&self) -> bool {
        matches!(self, ActivityType::Bill)
    }

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            ActivityType::Shower => "Shower",
            ActivityType::Tap => "Tap Use",
            ActivityType::Dishwasher => "Dishwasher",
            ActivityType::DishwasherEco => "Dishwasher (Eco)",
            ActivityType::DishwasherStd => "Dishwasher (Standard)",
            ActivityType::DishwasherInt => "Dishwasher (Intensive)",
            ActivityType::WashingMachine => "Washing Machine",
            ActivityType::WashingMachineEco => "Washing Machine (Eco)",
            ActivityType::WashingMachineStd => "Washing Machine (Standard)",
            ActivityType::WashingMachineInt => "Washing Machine (Intensive)",
            ActivityType::Garden => "Garden Watering",
            ActivityType::CarWash => "Car Wash",
            ActivityType::Bucket => "Bucket",
            ActivityType::Bill => "Bill Report",
            ActivityType::Custom => "Other (Manual)",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Shower => "shower",
            ActivityType::Tap => "tap",
            ActivityType::Dishwasher => "dishwasher",
            ActivityType::DishwasherEco => "dishwasher_eco",
            ActivityType::DishwasherStd => "dishwasher_std",
            ActivityType::DishwasherInt => "dishwasher_int",
            ActivityType::WashingMachine => "washing_machine",
            ActivityType::WashingMachineEco => "washing_machine_eco",
            ActivityType::WashingMachineStd => "washing_machine_std",
            ActivityType::WashingMachineInt => "washing_machine_int",
            ActivityType::Garden => "garden",
            ActivityType::CarWash => "car_wash",
            ActivityType::Bucket => "bucket",
            ActivityType::Bill => "bill",
            ActivityType::Custom => "custom",
        }
    }
}

impl FromStr for ActivityType {
    type Err = std::convert::Infallible;

    /// Unrecognised names are treated as [`ActivityType::Custom`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "shower" => ActivityType::Shower,
            "tap" => ActivityType::Tap,
            "dishwasher" => ActivityType::Dishwasher,
            "dishwasher_eco" => ActivityType::DishwasherEco,
            "dishwasher_std" => ActivityType::DishwasherStd,
            "dishwasher_int" => ActivityType::DishwasherInt,
            "washing_machine" => ActivityType::WashingMachine,
            "washing_machine_eco" => ActivityType::WashingMachineEco,
            "washing_machine_std" => ActivityType::WashingMachineStd,
            "washing_machine_int" => ActivityType::WashingMachineInt,
            "garden" => ActivityType::Garden,
            "car_wash" => ActivityType::CarWash,
            "bucket" => ActivityType::Bucket,
            "bill" => ActivityType::Bill,
            _ => ActivityType::Custom,
        })
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
