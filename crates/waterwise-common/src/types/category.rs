//! Customer categories
//!
//! Students, disabled subscribers and martyr families pay half price on
//! water and wastewater. The set is open: any category name that is not
//! recognised is carried through as [`CustomerCategory::Other`] and billed
//! without discount.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscriber category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CustomerCategory {
    #[default]
    Residential,
    Student,
    Disabled,
    Martyr,
    /// Any other category name (no discount)
    Other(String),
}

impl CustomerCategory {
    /// Whether the category receives the water/wastewater discount
    pub fn is_discounted(&self) -> bool {
        matches!(
            self,
            CustomerCategory::Student | CustomerCategory::Disabled | CustomerCategory::Martyr
        )
    }

    /// Discount rate applied to water and wastewater cost
    pub fn discount_rate(&self) -> Decimal {
        if self.is_discounted() {
            crate::CATEGORY_DISCOUNT_RATE
        } else {
            Decimal::ZERO
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CustomerCategory::Residential => "residential",
            CustomerCategory::Student => "student",
            CustomerCategory::Disabled => "disabled",
            CustomerCategory::Martyr => "martyr",
            CustomerCategory::Other(name) => name,
        }
    }
}

impl FromStr for CustomerCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Ok(match normalized.as_str() {
            "residential" => CustomerCategory::Residential,
            "student" => CustomerCategory::Student,
            "disabled" => CustomerCategory::Disabled,
            "martyr" => CustomerCategory::Martyr,
            _ => CustomerCategory::Other(normalized),
        })
    }
}

impl From<String> for CustomerCategory {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(category) => category,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for CustomerCategory {
    fn from(value: &str) -> Self {
        CustomerCategory::from(value.to_string())
    }
}

impl From<CustomerCategory> for String {
    fn from(value: CustomerCategory) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for CustomerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
