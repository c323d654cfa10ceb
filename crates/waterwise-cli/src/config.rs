//! CLI configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;
use waterwise_common::{RateKey, RateOverrides};
use waterwise_tariff::TariffConfig;

const ENV_PREFIX: &str = "WATERWISE_";

/// Configuration for the `waterwise` binary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    pub tariff: TariffConfig,
}

impl CliConfig {
    /// Load configuration from `.env` and `WATERWISE_*` variables
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        Ok(Self::from_lookup(|name| std::env::var(name).ok()))
    }

    /// Build configuration from a variable lookup; missing or unparsable
    /// values keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));
        let mut cfg = Self::default();
        let tariff = &mut cfg.tariff;

        if let Some(v) = parse_var(&var, "DAILY_TARGET_LITERS") {
            tariff.daily_target_liters = v;
        }
        if let Some(v) = parse_var(&var, "BILLING_PERIOD_DAYS") {
            tariff.billing_period_days = v;
        }

        // Solver settings
        if let Some(v) = parse_var(&var, "SEARCH_UPPER_M3") {
            tariff.solver.search_upper_m3 = v;
        }
        if let Some(v) = parse_var(&var, "SOLVER_ITERATIONS") {
            tariff.solver.iterations = v;
        }
        if let Some(v) = parse_var(&var, "SOLVER_TOLERANCE") {
            tariff.solver.tolerance = v;
        }
        if let Some(raw) = var("ZERO_ON_MISS") {
            match parse_flag(&raw) {
                Some(flag) => tariff.solver.zero_on_miss = flag,
                None => warn!(value = %raw, "ignoring WATERWISE_ZERO_ON_MISS"),
            }
        }

        // Rates, one variable per key (WATERWISE_RATE_WATER_TIER1, ...)
        let mut overrides = RateOverrides::new();
        for key in RateKey::ALL {
            let name = format!("RATE_{}", key.as_str().to_ascii_uppercase());
            let Some(raw) = var(&name) else {
                continue;
            };
            let assignment = format!("{}={}", key.as_str(), raw);
            if let Err(e) = overrides.set_assignment(&assignment) {
                warn!(variable = %name, error = %e, "ignoring rate override");
            }
        }
        tariff.rates = tariff.rates.merged(&overrides);

        cfg
    }
}

fn parse_var<T, V>(var: &V, suffix: &str) -> Option<T>
where
    T: FromStr,
    V: Fn(&str) -> Option<String>,
{
    let raw = var(suffix)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(variable = %suffix, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use waterwise_common::RateSchedule;

    fn config_from(vars: &[(&str, &str)]) -> CliConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_without_variables() {
        let cfg = config_from(&[]);
        assert_eq!(cfg, CliConfig::default());
        assert_eq!(cfg.tariff.rates, RateSchedule::ISKI_2025);
        assert_eq!(cfg.tariff.daily_target_liters, dec!(150));
        assert_eq!(cfg.tariff.billing_period_days, 30);
        assert!(!cfg.tariff.solver.zero_on_miss);
    }

    #[test]
    fn test_reads_prefixed_variables() {
        let cfg = config_from(&[
            ("WATERWISE_DAILY_TARGET_LITERS", "120"),
            ("WATERWISE_BILLING_PERIOD_DAYS", "31"),
            ("WATERWISE_SEARCH_UPPER_M3", "1000"),
            ("WATERWISE_SOLVER_ITERATIONS", "80"),
            ("WATERWISE_SOLVER_TOLERANCE", "0.25"),
            ("WATERWISE_ZERO_ON_MISS", "yes"),
        ]);

        assert_eq!(cfg.tariff.daily_target_liters, dec!(120));
        assert_eq!(cfg.tariff.billing_period_days, 31);
        assert_eq!(cfg.tariff.solver.search_upper_m3, dec!(1000));
        assert_eq!(cfg.tariff.solver.iterations, 80);
        assert_eq!(cfg.tariff.solver.tolerance, dec!(0.25));
        assert!(cfg.tariff.solver.zero_on_miss);
    }

    #[test]
    fn test_rate_variables_override_schedule() {
        let cfg = config_from(&[
            ("WATERWISE_RATE_WATER_TIER1", "40"),
            ("WATERWISE_RATE_KDV_RATE", "0,20"),
        ]);

        assert_eq!(cfg.tariff.rates.water_tier1, dec!(40));
        assert_eq!(cfg.tariff.rates.vat_rate, dec!(0.20));
        assert_eq!(cfg.tariff.rates.waste_tier1, RateSchedule::ISKI_2025.waste_tier1);
    }

    #[test]
    fn test_unparsable_values_keep_defaults() {
        let cfg = config_from(&[
            ("WATERWISE_SOLVER_ITERATIONS", "many"),
            ("WATERWISE_ZERO_ON_MISS", "maybe"),
            ("WATERWISE_RATE_WATER_TIER2", "-5"),
            ("WATERWISE_RATE_WASTE_TIER3", "abc"),
        ]);
        assert_eq!(cfg, CliConfig::default());
    }
}
