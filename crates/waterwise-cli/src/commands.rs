//! Subcommand handlers; each returns the JSON document printed on stdout

use crate::cli::{AnalyzeArgs, BillArgs, EstimateArgs, UsageArgs};
use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};
use waterwise_common::RateOverrides;
use waterwise_tariff::analysis::{BillAnalysis, UsageSource};
use waterwise_tariff::metering::ConsumptionEntry;
use waterwise_tariff::solver::UsageEstimate;
use waterwise_tariff::{Tariff, TariffConfig};

#[derive(Serialize)]
struct EstimateOutput {
    #[serde(flatten)]
    estimate: UsageEstimate,
    liters: Decimal,
}

#[derive(Serialize)]
struct AnalysisOutput {
    #[serde(flatten)]
    analysis: BillAnalysis,
    title: &'static str,
    advice: String,
}

#[derive(Serialize)]
struct UsageOutput {
    #[serde(flatten)]
    entry: ConsumptionEntry,
    label: &'static str,
}

#[instrument(skip(config, args), fields(usage = %args.usage, category = %args.category))]
pub fn bill(config: &TariffConfig, args: &BillArgs) -> Result<Value> {
    let tariff = Tariff::new(config.clone())?;

    let mut overrides = RateOverrides::new();
    for assignment in &args.rates {
        overrides.set_assignment(assignment)?;
    }
    if !overrides.is_empty() {
        info!(count = overrides.iter().count(), "applying rate overrides");
    }

    let bill = tariff.compute_bill(args.usage, &args.category, Some(&overrides));
    Ok(serde_json::to_value(bill)?)
}

#[instrument(skip(config, args), fields(price = %args.price, category = %args.category))]
pub fn estimate(config: &TariffConfig, args: &EstimateArgs) -> Result<Value> {
    let mut config = config.clone();
    if args.legacy {
        config.solver.zero_on_miss = true;
    }
    let tariff = Tariff::new(config)?;

    let estimate = tariff.estimate_usage(args.price, &args.category);
    info!(usage_m3 = %estimate.usage_m3, confidence = ?estimate.confidence, "usage estimated");

    let liters = estimate.liters();
    Ok(serde_json::to_value(EstimateOutput { estimate, liters })?)
}

#[instrument(skip(config, args), fields(category = %args.category))]
pub fn analyze(config: &TariffConfig, args: &AnalyzeArgs) -> Result<Value> {
    let tariff = Tariff::new(config.clone())?;

    let source = match (args.price, args.daily_m3, args.usage) {
        (Some(price), _, _) => UsageSource::PriceEstimate { price },
        (_, Some(daily_m3), _) => UsageSource::DailyAverage { daily_m3 },
        (_, _, Some(usage_m3)) => UsageSource::Metered { usage_m3 },
        _ => return Err(anyhow!("one of --price, --daily-m3 or --usage is required")),
    };

    let analysis = tariff
        .analyze_bill(source, &args.category, args.target)
        .ok_or_else(|| anyhow!("no consumption could be recovered from the bill"))?;

    Ok(serde_json::to_value(AnalysisOutput {
        title: analysis.status.title(),
        advice: analysis.advice(),
        analysis,
    })?)
}

#[instrument(skip(args), fields(activity = %args.activity, amount = %args.amount))]
pub fn usage(args: &UsageArgs) -> Result<Value> {
    let date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let entry = ConsumptionEntry::new(args.activity, args.amount, date);
    entry.validate()?;

    Ok(serde_json::to_value(UsageOutput {
        label: entry.activity.label(),
        entry,
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use waterwise_common::{ActivityType, CustomerCategory};

    fn number(json: &Value, key: &str) -> Decimal {
        json[key].as_str().unwrap().parse().unwrap()
    }

    fn bill_args(usage: Decimal, rates: &[&str]) -> BillArgs {
        BillArgs {
            usage,
            category: CustomerCategory::Residential,
            rates: rates.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_bill_output_keys() {
        let json = bill(&TariffConfig::default(), &bill_args(dec!(10), &[])).unwrap();

        assert_eq!(number(&json, "water_cost"), dec!(277.36));
        assert_eq!(number(&json, "waste_cost"), dec!(138.68));
        assert_eq!(number(&json, "ctv"), dec!(0.12));
        assert_eq!(number(&json, "kdv"), dec!(33.28));
        assert_eq!(number(&json, "total"), dec!(449.44));
        assert_eq!(json["currency"], "TL");
    }

    #[test]
    fn test_bill_with_override() {
        let args = bill_args(dec!(10), &["water_tier1=40"]);
        let json = bill(&TariffConfig::default(), &args).unwrap();
        assert_eq!(number(&json, "water_cost"), dec!(320.00));
        assert_eq!(number(&json, "total"), dec!(495.49));
    }

    #[test]
    fn test_bill_rejects_unknown_rate_key() {
        let args = bill_args(dec!(10), &["sewer_rate=3"]);
        let err = bill(&TariffConfig::default(), &args).unwrap_err();
        assert!(err.to_string().contains("sewer_rate"));
    }

    #[test]
    fn test_huge_inputs_are_bounded() {
        let usage = Decimal::from_scientific("1e27").unwrap();
        let json = bill(&TariffConfig::default(), &bill_args(usage, &[])).unwrap();
        assert_eq!(number(&json, "usage_m3"), dec!(1000000));

        let args = AnalyzeArgs {
            price: None,
            daily_m3: None,
            usage: Some(Decimal::MAX),
            category: CustomerCategory::Residential,
            target: None,
        };
        let json = analyze(&TariffConfig::default(), &args).unwrap();
        assert_eq!(json["status"], "danger");
        assert_eq!(number(&json, "usage_m3"), dec!(1000000));
    }

    #[test]
    fn test_estimate_includes_liters() {
        let args = EstimateArgs {
            price: dec!(715.00),
            category: CustomerCategory::Residential,
            legacy: false,
        };
        let json = estimate(&TariffConfig::default(), &args).unwrap();

        assert_eq!(number(&json, "usage_m3"), dec!(15.47));
        assert_eq!(number(&json, "liters"), dec!(15470.00));
        assert_eq!(json["confidence"], "converged");
    }

    #[test]
    fn test_estimate_legacy_zero_on_miss() {
        let args = EstimateArgs {
            price: dec!(1000000),
            category: CustomerCategory::Residential,
            legacy: true,
        };
        let json = estimate(&TariffConfig::default(), &args).unwrap();

        assert_eq!(number(&json, "usage_m3"), dec!(0));
        assert_eq!(json["confidence"], "low_confidence");
    }

    #[test]
    fn test_analyze_metered_usage() {
        let args = AnalyzeArgs {
            price: None,
            daily_m3: None,
            usage: Some(dec!(3)),
            category: CustomerCategory::Residential,
            target: None,
        };
        let json = analyze(&TariffConfig::default(), &args).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["title"], "Ideal Consumption");
        assert_eq!(json["source"]["kind"], "metered");
    }

    #[test]
    fn test_analyze_nothing_recovered() {
        let args = AnalyzeArgs {
            price: None,
            daily_m3: Some(Decimal::ZERO),
            usage: None,
            category: CustomerCategory::Residential,
            target: None,
        };
        assert!(analyze(&TariffConfig::default(), &args).is_err());
    }

    #[test]
    fn test_usage_converts_activity() {
        let args = UsageArgs {
            activity: ActivityType::Shower,
            amount: dec!(8),
            date: NaiveDate::from_ymd_opt(2025, 3, 14),
        };
        let json = usage(&args).unwrap();

        assert_eq!(json["activity"], "shower");
        assert_eq!(number(&json, "liters"), dec!(96));
        assert_eq!(json["date"], "2025-03-14");
    }

    #[test]
    fn test_usage_rejects_negative_amount() {
        let args = UsageArgs {
            activity: ActivityType::Tap,
            amount: dec!(-1),
            date: None,
        };
        assert!(usage(&args).is_err());
    }
}
