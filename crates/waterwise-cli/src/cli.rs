use chrono::NaiveDate;
use clap::{ArgGroup, Parser, Subcommand};
use rust_decimal::Decimal;
use waterwise_common::{ActivityType, CustomerCategory};

/// waterwise: water bill calculator and usage estimator.
#[derive(Parser, Debug)]
#[command(name = "waterwise", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute an itemized bill for a consumption figure
    Bill(BillArgs),

    /// Estimate consumption from a bill total
    Estimate(EstimateArgs),

    /// Compare a bill's daily average with a daily target
    Analyze(AnalyzeArgs),

    /// Convert a logged activity into litres
    Usage(UsageArgs),
}

/// Arguments for the `bill` subcommand.
#[derive(Parser, Debug)]
pub struct BillArgs {
    /// Consumption in m³
    #[arg(long, allow_negative_numbers = true)]
    pub usage: Decimal,

    /// Subscriber category (residential, student, disabled, martyr, ...)
    #[arg(long, default_value = "residential")]
    pub category: CustomerCategory,

    /// Rate override as key=value (e.g. water_tier1=40); repeatable
    #[arg(long = "rate", value_name = "KEY=VALUE")]
    pub rates: Vec<String>,
}

/// Arguments for the `estimate` subcommand.
#[derive(Parser, Debug)]
pub struct EstimateArgs {
    /// Bill total in TL
    #[arg(long, allow_negative_numbers = true)]
    pub price: Decimal,

    #[arg(long, default_value = "residential")]
    pub category: CustomerCategory,

    /// Report zero usage when the search misses
    #[arg(long)]
    pub legacy: bool,
}

/// Arguments for the `analyze` subcommand.
#[derive(Parser, Debug)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["price", "daily_m3", "usage"]),
))]
pub struct AnalyzeArgs {
    /// Bill total in TL (usage is estimated)
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Daily average printed on the bill (m³/day)
    #[arg(long)]
    pub daily_m3: Option<Decimal>,

    /// Metered consumption in m³
    #[arg(long)]
    pub usage: Option<Decimal>,

    #[arg(long, default_value = "residential")]
    pub category: CustomerCategory,

    /// Daily target in litres (defaults to the configured target)
    #[arg(long)]
    pub target: Option<Decimal>,
}

/// Arguments for the `usage` subcommand.
#[derive(Parser, Debug)]
pub struct UsageArgs {
    /// Activity name (shower, tap, dishwasher_eco, garden, ...)
    #[arg(long)]
    pub activity: ActivityType,

    /// Minutes, cycles, or units depending on the activity
    #[arg(long, allow_negative_numbers = true)]
    pub amount: Decimal,

    /// Day the activity happened (defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}
