//! Usage solver
//!
//! Recovers consumption from a bill total by bisecting over the tariff
//! calculator.

pub mod bisection;

pub use bisection::{solve_usage_from_price, Confidence, SolverConfig, UsageEstimate, UsageSolver};
