//! Core data types for WaterWise

pub mod activity;
pub mod bill;
pub mod category;
pub mod rates;
