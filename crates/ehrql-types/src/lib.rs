//! ehrQL value model
//!
//! This crate defines the leaves every other crate builds on:
//! - Semantic types (`Type`) and runtime values (`Value`)
//! - Coding systems and nominal code values
//! - Calendar arithmetic on dates

pub mod codes;
pub mod dates;
pub mod system_types;
pub mod value;

pub use codes::{Code, CodeError, Codelist, CodingSystem, CodingSystemRegistry};
pub use dates::{Duration, DurationUnit};
pub use system_types::Type;
pub use value::Value;

// Re-exported so downstream crates name the same date and decimal types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
