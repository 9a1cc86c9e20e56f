//! Core domain types and derivation logic. Nothing here touches the
//! filesystem.

pub mod dates;
pub mod transaction;
pub mod reference;
pub mod aggregation;
pub mod price_resolver;
pub mod holding;
pub mod timeseries;
pub mod rollup;
pub mod portfolio;
pub mod measures;
pub mod config_validation;
pub mod error;
