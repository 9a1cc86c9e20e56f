//! portview — portfolio holdings, valuation and history from transaction
//! extracts.
//!
//! Hexagonal architecture: pure derivation logic in [`domain`], port traits in
//! [`ports`], file and format handling in [`adapters`]. [`pipeline::process`]
//! joins them: three raw tables in, one immutable `PortfolioData` out.

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod pipeline;
pub mod cli;
