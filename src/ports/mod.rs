//! Traits at the I/O seams: configuration, raw input tables, report output.

pub mod config_port;
pub mod input_port;
pub mod report_port;
