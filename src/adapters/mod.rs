pub mod csv_adapter;
pub mod csv_report_adapter;
pub mod envelope;
pub mod file_config_adapter;
pub mod file_input_adapter;
pub mod json_report_adapter;
