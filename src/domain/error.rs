//! Domain error types.
//!
//! Only failures that stop a run (or an account) are errors. Malformed cells,
//! unparseable dates and missing prices degrade locally and are logged.

/// Which of the three input tables an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Transactions,
    Symbols,
    Quotes,
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Table::Transactions => "transactions",
            Table::Symbols => "symbols",
            Table::Quotes => "quotes",
        };
        f.write_str(name)
    }
}

/// Top-level error type for portview.
#[derive(Debug, thiserror::Error)]
pub enum PortviewError {
    #[error("missing input table: {table}")]
    InputMissing { table: Table },

    #[error("failed to read {path}: {reason}")]
    InputRead { path: String, reason: String },

    #[error("{table} table is malformed: {reason}")]
    CsvParse { table: Table, reason: String },

    #[error("invalid envelope: {reason}")]
    Envelope { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("account {account}: non-finite {field}")]
    NonFiniteValue { account: String, field: String },

    #[error("{count} account(s) could not be processed")]
    AccountsFailed { count: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PortviewError> for std::process::ExitCode {
    fn from(err: &PortviewError) -> Self {
        let code: u8 = match err {
            PortviewError::Io(_) => 1,
            PortviewError::ConfigParse { .. }
            | PortviewError::ConfigMissing { .. }
            | PortviewError::ConfigInvalid { .. } => 2,
            PortviewError::InputMissing { .. }
            | PortviewError::InputRead { .. }
            | PortviewError::CsvParse { .. } => 3,
            PortviewError::Envelope { .. } => 4,
            PortviewError::NonFiniteValue { .. } | PortviewError::AccountsFailed { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
