//! Raw input port: the three delimited tables, as text.

use serde::{Deserialize, Serialize};

use crate::domain::error::{PortviewError, Table};

/// The unparsed text of each input table. `None` means the table was never
/// supplied, which is different from an empty (header-only) table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInputs {
    pub transactions: Option<String>,
    pub symbols: Option<String>,
    pub quotes: Option<String>,
}

impl RawInputs {
    pub fn new(transactions: String, symbols: String, quotes: String) -> Self {
        RawInputs {
            transactions: Some(transactions),
            symbols: Some(symbols),
            quotes: Some(quotes),
        }
    }

    /// Borrow all three tables, or report the first missing one.
    pub fn require(&self) -> Result<(&str, &str, &str), PortviewError> {
        Ok((
            present(&self.transactions, Table::Transactions)?,
            present(&self.symbols, Table::Symbols)?,
            present(&self.quotes, Table::Quotes)?,
        ))
    }
}

fn present(text: &Option<String>, table: Table) -> Result<&str, PortviewError> {
    text.as_deref().ok_or(PortviewError::InputMissing { table })
}

pub trait InputPort {
    fn load(&self) -> Result<RawInputs, PortviewError>;
}
