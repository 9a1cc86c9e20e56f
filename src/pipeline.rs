//! Raw tables in, `PortfolioData` out.

use tracing::info;

use crate::adapters::csv_adapter::{parse_quotes, parse_symbols, parse_transactions};
use crate::domain::error::PortviewError;
use crate::domain::portfolio::{build_portfolio, PortfolioConfig, PortfolioData};
use crate::domain::reference::ReferenceData;
use crate::ports::input_port::RawInputs;

/// Parse the three tables and derive the portfolio.
///
/// A table that was never supplied aborts with `InputMissing`; everything
/// below table level degrades instead of failing. Identical inputs always
/// give equal output.
pub fn process(inputs: &RawInputs, config: &PortfolioConfig) -> Result<PortfolioData, PortviewError> {
    let (transactions, symbols, quotes) = inputs.require()?;

    let transactions = parse_transactions(transactions)?;
    let reference = ReferenceData::new(parse_symbols(symbols)?, parse_quotes(quotes)?);
    info!(
        transactions = transactions.len(),
        quotes = reference.quotes().len(),
        "inputs parsed"
    );

    Ok(build_portfolio(transactions, &reference, config))
}
