//! Holdings export as CSV.

use std::path::Path;

use tracing::info;

use crate::domain::error::PortviewError;
use serde::Serialize;

use crate::domain::holding::Holding;
use crate::domain::measures::{select_holdings, AccountFilter, HoldingView};
use crate::domain::portfolio::PortfolioData;
use crate::domain::timeseries::TimeSeriesPoint;
use crate::ports::report_port::ReportPort;

/// Writes one view of the holdings, one row per holding.
pub struct CsvReportAdapter {
    view: HoldingView,
    filter: AccountFilter,
}

impl CsvReportAdapter {
    pub fn new(view: HoldingView, filter: AccountFilter) -> Self {
        Self { view, filter }
    }

    pub fn write_holdings<W: std::io::Write>(
        holdings: &[Holding],
        out: W,
    ) -> Result<(), PortviewError> {
        let mut wtr = csv::Writer::from_writer(out);
        for h in holdings {
            wtr.serialize(h).map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Flat series row; per-account values are left to the JSON report.
#[derive(Serialize)]
struct SeriesRow {
    date: String,
    cash: f64,
    equity: f64,
    total_value: f64,
    realized_gain: f64,
    unrealized_gain: f64,
    benchmark: f64,
    has_quotes: bool,
    all_prices: bool,
}

pub fn write_series<W: std::io::Write>(
    points: &[TimeSeriesPoint],
    out: W,
) -> Result<(), PortviewError> {
    let mut wtr = csv::Writer::from_writer(out);
    for p in points {
        wtr.serialize(SeriesRow {
            date: p.date.to_string(),
            cash: p.cash,
            equity: p.equity,
            total_value: p.total_value,
            realized_gain: p.realized_gain,
            unrealized_gain: p.unrealized_gain,
            benchmark: p.benchmark,
            has_quotes: p.has_quotes,
            all_prices: p.all_prices,
        })
        .map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

fn csv_err(e: csv::Error) -> PortviewError {
    PortviewError::Io(std::io::Error::other(e))
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, data: &PortfolioData, output_path: &Path) -> Result<(), PortviewError> {
        let holdings = select_holdings(data, self.view, &self.filter);
        let file = std::fs::File::create(output_path)?;
        Self::write_holdings(holdings, file)?;
        info!(path = %output_path.display(), rows = holdings.len(), "wrote holdings csv");
        Ok(())
    }
}
