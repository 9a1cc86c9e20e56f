#![allow(dead_code)]

use chrono::NaiveDate;
use portview::domain::error::PortviewError;
use portview::domain::portfolio::{PortfolioConfig, PortfolioData};
use portview::pipeline::process;
use portview::ports::input_port::{InputPort, RawInputs};
use std::cell::Cell;

pub const TX_HEADER: &str =
    "Symbol,Account,Date,Status,QtyChange,CostChange,Realized3,CashImpact,NetPrice,Debit";

pub struct MockInputPort {
    pub raw: RawInputs,
    pub loads: Cell<usize>,
}

impl MockInputPort {
    pub fn new(raw: RawInputs) -> Self {
        Self {
            raw,
            loads: Cell::new(0),
        }
    }
}

impl InputPort for MockInputPort {
    fn load(&self) -> Result<RawInputs, PortviewError> {
        self.loads.set(self.loads.get() + 1);
        Ok(self.raw.clone())
    }
}

/// One transaction CSV row in `TX_HEADER` column order.
pub struct TxRow<'a> {
    pub symbol: &'a str,
    pub account: &'a str,
    pub date: &'a str,
    pub status: &'a str,
    pub qty: f64,
    pub cost: f64,
    pub realized: f64,
    pub cash: f64,
    pub net_price: f64,
    pub debit: f64,
}

impl<'a> TxRow<'a> {
    pub fn buy(symbol: &'a str, account: &'a str, date: &'a str, qty: f64, cost: f64) -> Self {
        TxRow {
            symbol,
            account,
            date,
            status: "Open Items",
            qty,
            cost,
            realized: 0.0,
            cash: -cost,
            net_price: if qty != 0.0 { cost / qty } else { 0.0 },
            debit: cost,
        }
    }

    pub fn status(mut self, status: &'a str) -> Self {
        self.status = status;
        self
    }

    pub fn realized(mut self, realized: f64) -> Self {
        self.realized = realized;
        self
    }

    pub fn cash(mut self, cash: f64) -> Self {
        self.cash = cash;
        self
    }

    fn line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{}",
            self.symbol,
            self.account,
            self.date,
            self.status,
            self.qty,
            self.cost,
            self.realized,
            self.cash,
            self.net_price,
            self.debit
        )
    }
}

pub fn transactions_csv(rows: &[TxRow<'_>]) -> String {
    let mut out = String::from(TX_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&row.line());
        out.push('\n');
    }
    out
}

pub fn symbols_csv(rows: &[(&str, &str, &str)]) -> String {
    let mut out = String::from("Symbol,Name,Sector\n");
    for (symbol, name, sector) in rows {
        out.push_str(&format!("{symbol},{name},{sector}\n"));
    }
    out
}

pub fn quotes_csv(rows: &[(&str, &str, f64)]) -> String {
    let mut out = String::from("Symbol,Date,Close\n");
    for (symbol, date, close) in rows {
        out.push_str(&format!("{symbol},{date},{close}\n"));
    }
    out
}

pub fn raw(tx: &[TxRow<'_>], symbols: &[(&str, &str, &str)], quotes: &[(&str, &str, f64)]) -> RawInputs {
    RawInputs::new(transactions_csv(tx), symbols_csv(symbols), quotes_csv(quotes))
}

pub fn run(raw: &RawInputs) -> PortfolioData {
    process(raw, &PortfolioConfig::default()).unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn point_on<'a>(
    points: &'a [portview::domain::timeseries::TimeSeriesPoint],
    s: &str,
) -> &'a portview::domain::timeseries::TimeSeriesPoint {
    let d = date(s);
    points
        .iter()
        .find(|p| p.date == d)
        .unwrap_or_else(|| panic!("no point on {s}"))
}
