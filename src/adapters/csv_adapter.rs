//! Delimited-text table parsing for transactions, symbols and quotes.
//!
//! Parsing is lenient at the cell level: blank or garbled numbers become 0,
//! unparseable dates keep their raw text, and rows the reader cannot decode
//! are skipped with a warning. Only a table without a readable header row is
//! an error.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::domain::dates::{normalize_date, parse_date};
use crate::domain::error::{PortviewError, Table};
use crate::domain::reference::{Quote, SymbolMeta};
use crate::domain::transaction::{StatusTag, Transaction};

/// Normalized header name → column index.
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &csv::StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (header_key(h), i))
            .collect();
        Columns { index }
    }

    /// First column matching any alias.
    fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|a| self.index.get(*a).copied())
    }

    fn require(&self, table: Table, aliases: &[&str]) -> Option<usize> {
        let found = self.find(aliases);
        if found.is_none() {
            warn!(%table, column = aliases[0], "column not found; values default");
        }
        found
    }
}

/// Lowercased header with spaces, underscores and a leading BOM removed.
fn header_key(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn cell<'r>(record: &'r csv::StringRecord, col: Option<usize>) -> &'r str {
    col.and_then(|i| record.get(i)).unwrap_or("").trim()
}

/// Lenient numeric coercion for spreadsheet-style cells.
///
/// Blank and unparseable text give 0; `,` and `$` are stripped; a value in
/// parentheses is negative; non-finite results give 0.
pub fn coerce_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let (negate, body) = match trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, ',' | '$') && !c.is_whitespace())
        .collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => {
            if negate {
                -v
            } else {
                v
            }
        }
        _ => 0.0,
    }
}

fn reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes())
}

fn headers(rdr: &mut csv::Reader<&[u8]>, table: Table) -> Result<Columns, PortviewError> {
    let headers = rdr.headers().map_err(|e| PortviewError::CsvParse {
        table,
        reason: e.to_string(),
    })?;
    Ok(Columns::new(headers))
}

/// Iterate decodable records, logging and skipping the rest.
fn records(
    rdr: &mut csv::Reader<&[u8]>,
    table: Table,
) -> impl Iterator<Item = csv::StringRecord> {
    rdr.records().enumerate().filter_map(move |(i, result)| match result {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(%table, row = i + 2, error = %e, "skipping unreadable row");
            None
        }
    })
}

pub fn parse_transactions(content: &str) -> Result<Vec<Transaction>, PortviewError> {
    let table = Table::Transactions;
    let mut rdr = reader(content);
    let cols = headers(&mut rdr, table)?;

    let symbol = cols.require(table, &["symbol"]);
    let account = cols.require(table, &["account"]);
    let date = cols.require(table, &["date"]);
    let status = cols.require(table, &["status"]);
    let qty = cols.require(table, &["qtychange", "quantitychange"]);
    let cost = cols.require(table, &["costchange"]);
    let realized = cols.require(table, &["realized3", "realized"]);
    let cash = cols.require(table, &["cashimpact"]);
    let net_price = cols.require(table, &["netprice"]);
    let debit = cols.require(table, &["debit"]);

    let mut out = Vec::new();
    for record in records(&mut rdr, table) {
        let raw_date = cell(&record, date);
        let normalized = normalize_date(raw_date);
        if !raw_date.is_empty() && parse_date(raw_date).is_none() {
            warn!(date = raw_date, "unparseable transaction date kept as-is");
        }
        out.push(Transaction {
            symbol: cell(&record, symbol).to_string(),
            account: cell(&record, account).to_string(),
            date: normalized,
            status: StatusTag::parse(cell(&record, status)),
            quantity_change: coerce_number(cell(&record, qty)),
            cost_change: coerce_number(cell(&record, cost)),
            realized: coerce_number(cell(&record, realized)),
            cash_impact: coerce_number(cell(&record, cash)),
            net_price: coerce_number(cell(&record, net_price)),
            debit: coerce_number(cell(&record, debit)),
        });
    }
    debug!(rows = out.len(), "parsed transactions");
    Ok(out)
}

pub fn parse_symbols(content: &str) -> Result<Vec<SymbolMeta>, PortviewError> {
    let table = Table::Symbols;
    let mut rdr = reader(content);
    let cols = headers(&mut rdr, table)?;

    let symbol = cols.require(table, &["symbol"]);
    let name = cols.find(&["name"]);
    let sector = cols.find(&["sector"]);

    let mut out = Vec::new();
    for record in records(&mut rdr, table) {
        let sym = cell(&record, symbol);
        if sym.is_empty() {
            continue;
        }
        let mut meta = SymbolMeta::fallback(sym);
        let name = cell(&record, name);
        if !name.is_empty() {
            meta.name = name.to_string();
        }
        let sector = cell(&record, sector);
        if !sector.is_empty() {
            meta.sector = sector.to_string();
        }
        out.push(meta);
    }
    debug!(rows = out.len(), "parsed symbols");
    Ok(out)
}

/// Quote rows without a symbol or a parseable date are dropped.
pub fn parse_quotes(content: &str) -> Result<Vec<Quote>, PortviewError> {
    let table = Table::Quotes;
    let mut rdr = reader(content);
    let cols = headers(&mut rdr, table)?;

    let symbol = cols.require(table, &["symbol"]);
    let date = cols.require(table, &["date"]);
    let close = cols.require(table, &["close", "price"]);

    let mut out = Vec::new();
    let mut skipped = 0usize;
    for record in records(&mut rdr, table) {
        let sym = cell(&record, symbol);
        let Some(parsed) = parse_date(cell(&record, date)) else {
            skipped += 1;
            continue;
        };
        if sym.is_empty() {
            skipped += 1;
            continue;
        }
        out.push(Quote {
            symbol: sym.to_string(),
            date: parsed,
            close: coerce_number(cell(&record, close)),
        });
    }
    if skipped > 0 {
        warn!(skipped, "dropped quote rows without symbol or date");
    }
    debug!(rows = out.len(), "parsed quotes");
    Ok(out)
}
