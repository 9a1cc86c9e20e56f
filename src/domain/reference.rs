//! Instrument reference data and quote indexes.
//!
//! [`ReferenceData`] is built once per run and only ever borrowed afterwards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const UNKNOWN_SECTOR: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMeta {
    pub symbol: String,
    pub name: String,
    pub sector: String,
}

impl SymbolMeta {
    /// Stand-in for symbols missing from the reference table.
    pub fn fallback(symbol: &str) -> Self {
        SymbolMeta {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            sector: UNKNOWN_SECTOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
}

impl Quote {
    pub fn is_valid(&self) -> bool {
        self.close > 0.0 && self.close.is_finite()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    symbols: HashMap<String, SymbolMeta>,
    quotes: Vec<Quote>,
    latest: HashMap<String, Quote>,
    by_date: BTreeMap<NaiveDate, HashMap<String, f64>>,
}

impl ReferenceData {
    /// Index symbols and quotes. Invalid quotes (non-positive close) are
    /// dropped here so every lookup below only sees usable prices.
    pub fn new(symbols: Vec<SymbolMeta>, quotes: Vec<Quote>) -> Self {
        let mut symbol_index = HashMap::with_capacity(symbols.len());
        for meta in symbols {
            symbol_index.insert(meta.symbol.clone(), meta);
        }

        let quotes: Vec<Quote> = quotes.into_iter().filter(Quote::is_valid).collect();

        let mut latest: HashMap<String, Quote> = HashMap::new();
        let mut by_date: BTreeMap<NaiveDate, HashMap<String, f64>> = BTreeMap::new();
        for quote in &quotes {
            match latest.get(&quote.symbol) {
                Some(existing) if quote.date <= existing.date => {}
                _ => {
                    latest.insert(quote.symbol.clone(), quote.clone());
                }
            }
            by_date
                .entry(quote.date)
                .or_default()
                .insert(quote.symbol.clone(), quote.close);
        }

        ReferenceData {
            symbols: symbol_index,
            quotes,
            latest,
            by_date,
        }
    }

    /// Metadata for `symbol`, or a synthetic entry if it is unknown.
    pub fn meta(&self, symbol: &str) -> SymbolMeta {
        self.symbols
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| SymbolMeta::fallback(symbol))
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn latest_quote(&self, symbol: &str) -> Option<&Quote> {
        self.latest.get(symbol)
    }

    pub fn latest_quotes(&self) -> &HashMap<String, Quote> {
        &self.latest
    }

    /// Closing prices quoted on exactly `date`.
    pub fn quotes_on(&self, date: NaiveDate) -> Option<&HashMap<String, f64>> {
        self.by_date.get(&date)
    }

    pub fn price_on(&self, date: NaiveDate, symbol: &str) -> Option<f64> {
        self.by_date.get(&date)?.get(symbol).copied()
    }

    pub fn has_quotes_on(&self, date: NaiveDate) -> bool {
        self.by_date.get(&date).is_some_and(|set| !set.is_empty())
    }

    /// Every quoted date, ascending.
    pub fn quote_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.by_date.keys().copied()
    }
}
