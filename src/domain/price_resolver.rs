//! Price resolution as an ordered chain of strategies.
//!
//! Each [`PriceResolver`] either produces a positive price or passes. A
//! [`PriceChain`] tries them in order; the first answer wins.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::reference::{Quote, ReferenceData};

/// Where a holding's price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    LatestQuote,
    QuoteScan,
    PrefixMatch,
    RecordedPrice,
    Fallback,
}

pub const FALLBACK_PRICE: f64 = 1.0;

pub trait PriceResolver {
    fn source(&self) -> PriceSource;

    /// Positive price for `symbol`, considering quotes up to `as_of` when
    /// given.
    fn try_resolve(&self, symbol: &str, as_of: Option<NaiveDate>) -> Option<f64>;
}

fn usable(price: f64) -> Option<f64> {
    (price > 0.0 && price.is_finite()).then_some(price)
}

/// Latest-date quote matching `pred`, ignoring quotes after
/// `as_of`. Later entries win ties.
fn max_date_quote<'q>(
    quotes: &'q [Quote],
    as_of: Option<NaiveDate>,
    pred: impl Fn(&Quote) -> bool,
) -> Option<&'q Quote> {
    quotes
        .iter()
        .filter(|q| as_of.is_none_or(|d| q.date <= d))
        .filter(|q| pred(q))
        .max_by_key(|q| q.date)
}

pub struct LatestQuote<'a> {
    pub reference: &'a ReferenceData,
}

impl PriceResolver for LatestQuote<'_> {
    fn source(&self) -> PriceSource {
        PriceSource::LatestQuote
    }

    fn try_resolve(&self, symbol: &str, as_of: Option<NaiveDate>) -> Option<f64> {
        let quote = self.reference.latest_quote(symbol)?;
        if as_of.is_some_and(|d| quote.date > d) {
            return None;
        }
        usable(quote.close)
    }
}

/// Full scan of the quote list, tolerant of stray whitespace and case in the
/// quote symbols.
pub struct QuoteScan<'a> {
    pub reference: &'a ReferenceData,
}

impl PriceResolver for QuoteScan<'_> {
    fn source(&self) -> PriceSource {
        PriceSource::QuoteScan
    }

    fn try_resolve(&self, symbol: &str, as_of: Option<NaiveDate>) -> Option<f64> {
        let wanted = symbol.trim();
        max_date_quote(self.reference.quotes(), as_of, |q| {
            q.symbol.trim().eq_ignore_ascii_case(wanted)
        })
        .and_then(|q| usable(q.close))
    }
}

/// Fixed-income symbols look like `ISSUER@details`; quotes may only carry
/// the issuer part.
pub struct PrefixMatch<'a> {
    pub reference: &'a ReferenceData,
}

impl PrefixMatch<'_> {
    pub fn prefix(symbol: &str) -> &str {
        symbol.split('@').next().unwrap_or(symbol).trim()
    }
}

impl PriceResolver for PrefixMatch<'_> {
    fn source(&self) -> PriceSource {
        PriceSource::PrefixMatch
    }

    fn try_resolve(&self, symbol: &str, as_of: Option<NaiveDate>) -> Option<f64> {
        let prefix = Self::prefix(symbol);
        if prefix.is_empty() {
            return None;
        }
        max_date_quote(self.reference.quotes(), as_of, |q| {
            q.symbol.starts_with(prefix)
        })
        .and_then(|q| usable(q.close))
    }
}

/// The position's own last recorded net price.
pub struct RecordedPrice(pub Option<f64>);

impl PriceResolver for RecordedPrice {
    fn source(&self) -> PriceSource {
        PriceSource::RecordedPrice
    }

    fn try_resolve(&self, _symbol: &str, _as_of: Option<NaiveDate>) -> Option<f64> {
        self.0.and_then(usable)
    }
}

pub struct Fallback;

impl PriceResolver for Fallback {
    fn source(&self) -> PriceSource {
        PriceSource::Fallback
    }

    fn try_resolve(&self, _symbol: &str, _as_of: Option<NaiveDate>) -> Option<f64> {
        Some(FALLBACK_PRICE)
    }
}

pub struct PriceChain<'a> {
    resolvers: Vec<Box<dyn PriceResolver + 'a>>,
}

impl<'a> PriceChain<'a> {
    pub fn new(resolvers: Vec<Box<dyn PriceResolver + 'a>>) -> Self {
        PriceChain { resolvers }
    }

    /// Market chain: latest quote, quote scan, recorded price, 1.0.
    pub fn market(reference: &'a ReferenceData, recorded: Option<f64>) -> Self {
        PriceChain::new(vec![
            Box::new(LatestQuote { reference }),
            Box::new(QuoteScan { reference }),
            Box::new(RecordedPrice(recorded)),
            Box::new(Fallback),
        ])
    }

    /// Fixed-income chain: the market chain with a prefix match before the
    /// recorded price.
    pub fn fixed_income(reference: &'a ReferenceData, recorded: Option<f64>) -> Self {
        PriceChain::new(vec![
            Box::new(LatestQuote { reference }),
            Box::new(QuoteScan { reference }),
            Box::new(PrefixMatch { reference }),
            Box::new(RecordedPrice(recorded)),
            Box::new(Fallback),
        ])
    }

    /// First price any resolver produces, with its source. `None` only for
    /// a chain without a terminal [`Fallback`].
    pub fn resolve(&self, symbol: &str, as_of: Option<NaiveDate>) -> Option<(f64, PriceSource)> {
        self.resolvers
            .iter()
            .find_map(|r| r.try_resolve(symbol, as_of).map(|p| (p, r.source())))
    }
}
