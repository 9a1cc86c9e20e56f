//! Day-by-day portfolio valuation replay.
//!
//! The replay is a fold over the sorted date axis. [`ReplayState`] carries
//! cash, running market holdings, deposits, time deposits, cumulative
//! realized gain and the last fully priced snapshot. A holding without a
//! same-day quote keeps its last-known price; a day whose equity would come
//! out at zero while positions are open repeats the last good snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

use super::price_resolver::PrefixMatch;
use super::reference::ReferenceData;
use super::transaction::Transaction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub cash: f64,
    pub equity: f64,
    pub total_value: f64,
    pub realized_gain: f64,
    pub unrealized_gain: f64,
    pub benchmark: f64,
    /// The date had at least one quote.
    pub has_quotes: bool,
    /// Every open market holding was priced from a same-day quote. Deposits
    /// and time deposits do not count.
    pub all_prices: bool,
    /// Account name to total value; filled in by the rollup.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub account_values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct ReplaySettings<'a> {
    pub benchmark_symbol: Option<&'a str>,
    pub epsilon: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct RunningHolding {
    quantity: f64,
    cost: f64,
    realized: f64,
    last_price: Option<f64>,
}

impl RunningHolding {
    fn open_cost(&self) -> f64 {
        self.cost + self.realized
    }

    /// Value at the last-known price, or at book cost without one.
    fn carried_value(&self) -> f64 {
        self.last_price
            .map(|p| self.quantity * p)
            .unwrap_or_else(|| self.open_cost())
    }
}

/// Same-day quote for a deposit symbol: exact, else the first quote symbol
/// (in name order) starting with the issuer prefix.
fn deposit_quote(day_quotes: &HashMap<String, f64>, symbol: &str) -> Option<f64> {
    if let Some(close) = day_quotes.get(symbol) {
        return Some(*close);
    }
    let prefix = PrefixMatch::prefix(symbol);
    if prefix.is_empty() {
        return None;
    }
    day_quotes
        .iter()
        .filter(|(quoted, _)| quoted.starts_with(prefix))
        .min_by(|a, b| a.0.cmp(b.0))
        .map(|(_, close)| *close)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Snapshot {
    equity: f64,
    unrealized: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ReplayState {
    cash: f64,
    holdings: BTreeMap<String, RunningHolding>,
    deposits: BTreeMap<String, RunningHolding>,
    time_deposits: BTreeMap<String, RunningHolding>,
    realized: f64,
    last_valid: Option<Snapshot>,
    last_benchmark: f64,
}

impl ReplayState {
    fn apply(&mut self, tx: &Transaction, epsilon: f64) {
        self.cash += tx.cash_impact;
        let Some(class) = tx.class() else {
            return;
        };
        self.realized += tx.realized;

        let book = if tx.status.is_time_deposit() {
            &mut self.time_deposits
        } else if class.is_fixed_income() {
            &mut self.deposits
        } else {
            &mut self.holdings
        };
        let entry = book.entry(tx.symbol.clone()).or_default();
        entry.quantity += tx.quantity_change;
        entry.cost += tx.cost_change;
        entry.realized += tx.realized;
        if tx.net_price > 0.0 {
            entry.last_price = Some(tx.net_price);
        }
        if entry.quantity.abs() < epsilon {
            book.remove(&tx.symbol);
            // The old snapshot still counts the closed position.
            self.last_valid = None;
        }
    }

    fn has_open(&self) -> bool {
        !self.holdings.is_empty() || !self.deposits.is_empty() || !self.time_deposits.is_empty()
    }

    /// Apply one day's transactions and emit that day's point.
    fn step(
        mut self,
        date: NaiveDate,
        day_transactions: &[&Transaction],
        reference: &ReferenceData,
        settings: &ReplaySettings<'_>,
    ) -> (Self, TimeSeriesPoint) {
        for tx in day_transactions {
            self.apply(tx, settings.epsilon);
        }

        let day_quotes = reference.quotes_on(date);
        let mut equity = 0.0;
        let mut unrealized = 0.0;
        let mut all_prices = true;

        for (symbol, holding) in self.holdings.iter_mut() {
            let price = match day_quotes.and_then(|q| q.get(symbol)).copied() {
                Some(close) => {
                    holding.last_price = Some(close);
                    close
                }
                None => {
                    all_prices = false;
                    holding
                        .last_price
                        .or_else(|| reference.latest_quote(symbol).map(|q| q.close))
                        .unwrap_or(0.0)
                }
            };
            let value = holding.quantity * price;
            equity += value;
            unrealized += value - holding.open_cost();
        }

        for (symbol, deposit) in self.deposits.iter_mut() {
            if let Some(close) = day_quotes.and_then(|q| deposit_quote(q, symbol)) {
                deposit.last_price = Some(close);
            }
            let value = deposit.carried_value();
            equity += value;
            unrealized += value - deposit.open_cost();
        }

        for deposit in self.time_deposits.values() {
            let value = deposit.carried_value();
            equity += value;
            unrealized += value - deposit.open_cost();
        }

        if !self.has_open() {
            self.last_valid = None;
        } else if equity > 0.0 {
            if all_prices {
                self.last_valid = Some(Snapshot { equity, unrealized });
            }
        } else if let Some(snapshot) = self.last_valid {
            equity = snapshot.equity;
            unrealized = snapshot.unrealized;
        }

        if let Some(close) = settings
            .benchmark_symbol
            .and_then(|symbol| reference.price_on(date, symbol))
        {
            self.last_benchmark = close;
        }

        let point = TimeSeriesPoint {
            date,
            cash: self.cash,
            equity,
            total_value: self.cash + equity,
            realized_gain: self.realized,
            unrealized_gain: unrealized,
            benchmark: self.last_benchmark,
            has_quotes: reference.has_quotes_on(date),
            all_prices,
            account_values: BTreeMap::new(),
        };
        (self, point)
    }
}

/// Replay `transactions` against the quote history.
///
/// The date axis is the union of transaction dates and quote dates, starting
/// at the first transaction. Rows with unparseable dates cannot be placed on
/// the axis and are skipped.
pub fn reconstruct(
    transactions: &[Transaction],
    reference: &ReferenceData,
    settings: &ReplaySettings<'_>,
) -> Vec<TimeSeriesPoint> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions {
        match tx.parsed_date() {
            Some(date) => by_date.entry(date).or_default().push(tx),
            None => warn!(
                symbol = %tx.symbol,
                account = %tx.account,
                date = %tx.date,
                "transaction date not parseable, left out of time series"
            ),
        }
    }

    let Some(&first) = by_date.keys().next() else {
        return Vec::new();
    };
    let dates: BTreeSet<NaiveDate> = by_date
        .keys()
        .copied()
        .chain(reference.quote_dates().filter(|d| *d >= first))
        .collect();

    let (_, points) = dates.into_iter().fold(
        (ReplayState::default(), Vec::new()),
        |(state, mut points), date| {
            let day = by_date.get(&date).map(Vec::as_slice).unwrap_or(&[]);
            let (state, point) = state.step(date, day, reference, settings);
            points.push(point);
            (state, points)
        },
    );
    points
}
