//! Portfolio state: per-account views and the all-accounts rollup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::aggregation::{aggregate, aggregate_class, GroupBy, ZERO_QUANTITY_EPSILON};
use super::error::PortviewError;
use super::holding::{value_group, Holding, Valuation};
use super::reference::{Quote, ReferenceData};
use super::rollup::{flatten_holdings, merge_time_series};
use super::timeseries::{reconstruct, ReplaySettings, TimeSeriesPoint};
use super::transaction::{StatusClass, Transaction};

pub const DEFAULT_BENCHMARK: &str = "^GSPC";

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioConfig {
    /// Quote symbol carried alongside the series for comparison.
    pub benchmark_symbol: Option<String>,
    pub epsilon: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        PortfolioConfig {
            benchmark_symbol: Some(DEFAULT_BENCHMARK.to_string()),
            epsilon: ZERO_QUANTITY_EPSILON,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub cash: f64,
    pub equity: f64,
    pub realized_gain: f64,
    pub unrealized_gain: f64,
    pub holdings: usize,
}

impl PortfolioSummary {
    /// Summary from an account's cash, currently held positions and total
    /// realized gain.
    pub fn from_parts<'a, I>(cash: f64, held: I, realized_gain: f64) -> Self
    where
        I: IntoIterator<Item = &'a Holding>,
    {
        let mut summary = PortfolioSummary {
            cash,
            realized_gain,
            ..Default::default()
        };
        for h in held {
            summary.equity += h.value;
            summary.unrealized_gain += h.unrealized_gain;
            summary.holdings += 1;
        }
        summary.total_value = summary.cash + summary.equity;
        summary
    }

    /// Count value held outside the holding views, such as open time
    /// deposits.
    pub fn add_equity(&mut self, equity: f64, unrealized_gain: f64) {
        self.equity += equity;
        self.unrealized_gain += unrealized_gain;
        self.total_value = self.cash + self.equity;
    }

    pub fn combine<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a PortfolioSummary>,
    {
        parts
            .into_iter()
            .fold(PortfolioSummary::default(), |acc, s| PortfolioSummary {
                total_value: acc.total_value + s.total_value,
                cash: acc.cash + s.cash,
                equity: acc.equity + s.equity,
                realized_gain: acc.realized_gain + s.realized_gain,
                unrealized_gain: acc.unrealized_gain + s.unrealized_gain,
                holdings: acc.holdings + s.holdings,
            })
    }

    fn values(&self) -> [(&'static str, f64); 5] {
        [
            ("total_value", self.total_value),
            ("cash", self.cash),
            ("equity", self.equity),
            ("realized_gain", self.realized_gain),
            ("unrealized_gain", self.unrealized_gain),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPortfolio {
    pub account: String,
    pub cash_balance: f64,
    /// Currently held open positions.
    pub holdings: Vec<Holding>,
    pub closed_positions: Vec<Holding>,
    pub open_deposits: Vec<Holding>,
    pub closed_deposits: Vec<Holding>,
    pub time_series: Vec<TimeSeriesPoint>,
    pub summary: PortfolioSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountFailure {
    pub account: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioData {
    pub accounts: BTreeMap<String, AccountPortfolio>,
    pub holdings: Vec<Holding>,
    pub closed_positions: Vec<Holding>,
    pub open_deposits: Vec<Holding>,
    pub closed_deposits: Vec<Holding>,
    pub time_series: Vec<TimeSeriesPoint>,
    pub transactions: Vec<Transaction>,
    /// Parsed quotes with a positive, finite close; rows failing that are
    /// dropped when the reference data is indexed.
    pub quotes: Vec<Quote>,
    pub latest_quotes: BTreeMap<String, Quote>,
    pub summary: PortfolioSummary,
    /// Accounts whose processing failed; they are absent from every view.
    #[serde(default)]
    pub failed_accounts: Vec<AccountFailure>,
}

impl PortfolioData {
    pub fn empty() -> Self {
        PortfolioData::default()
    }

    pub fn account(&self, name: &str) -> Option<&AccountPortfolio> {
        self.accounts.get(name)
    }

    pub fn account_names(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_accounts.is_empty()
    }
}

fn value_class(
    transactions: &[Transaction],
    reference: &ReferenceData,
    config: &PortfolioConfig,
    class: StatusClass,
    cash_balance: f64,
) -> Vec<Holding> {
    let (group_by, include_zero) = match class {
        StatusClass::OpenPosition | StatusClass::OpenDeposit => (GroupBy::SymbolAccount, false),
        StatusClass::ClosedPosition => (GroupBy::SymbolAccountStatus, true),
        StatusClass::ClosedDeposit => (GroupBy::SymbolAccount, true),
    };
    let valuation = if class.is_fixed_income() {
        Valuation::FixedIncome
    } else {
        Valuation::Market
    };
    aggregate_class(transactions, class, group_by, include_zero, config.epsilon)
        .iter()
        .map(|g| value_group(g, reference, valuation, config.epsilon, cash_balance))
        .collect()
}

/// Equity and unrealized gain of time deposits still open, carried at their
/// last recorded price or at book cost, as the replay carries them.
fn open_time_deposits(transactions: &[Transaction], epsilon: f64) -> (f64, f64) {
    aggregate(
        transactions.iter().filter(|tx| tx.status.is_time_deposit()),
        GroupBy::SymbolAccount,
    )
    .iter()
    .filter(|g| !g.is_zero(epsilon))
    .fold((0.0, 0.0), |(equity, unrealized), g| {
        let value = g
            .net_price
            .map(|p| g.quantity * p)
            .unwrap_or_else(|| g.open_cost());
        (equity + value, unrealized + value - g.open_cost())
    })
}

fn ensure_finite(account: &AccountPortfolio) -> Result<(), PortviewError> {
    let fail = |field: &str| PortviewError::NonFiniteValue {
        account: account.account.clone(),
        field: field.to_string(),
    };

    let holdings = account
        .holdings
        .iter()
        .chain(&account.closed_positions)
        .chain(&account.open_deposits)
        .chain(&account.closed_deposits);
    for h in holdings {
        if let Some(field) = h.first_non_finite() {
            return Err(fail(&format!("{field} of {}", h.symbol)));
        }
    }
    for p in &account.time_series {
        if !(p.total_value.is_finite() && p.unrealized_gain.is_finite() && p.realized_gain.is_finite()) {
            return Err(fail(&format!("time series value on {}", p.date)));
        }
    }
    if let Some((field, _)) = account.summary.values().into_iter().find(|(_, v)| !v.is_finite()) {
        return Err(fail(field));
    }
    Ok(())
}

/// Build every view for one account.
///
/// `transactions` must already be restricted to `account`.
pub fn build_account(
    account: &str,
    transactions: &[Transaction],
    reference: &ReferenceData,
    config: &PortfolioConfig,
) -> Result<AccountPortfolio, PortviewError> {
    let cash_balance: f64 = transactions.iter().map(|t| t.cash_impact).sum();
    let realized: f64 = transactions
        .iter()
        .filter(|t| t.class().is_some())
        .map(|t| t.realized)
        .sum();

    let holdings = value_class(transactions, reference, config, StatusClass::OpenPosition, cash_balance);
    let closed_positions =
        value_class(transactions, reference, config, StatusClass::ClosedPosition, cash_balance);
    let open_deposits = value_class(transactions, reference, config, StatusClass::OpenDeposit, cash_balance);
    let closed_deposits =
        value_class(transactions, reference, config, StatusClass::ClosedDeposit, cash_balance);

    let settings = ReplaySettings {
        benchmark_symbol: config.benchmark_symbol.as_deref(),
        epsilon: config.epsilon,
    };
    let time_series = reconstruct(transactions, reference, &settings);

    let mut summary = PortfolioSummary::from_parts(
        cash_balance,
        holdings.iter().chain(&open_deposits),
        realized,
    );
    let (deposit_equity, deposit_unrealized) = open_time_deposits(transactions, config.epsilon);
    summary.add_equity(deposit_equity, deposit_unrealized);

    let built = AccountPortfolio {
        account: account.to_string(),
        cash_balance,
        holdings,
        closed_positions,
        open_deposits,
        closed_deposits,
        time_series,
        summary,
    };
    ensure_finite(&built)?;
    debug!(
        account,
        holdings = built.holdings.len(),
        points = built.time_series.len(),
        "account processed"
    );
    Ok(built)
}

/// Derive the full portfolio from parsed rows.
///
/// Accounts are processed independently against the shared reference data;
/// one failing account is reported in `failed_accounts` and leaves the
/// others untouched.
pub fn build_portfolio(
    transactions: Vec<Transaction>,
    reference: &ReferenceData,
    config: &PortfolioConfig,
) -> PortfolioData {
    let mut by_account: BTreeMap<String, Vec<Transaction>> = BTreeMap::new();
    for tx in &transactions {
        by_account.entry(tx.account.clone()).or_default().push(tx.clone());
    }

    let mut accounts = BTreeMap::new();
    let mut failed_accounts = Vec::new();
    for (name, rows) in &by_account {
        match build_account(name, rows, reference, config) {
            Ok(built) => {
                accounts.insert(name.clone(), built);
            }
            Err(e) => {
                warn!(account = %name, error = %e, "account processing failed");
                failed_accounts.push(AccountFailure {
                    account: name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let holdings = flatten_holdings(accounts.values().map(|a| a.holdings.as_slice()));
    let closed_positions =
        flatten_holdings(accounts.values().map(|a| a.closed_positions.as_slice()));
    let open_deposits = flatten_holdings(accounts.values().map(|a| a.open_deposits.as_slice()));
    let closed_deposits =
        flatten_holdings(accounts.values().map(|a| a.closed_deposits.as_slice()));

    let time_series = merge_time_series(
        accounts
            .values()
            .map(|a| (a.account.as_str(), a.time_series.as_slice())),
    );
    let summary = PortfolioSummary::combine(accounts.values().map(|a| &a.summary));

    info!(
        accounts = accounts.len(),
        failed = failed_accounts.len(),
        transactions = transactions.len(),
        "portfolio built"
    );

    PortfolioData {
        accounts,
        holdings,
        closed_positions,
        open_deposits,
        closed_deposits,
        time_series,
        transactions,
        quotes: reference.quotes().to_vec(),
        latest_quotes: reference
            .latest_quotes()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        summary,
        failed_accounts,
    }
}
