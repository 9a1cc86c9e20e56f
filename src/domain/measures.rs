//! Read-only measures over a built portfolio.
//!
//! Every measure is a function of `(PortfolioData, filter)`; nothing here
//! re-aggregates transactions.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::holding::{pct, Holding};
use super::portfolio::PortfolioData;
use super::timeseries::TimeSeriesPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldingView {
    Open,
    Closed,
    OpenDeposits,
    ClosedDeposits,
}

impl std::str::FromStr for HoldingView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(HoldingView::Open),
            "closed" => Ok(HoldingView::Closed),
            "open-deposits" => Ok(HoldingView::OpenDeposits),
            "closed-deposits" => Ok(HoldingView::ClosedDeposits),
            other => Err(format!("unknown holding view: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountFilter {
    All,
    Account(String),
}

impl AccountFilter {
    pub fn from_option(name: Option<&str>) -> Self {
        match name {
            Some(n) if !n.trim().is_empty() => AccountFilter::Account(n.trim().to_string()),
            _ => AccountFilter::All,
        }
    }
}

/// Holdings of one view, for all accounts or one of them. An unknown account
/// yields an empty slice.
pub fn select_holdings<'a>(
    data: &'a PortfolioData,
    view: HoldingView,
    filter: &AccountFilter,
) -> &'a [Holding] {
    match filter {
        AccountFilter::All => match view {
            HoldingView::Open => data.holdings.as_slice(),
            HoldingView::Closed => data.closed_positions.as_slice(),
            HoldingView::OpenDeposits => data.open_deposits.as_slice(),
            HoldingView::ClosedDeposits => data.closed_deposits.as_slice(),
        },
        AccountFilter::Account(name) => match data.account(name) {
            Some(acct) => match view {
                HoldingView::Open => acct.holdings.as_slice(),
                HoldingView::Closed => acct.closed_positions.as_slice(),
                HoldingView::OpenDeposits => acct.open_deposits.as_slice(),
                HoldingView::ClosedDeposits => acct.closed_deposits.as_slice(),
            },
            None => &[],
        },
    }
}

/// Merged series for all accounts, or one account's own series.
pub fn time_series<'a>(data: &'a PortfolioData, filter: &AccountFilter) -> &'a [TimeSeriesPoint] {
    match filter {
        AccountFilter::All => data.time_series.as_slice(),
        AccountFilter::Account(name) => data
            .account(name)
            .map(|a| a.time_series.as_slice())
            .unwrap_or(&[]),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HoldingTotals {
    pub count: usize,
    pub value: f64,
    pub cost: f64,
    pub unrealized_gain: f64,
    pub unrealized_pct: f64,
    pub realized_gain: f64,
    pub total_return: f64,
}

pub fn summarize(holdings: &[Holding]) -> HoldingTotals {
    let mut totals = holdings.iter().fold(HoldingTotals::default(), |mut t, h| {
        t.count += 1;
        t.value += h.value;
        t.cost += h.cost;
        t.unrealized_gain += h.unrealized_gain;
        t.realized_gain += h.realized_gain;
        t.total_return += h.total_return;
        t
    });
    totals.unrealized_pct = pct(totals.unrealized_gain, totals.cost);
    totals
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorShare {
    pub sector: String,
    pub value: f64,
    pub share_pct: f64,
}

/// Market value by sector, largest first; ties by sector name.
pub fn sector_allocation(holdings: &[Holding]) -> Vec<SectorShare> {
    let mut by_sector: BTreeMap<&str, f64> = BTreeMap::new();
    for h in holdings {
        *by_sector.entry(h.sector.as_str()).or_insert(0.0) += h.value;
    }
    let total: f64 = by_sector.values().sum();

    let mut shares: Vec<SectorShare> = by_sector
        .into_iter()
        .map(|(sector, value)| SectorShare {
            sector: sector.to_string(),
            value,
            share_pct: pct(value, total),
        })
        .collect();
    shares.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.sector.cmp(&b.sector)));
    shares
}

/// Per-account totals from the merged series at the latest point on or
/// before `date`.
pub fn account_breakdown(data: &PortfolioData, date: NaiveDate) -> BTreeMap<String, f64> {
    data.time_series
        .iter()
        .take_while(|p| p.date <= date)
        .last()
        .map(|p| p.account_values.clone())
        .unwrap_or_default()
}
