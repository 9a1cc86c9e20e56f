//! Turning aggregated groups into priced holdings.

use serde::{Deserialize, Serialize};

use super::aggregation::AggregatedGroup;
use super::price_resolver::{PriceChain, PriceSource, FALLBACK_PRICE};
use super::reference::ReferenceData;

/// Percentage of `numerator` over `|denominator|`; 0 for a zero or
/// non-finite denominator.
pub fn pct(numerator: f64, denominator: f64) -> f64 {
    let base = denominator.abs();
    if base == 0.0 || !base.is_finite() || !numerator.is_finite() {
        return 0.0;
    }
    numerator / base * 100.0
}

/// How a group is valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Valuation {
    /// Market instrument: quote-driven price chain.
    Market,
    /// Deposit / fixed income: price chain with prefix matching.
    FixedIncome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub account: String,
    pub name: String,
    pub sector: String,
    pub status: String,
    pub quantity: f64,
    /// Open cost: cost-basis changes plus realized return.
    pub cost: f64,
    /// Raw cost-basis sum without realized return.
    pub total_cost: f64,
    pub average_cost: f64,
    pub price: f64,
    pub price_source: PriceSource,
    pub value: f64,
    pub unrealized_gain: f64,
    pub unrealized_pct: f64,
    pub realized_gain: f64,
    pub realized_pct: f64,
    pub total_return: f64,
    pub total_return_pct: f64,
    pub debit: f64,
    pub cash_balance: f64,
}

impl Holding {
    fn numeric_fields(&self) -> [(&'static str, f64); 14] {
        [
            ("quantity", self.quantity),
            ("cost", self.cost),
            ("total_cost", self.total_cost),
            ("average_cost", self.average_cost),
            ("price", self.price),
            ("value", self.value),
            ("unrealized_gain", self.unrealized_gain),
            ("unrealized_pct", self.unrealized_pct),
            ("realized_gain", self.realized_gain),
            ("realized_pct", self.realized_pct),
            ("total_return", self.total_return),
            ("total_return_pct", self.total_return_pct),
            ("debit", self.debit),
            ("cash_balance", self.cash_balance),
        ]
    }

    /// Name of the first non-finite numeric field, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.numeric_fields()
            .into_iter()
            .find(|(_, v)| !v.is_finite())
            .map(|(name, _)| name)
    }
}

/// Price and value one group.
///
/// Closed-class and zero-quantity groups carry no unrealized gain; their
/// total return is the realized gain alone.
pub fn value_group(
    group: &AggregatedGroup,
    reference: &ReferenceData,
    valuation: Valuation,
    epsilon: f64,
    cash_balance: f64,
) -> Holding {
    let symbol = group.key.symbol.as_str();
    let chain = match valuation {
        Valuation::Market => PriceChain::market(reference, group.net_price),
        Valuation::FixedIncome => PriceChain::fixed_income(reference, group.net_price),
    };
    let (price, price_source) = chain
        .resolve(symbol, None)
        .unwrap_or((FALLBACK_PRICE, PriceSource::Fallback));

    let meta = reference.meta(symbol);
    let cost = group.open_cost();
    let value = group.quantity * price;
    let closed = group.is_closed() || group.is_zero(epsilon);

    let unrealized_gain = if closed { 0.0 } else { value - cost };
    let realized_gain = group.realized;
    let total_return = if closed {
        realized_gain
    } else {
        realized_gain + unrealized_gain
    };

    let return_base = if group.debit != 0.0 {
        group.debit
    } else {
        group.cost_change
    };
    let average_cost = if group.is_zero(epsilon) {
        0.0
    } else {
        cost / group.quantity.abs()
    };

    Holding {
        symbol: symbol.to_string(),
        account: group.key.account.clone(),
        name: meta.name,
        sector: meta.sector,
        status: group
            .key
            .status
            .clone()
            .or_else(|| group.class.map(|c| c.label().to_string()))
            .unwrap_or_default(),
        quantity: group.quantity,
        cost,
        total_cost: group.cost_change,
        average_cost,
        price,
        price_source,
        value,
        unrealized_gain,
        unrealized_pct: pct(unrealized_gain, cost),
        realized_gain,
        realized_pct: pct(realized_gain, return_base),
        total_return,
        total_return_pct: pct(total_return, return_base),
        debit: group.debit,
        cash_balance,
    }
}
