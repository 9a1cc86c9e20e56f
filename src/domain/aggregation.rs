//! Grouping transactions into positions.
//!
//! Every holding view is the same reduction with a different status-class
//! filter: sum the signed fields per key, in transaction order.

use std::collections::BTreeMap;

use super::transaction::{StatusClass, Transaction};

/// Net quantities below this are treated as a fully closed position.
pub const ZERO_QUANTITY_EPSILON: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    SymbolAccount,
    /// Adds the display status, so `Cleared-RE` rows merge with `Cleared`.
    SymbolAccountStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupKey {
    pub account: String,
    pub symbol: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedGroup {
    pub key: GroupKey,
    pub class: Option<StatusClass>,
    pub quantity: f64,
    pub cost_change: f64,
    pub realized: f64,
    pub debit: f64,
    /// Last positive net price seen in transaction order.
    pub net_price: Option<f64>,
    pub transactions: usize,
}

impl AggregatedGroup {
    fn new(key: GroupKey, class: Option<StatusClass>) -> Self {
        AggregatedGroup {
            key,
            class,
            quantity: 0.0,
            cost_change: 0.0,
            realized: 0.0,
            debit: 0.0,
            net_price: None,
            transactions: 0,
        }
    }

    fn apply(&mut self, tx: &Transaction) {
        self.quantity += tx.quantity_change;
        self.cost_change += tx.cost_change;
        self.realized += tx.realized;
        self.debit += tx.debit;
        if tx.net_price > 0.0 {
            self.net_price = Some(tx.net_price);
        }
        self.transactions += 1;
    }

    /// Book cost: cost-basis changes plus realized-return contributions.
    pub fn open_cost(&self) -> f64 {
        self.cost_change + self.realized
    }

    pub fn is_zero(&self, epsilon: f64) -> bool {
        self.quantity.abs() < epsilon
    }

    pub fn is_closed(&self) -> bool {
        self.class.is_some_and(StatusClass::is_closed)
    }
}

/// Reduce `transactions` to one group per key, ordered by key.
pub fn aggregate<'a, I>(transactions: I, group_by: GroupBy) -> Vec<AggregatedGroup>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut groups: BTreeMap<GroupKey, AggregatedGroup> = BTreeMap::new();
    for tx in transactions {
        let key = GroupKey {
            account: tx.account.clone(),
            symbol: tx.symbol.clone(),
            status: match group_by {
                GroupBy::SymbolAccount => None,
                GroupBy::SymbolAccountStatus => Some(tx.status.display().to_string()),
            },
        };
        groups
            .entry(key.clone())
            .or_insert_with(|| AggregatedGroup::new(key, tx.class()))
            .apply(tx);
    }
    groups.into_values().collect()
}

/// Aggregate only the rows of one status class.
///
/// Groups whose net quantity is within `epsilon` of zero are dropped unless
/// `include_zero` is set, which closed-position reporting needs.
pub fn aggregate_class(
    transactions: &[Transaction],
    class: StatusClass,
    group_by: GroupBy,
    include_zero: bool,
    epsilon: f64,
) -> Vec<AggregatedGroup> {
    aggregate(
        transactions.iter().filter(|tx| tx.class() == Some(class)),
        group_by,
    )
    .into_iter()
    .filter(|g| include_zero || !g.is_zero(epsilon))
    .collect()
}
