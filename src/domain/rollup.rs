//! Merging per-account results into the all-accounts view.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::holding::Holding;
use super::timeseries::TimeSeriesPoint;

/// Merge per-account series by date.
///
/// For each date in the union, sums cash, equity, total, realized and
/// unrealized over the accounts that have a point on that date, takes the
/// first non-zero benchmark, ORs `has_quotes`, ANDs `all_prices`, and records
/// every contributing account's total value.
pub fn merge_time_series<'a, I>(series: I) -> Vec<TimeSeriesPoint>
where
    I: IntoIterator<Item = (&'a str, &'a [TimeSeriesPoint])>,
{
    let mut merged: BTreeMap<NaiveDate, TimeSeriesPoint> = BTreeMap::new();

    for (account, points) in series {
        for point in points {
            let slot = merged.entry(point.date).or_insert_with(|| TimeSeriesPoint {
                date: point.date,
                cash: 0.0,
                equity: 0.0,
                total_value: 0.0,
                realized_gain: 0.0,
                unrealized_gain: 0.0,
                benchmark: 0.0,
                has_quotes: false,
                all_prices: true,
                account_values: BTreeMap::new(),
            });
            slot.cash += point.cash;
            slot.equity += point.equity;
            slot.total_value += point.total_value;
            slot.realized_gain += point.realized_gain;
            slot.unrealized_gain += point.unrealized_gain;
            if slot.benchmark == 0.0 && point.benchmark != 0.0 {
                slot.benchmark = point.benchmark;
            }
            slot.has_quotes |= point.has_quotes;
            slot.all_prices &= point.all_prices;
            *slot.account_values.entry(account.to_string()).or_insert(0.0) += point.total_value;
        }
    }

    merged.into_values().collect()
}

/// Concatenate holdings from every account, in account order.
pub fn flatten_holdings<'a, I>(per_account: I) -> Vec<Holding>
where
    I: IntoIterator<Item = &'a [Holding]>,
{
    per_account.into_iter().flatten().cloned().collect()
}
