//! End-to-end pipeline tests: raw table text in, `PortfolioData` out.

mod common;

use approx::assert_relative_eq;
use common::*;
use portview::adapters::envelope::{Envelope, EnvelopeAdapter};
use portview::domain::error::{PortviewError, Table};
use portview::domain::measures::{
    account_breakdown, sector_allocation, select_holdings, summarize, time_series, AccountFilter,
    HoldingView,
};
use portview::domain::portfolio::PortfolioConfig;
use portview::domain::price_resolver::PriceSource;
use portview::pipeline::process;
use portview::ports::input_port::{InputPort, RawInputs};

mod holdings {
    use super::*;

    #[test]
    fn sell_with_realized_gain() {
        let input = raw(
            &[
                TxRow::buy("X", "A", "2024-01-01", 100.0, 1000.0),
                TxRow::buy("X", "A", "2024-01-01", -40.0, -400.0)
                    .realized(50.0)
                    .cash(450.0),
            ],
            &[("X", "Xylo Inc", "Industrials")],
            &[("X", "2024-01-02", 12.0)],
        );
        let data = run(&input);

        assert_eq!(data.holdings.len(), 1);
        let h = &data.holdings[0];
        assert_eq!(h.name, "Xylo Inc");
        assert_eq!(h.price_source, PriceSource::LatestQuote);
        assert_relative_eq!(h.quantity, 60.0);
        assert_relative_eq!(h.cost, 650.0);
        assert_relative_eq!(h.value, 720.0);
        assert_relative_eq!(h.unrealized_gain, 70.0);
        assert_relative_eq!(h.realized_gain, 50.0);
        assert_relative_eq!(h.cash_balance, -550.0);

        let s = &data.summary;
        assert_relative_eq!(s.cash, -550.0);
        assert_relative_eq!(s.equity, 720.0);
        assert_relative_eq!(s.total_value, 170.0);
        assert_relative_eq!(s.realized_gain, 50.0);
        assert_relative_eq!(s.unrealized_gain, 70.0);
        assert_eq!(s.holdings, 1);
    }

    #[test]
    fn closed_and_deposit_views() {
        let input = raw(
            &[
                TxRow::buy("Z", "A", "2024-01-01", 5.0, 50.0).status("YTD Clear"),
                TxRow::buy("Z", "A", "2024-01-03", -5.0, -50.0)
                    .status("YTD Clear")
                    .realized(20.0)
                    .cash(70.0),
                TxRow::buy("CD@2025", "Savings", "2024-01-01", 1000.0, 1000.0)
                    .status("Open Deposits"),
            ],
            &[],
            &[("CD", "2024-01-02", 0.98)],
        );
        let data = run(&input);

        assert!(data.holdings.is_empty());
        assert_eq!(data.closed_positions.len(), 1);
        let closed = &data.closed_positions[0];
        assert_eq!(closed.status, "YTD Clear");
        assert_relative_eq!(closed.quantity, 0.0);
        assert_relative_eq!(closed.realized_gain, 20.0);
        assert_relative_eq!(closed.unrealized_gain, 0.0);
        assert_relative_eq!(closed.total_return, 20.0);

        assert_eq!(data.open_deposits.len(), 1);
        let cd = &data.open_deposits[0];
        assert_eq!(cd.price_source, PriceSource::PrefixMatch);
        assert_relative_eq!(cd.value, 980.0);
        assert_eq!(cd.sector, "Unknown");
        assert!(data.closed_deposits.is_empty());
    }

    #[test]
    fn unknown_status_only_moves_cash() {
        let input = raw(
            &[
                TxRow::buy("X", "A", "2024-01-01", 10.0, 100.0),
                TxRow::buy("FEE", "A", "2024-01-01", 0.0, 0.0)
                    .status("Pending Review")
                    .cash(-5.0),
            ],
            &[],
            &[("X", "2024-01-01", 10.0)],
        );
        let data = run(&input);
        assert_eq!(data.holdings.len(), 1);
        assert!(data.closed_positions.is_empty());
        assert_relative_eq!(data.summary.cash, -105.0);
    }

    #[test]
    fn views_and_measures_by_account() {
        let input = raw(
            &[
                TxRow::buy("X", "IRA", "2024-01-02", 10.0, 100.0),
                TxRow::buy("Y", "Taxable", "2024-01-02", 4.0, 40.0),
            ],
            &[("X", "X Co", "Tech"), ("Y", "Y Co", "Energy")],
            &[("X", "2024-01-02", 15.0), ("Y", "2024-01-02", 10.0)],
        );
        let data = run(&input);

        let ira = select_holdings(&data, HoldingView::Open, &AccountFilter::Account("IRA".into()));
        assert_eq!(ira.len(), 1);
        assert_eq!(ira[0].symbol, "X");

        let totals = summarize(select_holdings(&data, HoldingView::Open, &AccountFilter::All));
        assert_relative_eq!(totals.value, 190.0);
        assert_relative_eq!(totals.unrealized_gain, 50.0);

        let sectors = sector_allocation(&data.holdings);
        assert_eq!(sectors[0].sector, "Tech");
        assert_relative_eq!(sectors[0].share_pct, 150.0 / 190.0 * 100.0);
    }
}

mod time_series_reconstruction {
    use super::*;

    #[test]
    fn two_accounts_merge_by_date() {
        let input = raw(
            &[
                TxRow::buy("X", "A", "2024-01-02", 10.0, 100.0).cash(0.0),
                TxRow::buy("Y", "B", "2024-01-02", 10.0, 80.0).cash(0.0),
            ],
            &[],
            &[("X", "2024-01-02", 10.0), ("Y", "2024-01-02", 10.0)],
        );
        let data = run(&input);

        assert_eq!(data.time_series.len(), 1);
        let p = &data.time_series[0];
        assert_relative_eq!(p.total_value, 200.0);
        assert_eq!(p.account_values.get("A"), Some(&100.0));
        assert_eq!(p.account_values.get("B"), Some(&100.0));

        let breakdown = account_breakdown(&data, date("2024-01-31"));
        assert_eq!(breakdown.len(), 2);

        let only_a = time_series(&data, &AccountFilter::Account("A".into()));
        assert_relative_eq!(only_a[0].total_value, 100.0);
        assert!(only_a[0].account_values.is_empty());
    }

    #[test]
    fn missing_quote_day_carries_last_valuation() {
        let input = raw(
            &[TxRow::buy("X", "A", "2024-01-02", 10.0, 100.0)],
            &[],
            &[
                ("X", "2024-01-02", 12.0),
                ("^GSPC", "2024-01-02", 4000.0),
                ("^GSPC", "2024-01-03", 4010.0),
            ],
        );
        let data = run(&input);
        let series = &data.time_series;
        assert_eq!(series.len(), 2);

        let day1 = point_on(series, "2024-01-02");
        assert!(day1.all_prices);
        assert_relative_eq!(day1.equity, 120.0);
        assert_relative_eq!(day1.total_value, 20.0);
        assert_relative_eq!(day1.benchmark, 4000.0);

        let day2 = point_on(series, "2024-01-03");
        assert!(day2.has_quotes);
        assert!(!day2.all_prices);
        assert_relative_eq!(day2.equity, 120.0);
        assert_relative_eq!(day2.unrealized_gain, 20.0);
        assert_relative_eq!(day2.benchmark, 4010.0);
    }

    #[test]
    fn deposits_replay_alongside_quoted_equities() {
        let input = raw(
            &[
                TxRow::buy("X", "A", "2024-01-02", 10.0, 100.0),
                TxRow::buy("BANK@2024", "A", "2024-01-02", 500.0, 500.0).status("Closed Deposits"),
                TxRow::buy("CD@2025", "A", "2024-01-03", 1000.0, 1000.0).status("Open Deposits"),
                TxRow::buy("BANK@2024", "A", "2024-01-04", -500.0, -500.0)
                    .status("Closed Deposits")
                    .realized(5.0)
                    .cash(505.0),
            ],
            &[],
            &[
                ("X", "2024-01-02", 10.0),
                ("X", "2024-01-03", 11.0),
                ("X", "2024-01-04", 20.0),
                ("X", "2024-01-05", 30.0),
                ("CD", "2024-01-05", 0.99),
            ],
        );
        let data = run(&input);
        let series = &data.time_series;
        assert_eq!(series.len(), 4);
        assert!(series.iter().all(|p| p.all_prices));

        let day1 = point_on(series, "2024-01-02");
        assert_relative_eq!(day1.cash, -600.0);
        assert_relative_eq!(day1.equity, 600.0);

        let day2 = point_on(series, "2024-01-03");
        assert_relative_eq!(day2.equity, 110.0 + 500.0 + 1000.0);
        assert_relative_eq!(day2.total_value, 10.0);

        let day3 = point_on(series, "2024-01-04");
        assert_relative_eq!(day3.cash, -1095.0);
        assert_relative_eq!(day3.equity, 1200.0);
        assert_relative_eq!(day3.realized_gain, 5.0);

        let last = point_on(series, "2024-01-05");
        assert_relative_eq!(last.equity, 300.0 + 990.0);
        assert_relative_eq!(last.unrealized_gain, 190.0);
        assert_relative_eq!(last.total_value, 195.0);

        assert_relative_eq!(data.summary.total_value, last.total_value);
        assert_relative_eq!(data.summary.unrealized_gain, last.unrealized_gain);
    }

    #[test]
    fn benchmark_can_be_switched_off() {
        let input = raw(
            &[TxRow::buy("X", "A", "2024-01-02", 1.0, 10.0)],
            &[],
            &[("X", "2024-01-02", 10.0), ("^GSPC", "2024-01-02", 4000.0)],
        );
        let config = PortfolioConfig {
            benchmark_symbol: None,
            ..PortfolioConfig::default()
        };
        let data = process(&input, &config).unwrap();
        assert_eq!(data.time_series[0].benchmark, 0.0);
    }

    #[test]
    fn mixed_date_formats_share_one_axis() {
        let input = raw(
            &[
                TxRow::buy("X", "A", "01/02/2024", 1.0, 10.0),
                TxRow::buy("X", "A", "2024-01-02", 1.0, 10.0),
                TxRow::buy("X", "A", "sometime", 1.0, 10.0),
            ],
            &[],
            &[("X", "2024-01-02", 10.0)],
        );
        let data = run(&input);
        assert_eq!(data.time_series.len(), 1);
        assert_eq!(data.transactions[0].date, "2024-01-02");
        assert_eq!(data.transactions[2].date, "sometime");
        // The undated row still counts toward holdings.
        assert_relative_eq!(data.holdings[0].quantity, 3.0);
    }
}

mod failures {
    use super::*;

    #[test]
    fn missing_table_is_reported() {
        let input = RawInputs {
            transactions: Some(transactions_csv(&[])),
            symbols: Some(symbols_csv(&[])),
            quotes: None,
        };
        let err = process(&input, &PortfolioConfig::default()).unwrap_err();
        assert!(matches!(err, PortviewError::InputMissing { table: Table::Quotes }));
    }

    #[test]
    fn overflowing_account_is_isolated() {
        let input = raw(
            &[
                TxRow::buy("X", "Huge", "2024-01-02", 1e308, 1.0),
                TxRow::buy("X", "Normal", "2024-01-02", 10.0, 100.0),
            ],
            &[],
            &[("X", "2024-01-02", 10.0)],
        );
        let data = run(&input);

        assert_eq!(data.failed_accounts.len(), 1);
        assert_eq!(data.failed_accounts[0].account, "Huge");
        assert!(data.account("Huge").is_none());
        assert_eq!(data.account_names().collect::<Vec<_>>(), vec!["Normal"]);
        assert_eq!(data.holdings.len(), 1);
        assert_relative_eq!(data.summary.equity, 100.0);
    }

    #[test]
    fn malformed_cells_degrade_to_zero() {
        let tx = format!("{TX_HEADER}\nX,A,2024-01-02,Open Items,ten,$100,,,,\n");
        let input = RawInputs::new(tx, symbols_csv(&[]), quotes_csv(&[("X", "2024-01-02", 10.0)]));
        let data = run(&input);
        // Zero quantity keeps it out of the open view.
        assert!(data.holdings.is_empty());
        assert_eq!(data.transactions[0].cost_change, 100.0);
    }
}

mod envelope_round_trip {
    use super::*;

    fn sample() -> RawInputs {
        raw(
            &[
                TxRow::buy("X", "A", "2024-01-02", 10.0, 100.0),
                TxRow::buy("Y", "B", "2024-01-03", 3.0, 30.0),
            ],
            &[("X", "X Co", "Tech")],
            &[
                ("X", "2024-01-02", 11.0),
                ("X", "2024-01-03", 12.0),
                ("Y", "2024-01-03", 9.0),
            ],
        )
    }

    #[test]
    fn import_reproduces_portfolio() {
        let input = sample();
        let direct = run(&input);

        let file = tempfile::NamedTempFile::new().unwrap();
        Envelope::from_inputs(&input).unwrap().write_to(file.path()).unwrap();
        let imported = EnvelopeAdapter::new(file.path().to_path_buf()).load().unwrap();

        assert_eq!(imported, input);
        assert_eq!(run(&imported), direct);
    }

    #[test]
    fn reprocessing_is_deterministic() {
        let port = MockInputPort::new(sample());
        let first = run(&port.load().unwrap());
        let second = run(&port.load().unwrap());
        assert_eq!(port.loads.get(), 2);
        assert_eq!(first, second);
    }
}

mod properties {
    use super::*;
    use portview::domain::holding::pct;
    use portview::domain::rollup::merge_time_series;
    use portview::domain::timeseries::TimeSeriesPoint;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn point(day: u32, total: f64) -> TimeSeriesPoint {
        TimeSeriesPoint {
            date: chrono::NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            cash: 0.0,
            equity: total,
            total_value: total,
            realized_gain: 0.0,
            unrealized_gain: 0.0,
            benchmark: 0.0,
            has_quotes: true,
            all_prices: true,
            account_values: BTreeMap::new(),
        }
    }

    proptest! {
        #[test]
        fn pct_never_divides_by_zero(n in -1e9f64..1e9) {
            prop_assert_eq!(pct(n, 0.0), 0.0);
            prop_assert!(pct(n, 1.0).is_finite());
        }

        #[test]
        fn tiny_residual_quantity_is_not_open(qty in 1.0f64..1000.0, residual in 0.0f64..0.00009) {
            let input = raw(
                &[
                    TxRow::buy("X", "A", "2024-01-02", qty, qty * 10.0),
                    TxRow::buy("X", "A", "2024-01-03", -(qty - residual), -(qty - residual) * 10.0),
                ],
                &[],
                &[("X", "2024-01-02", 10.0)],
            );
            let data = run(&input);
            prop_assert!(data.holdings.is_empty());
        }

        #[test]
        fn merged_total_is_sum_of_accounts(
            a in proptest::collection::btree_map(1u32..28, 0.0f64..1e6, 0..10),
            b in proptest::collection::btree_map(1u32..28, 0.0f64..1e6, 0..10),
        ) {
            let sa: Vec<_> = a.iter().map(|(d, v)| point(*d, *v)).collect();
            let sb: Vec<_> = b.iter().map(|(d, v)| point(*d, *v)).collect();
            let merged = merge_time_series([("A", sa.as_slice()), ("B", sb.as_slice())]);

            let days: std::collections::BTreeSet<u32> = a.keys().chain(b.keys()).copied().collect();
            prop_assert_eq!(merged.len(), days.len());
            for p in &merged {
                let sum: f64 = p.account_values.values().sum();
                prop_assert!((p.total_value - sum).abs() <= 1e-6 * (1.0 + sum.abs()));
            }
        }

        #[test]
        fn quiet_days_carry_only_unquoted_holdings(
            days in proptest::collection::vec((1.0f64..100.0, proptest::option::of(1.0f64..100.0)), 1..8),
        ) {
            let mut quotes = vec![
                ("X", "2024-01-01".to_string(), 10.0),
                ("Y", "2024-01-01".to_string(), 5.0),
            ];
            for (i, (px, py)) in days.iter().enumerate() {
                let day = format!("2024-01-{:02}", i + 2);
                quotes.push(("X", day.clone(), *px));
                if let Some(py) = py {
                    quotes.push(("Y", day, *py));
                }
            }
            let quote_rows: Vec<(&str, &str, f64)> =
                quotes.iter().map(|(s, d, c)| (*s, d.as_str(), *c)).collect();
            let input = raw(
                &[
                    TxRow::buy("X", "A", "2024-01-01", 10.0, 100.0),
                    TxRow::buy("Y", "A", "2024-01-01", 10.0, 50.0),
                    TxRow::buy("CD@2025", "A", "2024-01-01", 100.0, 100.0).status("Open Deposits"),
                ],
                &[],
                &quote_rows,
            );
            let data = run(&input);
            prop_assert_eq!(data.time_series.len(), days.len() + 1);

            let mut last_y = 5.0;
            for (i, (px, py)) in days.iter().enumerate() {
                if let Some(py) = py {
                    last_y = *py;
                }
                let p = &data.time_series[i + 1];
                let expected = -250.0 + 10.0 * px + 10.0 * last_y + 100.0;
                prop_assert!((p.total_value - expected).abs() < 1e-6, "{} total {} expected {}", p.date, p.total_value, expected);
                prop_assert_eq!(p.all_prices, py.is_some());
            }
        }

        #[test]
        fn open_position_value_never_drops_to_zero(missing in proptest::collection::vec(any::<bool>(), 1..8)) {
            let mut quotes = vec![("X", "2024-01-01".to_string(), 10.0)];
            for (i, skip) in missing.iter().enumerate() {
                let day = format!("2024-01-{:02}", i + 2);
                quotes.push(("^GSPC", day.clone(), 4000.0));
                if !skip {
                    quotes.push(("X", day, 10.0));
                }
            }
            let quote_rows: Vec<(&str, &str, f64)> =
                quotes.iter().map(|(s, d, c)| (*s, d.as_str(), *c)).collect();
            let input = raw(&[TxRow::buy("X", "A", "2024-01-01", 5.0, 50.0)], &[], &quote_rows);
            let data = run(&input);
            for p in &data.time_series {
                prop_assert!((p.equity - 50.0).abs() < 1e-9, "{} equity {}", p.date, p.equity);
            }
        }
    }
}
