//! Property tests for the filter / sort / paginate pipeline and statistics.

use proptest::prelude::*;

use stockdash::domain::record::{RecordField, StockRecord};
use stockdash::domain::stats::{chart_series, summary_stats, window_stats};
use stockdash::domain::table::{
    PageSize, SortOrder, TableState, TableView, build_view, filter_and_sort, filter_records,
    sort_records, total_pages,
};

const CODES: [&str; 4] = ["AAPL", "GP", "ACI", "MSFT"];

fn record(id: i64, code: &str, n: u32) -> StockRecord {
    StockRecord {
        id,
        date: format!("20{:02}-{:02}-{:02}", 10 + n % 15, 1 + n % 12, 1 + n % 28),
        trade_code: code.to_string(),
        high: format!("{}.5", n + 1),
        low: format!("{}", n / 2),
        open: format!("{}.25", n),
        close: format!("{}.{:02}", n / 100, n % 100),
        volume: format!("{}", n * 7),
    }
}

fn records_strategy() -> impl Strategy<Value = Vec<StockRecord>> {
    proptest::collection::vec((0..CODES.len(), 0u32..5000), 0..80).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (c, n))| record(i as i64 + 1, CODES[c], n))
            .collect()
    })
}

/// Distinct values, so that sorting has no ties.
fn distinct_records() -> impl Strategy<Value = Vec<StockRecord>> {
    proptest::collection::hash_set(0u32..100_000, 0..60).prop_map(|values| {
        values
            .into_iter()
            .enumerate()
            .map(|(i, n)| {
                let mut r = record(i as i64 + 1, "GP", n);
                r.date = (chrono::NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
                    + chrono::Duration::days(n as i64))
                .format("%Y-%m-%d")
                .to_string();
                r
            })
            .collect()
    })
}

fn query_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("gp".to_string()),
        Just("AAPL".to_string()),
        Just("5".to_string()),
        "[0-9]{1,2}",
        "[a-z]{1,2}",
    ]
}

fn ids(rows: &[&StockRecord]) -> Vec<i64> {
    rows.iter().map(|r| r.id).collect()
}

proptest! {
    #[test]
    fn filtering_is_idempotent(records in records_strategy(), query in query_strategy()) {
        let once: Vec<StockRecord> = filter_records(&records, &query).into_iter().cloned().collect();
        let twice = filter_records(&once, &query);
        prop_assert_eq!(once.iter().map(|r| r.id).collect::<Vec<_>>(), ids(&twice));
    }

    #[test]
    fn filtering_keeps_input_order(records in records_strategy(), query in query_strategy()) {
        let kept = ids(&filter_records(&records, &query));
        let mut sorted = kept.clone();
        sorted.sort();
        prop_assert_eq!(kept, sorted);
    }

    #[test]
    fn reversed_sort_equals_flipped_direction(
        records in distinct_records(),
        field in prop_oneof![
            Just(RecordField::Close),
            Just(RecordField::Volume),
            Just(RecordField::Date),
        ],
    ) {
        let mut asc: Vec<&StockRecord> = records.iter().collect();
        sort_records(&mut asc, field, SortOrder::Asc);
        let mut desc: Vec<&StockRecord> = records.iter().collect();
        sort_records(&mut desc, field, SortOrder::Desc);
        asc.reverse();
        prop_assert_eq!(ids(&asc), ids(&desc));
    }

    #[test]
    fn pages_concatenate_to_the_full_result(
        records in records_strategy(),
        query in query_strategy(),
        size in prop_oneof![
            Just(PageSize::TwentyFive),
            Just(PageSize::Fifty),
            Just(PageSize::Hundred),
        ],
        sort in prop_oneof![
            Just(None),
            Just(Some(RecordField::Close)),
            Just(Some(RecordField::TradeCode)),
        ],
    ) {
        let mut state = TableState::new(size);
        state.set_search(query);
        state.set_sort(sort, SortOrder::Desc);
        let expected = ids(&filter_and_sort(&records, &state));
        let pages = total_pages(expected.len(), size);

        let mut seen = Vec::new();
        for page in 1..=pages {
            state.page = page;
            match build_view(&records, &state) {
                TableView::Rows(view) => {
                    prop_assert!(view.rows.len() <= size.get());
                    prop_assert_eq!(view.page, page);
                    seen.extend(view.rows.iter().map(|row| row.record.id));
                }
                _ => prop_assert!(false, "page {} of {} rendered no rows", page, pages),
            }
        }
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn statistics_are_always_finite(records in records_strategy()) {
        let summary = summary_stats(&records);
        let window = window_stats(&chart_series(&records));
        for value in [
            summary.total_volume,
            summary.avg_price,
            summary.last_price,
            summary.price_change,
            summary.price_change_percent,
            summary.highest_price,
            summary.lowest_price,
            window.min_price,
            window.max_price,
            window.avg_price,
            window.total_volume,
            window.price_change,
        ] {
            prop_assert!(value.is_finite());
        }
        prop_assert!(chart_series(&records).len() <= 30);
    }
}

#[test]
fn empty_window_is_all_zero() {
    let window = window_stats(&[]);
    assert_eq!(window.min_price, 0.0);
    assert_eq!(window.max_price, 0.0);
    assert_eq!(window.avg_price, 0.0);
    assert_eq!(window.total_volume, 0.0);
    assert_eq!(window.price_change, 0.0);
}

#[test]
fn trade_code_query_selects_only_that_code() {
    let records = vec![record(1, "AAPL", 10), record(2, "MSFT", 11)];
    let hits = filter_records(&records, "AAPL");
    assert_eq!(ids(&hits), vec![1]);
}

#[test]
fn three_day_example() {
    // newest first: 11, 12, 10
    let mut records = vec![
        record(3, "GP", 0),
        record(2, "GP", 0),
        record(1, "GP", 0),
    ];
    for (r, (close, volume)) in records
        .iter_mut()
        .zip([("11", "300"), ("12", "200"), ("10", "100")])
    {
        r.close = close.into();
        r.volume = volume.into();
    }

    let summary = summary_stats(&records);
    approx::assert_relative_eq!(summary.avg_price, 11.0);
    approx::assert_relative_eq!(summary.last_price, 11.0);
    approx::assert_relative_eq!(summary.price_change, -1.0);
    approx::assert_relative_eq!(summary.price_change_percent, -100.0 / 12.0);
    approx::assert_relative_eq!(summary.highest_price, 12.0);
    approx::assert_relative_eq!(summary.lowest_price, 10.0);
    approx::assert_relative_eq!(summary.total_volume, 600.0);

    let window = window_stats(&chart_series(&records));
    approx::assert_relative_eq!(window.price_change, 1.0);
    approx::assert_relative_eq!(window.avg_price, 11.0);
}
