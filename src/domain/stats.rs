//! Derived statistics for the chart overlay and the summary cards.
//!
//! The two call sites measure price change against different baselines:
//! the chart compares the last point of its window with the first, the
//! headline card compares the most recent record with the one before it.
//! Both are kept as-is.

use chrono::NaiveDate;

use crate::domain::record::{StockRecord, parse_date, parse_price, parse_volume};

/// Number of most recent records plotted on the chart.
pub const CHART_WINDOW: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    /// Short axis label, e.g. `Jan 05`.
    pub label: String,
    pub date: String,
    /// `None` when the close does not parse; such points carry volume only.
    pub close: Option<f64>,
    pub volume: f64,
}

/// Records arrive newest first; return the last [`CHART_WINDOW`] in
/// chronological order.
pub fn chart_series(records: &[StockRecord]) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = records.iter().rev().map(chart_point).collect();
    if points.len() > CHART_WINDOW {
        points.drain(..points.len() - CHART_WINDOW);
    }
    points
}

fn chart_point(record: &StockRecord) -> ChartPoint {
    ChartPoint {
        label: axis_label(&record.date),
        date: record.date.clone(),
        close: parse_price(&record.close),
        volume: parse_volume(&record.volume).unwrap_or(0) as f64,
    }
}

fn axis_label(date: &str) -> String {
    parse_date(date)
        .map(|d: NaiveDate| d.format("%b %d").to_string())
        .unwrap_or_else(|| date.to_string())
}

/// Aggregates over the chart window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowStats {
    pub min_price: f64,
    pub max_price: f64,
    pub avg_price: f64,
    pub total_volume: f64,
    /// Last parseable close minus the first parseable close in the window.
    pub price_change: f64,
}

/// Price figures cover parseable closes only; volume covers every point.
pub fn window_stats(points: &[ChartPoint]) -> WindowStats {
    if points.is_empty() {
        return WindowStats::default();
    }
    let closes: Vec<f64> = points.iter().filter_map(|p| p.close).collect();
    let range = PriceRange::of(&closes);
    let price_change = match closes.as_slice() {
        [first, .., last] => last - first,
        _ => 0.0,
    };
    WindowStats {
        min_price: range.min,
        max_price: range.max,
        avg_price: range.avg,
        total_volume: points.iter().map(|p| p.volume).sum(),
        price_change,
    }
}

/// Aggregates over the whole fetched set for the stat cards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SummaryStats {
    pub total_volume: f64,
    pub avg_price: f64,
    pub last_price: f64,
    /// Most recent close minus the one before it.
    pub price_change: f64,
    pub price_change_percent: f64,
    pub highest_price: f64,
    pub lowest_price: f64,
    pub total_records: usize,
}

/// `records` must be newest first, as the backend returns them.
pub fn summary_stats(records: &[StockRecord]) -> SummaryStats {
    if records.is_empty() {
        return SummaryStats::default();
    }

    let closes: Vec<f64> = records.iter().filter_map(StockRecord::close_value).collect();
    let range = PriceRange::of(&closes);

    let last_price = records[0].close_value().unwrap_or(0.0);
    let previous_price = records
        .get(1)
        .map(|r| r.close_value().unwrap_or(0.0))
        .unwrap_or(last_price);
    let price_change = last_price - previous_price;
    let price_change_percent = if previous_price != 0.0 {
        price_change / previous_price * 100.0
    } else {
        0.0
    };

    SummaryStats {
        total_volume: records
            .iter()
            .map(|r| r.volume_value().unwrap_or(0) as f64)
            .sum(),
        avg_price: range.avg,
        last_price,
        price_change,
        price_change_percent,
        highest_price: range.max,
        lowest_price: range.min,
        total_records: records.len(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PriceRange {
    min: f64,
    max: f64,
    avg: f64,
}

impl PriceRange {
    fn of(prices: &[f64]) -> Self {
        if prices.is_empty() {
            return Self::default();
        }
        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = prices.iter().sum::<f64>() / prices.len() as f64;
        Self { min, max, avg }
    }
}

/// `1234567` -> `1,234,567`.
pub fn group_thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(id: i64, date: &str, close: &str, volume: &str) -> StockRecord {
        StockRecord {
            id,
            date: date.into(),
            trade_code: "AAPL".into(),
            high: close.into(),
            low: close.into(),
            open: close.into(),
            close: close.into(),
            volume: volume.into(),
        }
    }

    /// Closes 10, 12, 11 oldest to newest, delivered newest first.
    fn three_days() -> Vec<StockRecord> {
        vec![
            record(3, "2024-01-03", "11.0", "300"),
            record(2, "2024-01-02", "12.0", "200"),
            record(1, "2024-01-01", "10.0", "100"),
        ]
    }

    #[test]
    fn chart_series_is_chronological() {
        let points = chart_series(&three_days());
        let closes: Vec<Option<f64>> = points.iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![Some(10.0), Some(12.0), Some(11.0)]);
        assert_eq!(points[0].label, "Jan 01");
    }

    #[test]
    fn chart_series_keeps_most_recent_thirty() {
        let records: Vec<StockRecord> = (0..45)
            .map(|i| record(i, "2024-01-01", &format!("{}", 100 - i), "1"))
            .collect();
        let points = chart_series(&records);
        assert_eq!(points.len(), CHART_WINDOW);
        // newest record (index 0, close 100) ends the window
        assert_eq!(points.last().and_then(|p| p.close), Some(100.0));
        assert_eq!(points[0].close, Some(71.0));
    }

    #[test]
    fn window_stats_three_day_scenario() {
        let stats = window_stats(&chart_series(&three_days()));
        assert_relative_eq!(stats.avg_price, 11.0);
        assert_relative_eq!(stats.min_price, 10.0);
        assert_relative_eq!(stats.max_price, 12.0);
        assert_relative_eq!(stats.price_change, 1.0);
        assert_relative_eq!(stats.total_volume, 600.0);
    }

    #[test]
    fn window_stats_single_point_has_no_change() {
        let stats = window_stats(&chart_series(&three_days()[..1]));
        assert_relative_eq!(stats.price_change, 0.0);
        assert_relative_eq!(stats.avg_price, 11.0);
    }

    #[test]
    fn empty_window_is_all_zero() {
        let stats = window_stats(&[]);
        assert_eq!(stats, WindowStats::default());
        assert!(!stats.avg_price.is_nan());

        let summary = summary_stats(&[]);
        assert_eq!(summary, SummaryStats::default());
        assert!(!summary.avg_price.is_nan());
        assert!(!summary.price_change_percent.is_nan());
    }

    #[test]
    fn summary_uses_most_recent_two_for_change() {
        let summary = summary_stats(&three_days());
        assert_relative_eq!(summary.last_price, 11.0);
        assert_relative_eq!(summary.price_change, -1.0);
        assert_relative_eq!(summary.price_change_percent, -100.0 / 12.0);
        assert_relative_eq!(summary.highest_price, 12.0);
        assert_relative_eq!(summary.lowest_price, 10.0);
        assert_relative_eq!(summary.total_volume, 600.0);
        assert_eq!(summary.total_records, 3);
    }

    #[test]
    fn summary_single_record_has_zero_change() {
        let summary = summary_stats(&three_days()[..1]);
        assert_relative_eq!(summary.price_change, 0.0);
        assert_relative_eq!(summary.price_change_percent, 0.0);
    }

    #[test]
    fn summary_zero_previous_price_guards_percent() {
        let records = vec![
            record(2, "2024-01-02", "5.0", "1"),
            record(1, "2024-01-01", "0", "1"),
        ];
        let summary = summary_stats(&records);
        assert_relative_eq!(summary.price_change, 5.0);
        assert_relative_eq!(summary.price_change_percent, 0.0);
    }

    #[test]
    fn unparseable_values_do_not_poison_results() {
        let records = vec![
            record(2, "2024-01-02", "oops", "1,000"),
            record(1, "2024-01-01", "4.0", "n/a"),
        ];
        let summary = summary_stats(&records);
        assert_relative_eq!(summary.avg_price, 4.0);
        assert_relative_eq!(summary.total_volume, 1000.0);
        assert!(!summary.price_change.is_nan());
    }

    #[test]
    fn unparseable_closes_are_left_out_of_the_window() {
        let records = vec![
            record(3, "2024-01-03", "10.0", "100"),
            record(2, "2024-01-02", "n/a", "100"),
            record(1, "2024-01-01", "11.0", "100"),
        ];
        let stats = window_stats(&chart_series(&records));
        assert_relative_eq!(stats.min_price, 10.0);
        assert_relative_eq!(stats.max_price, 11.0);
        assert_relative_eq!(stats.avg_price, 10.5);
        assert_relative_eq!(stats.total_volume, 300.0);
        assert_relative_eq!(stats.price_change, -1.0);

        let summary = summary_stats(&records);
        assert_relative_eq!(summary.lowest_price, stats.min_price);
        assert_relative_eq!(summary.avg_price, stats.avg_price);
    }

    #[test]
    fn window_change_skips_unparseable_edges() {
        let records = vec![
            record(4, "2024-01-04", "oops", "1"),
            record(3, "2024-01-03", "12.0", "1"),
            record(2, "2024-01-02", "9.0", "1"),
            record(1, "2024-01-01", "", "1"),
        ];
        let stats = window_stats(&chart_series(&records));
        assert_relative_eq!(stats.price_change, 3.0);

        let lone = window_stats(&chart_series(&records[..2]));
        assert_relative_eq!(lone.price_change, 0.0);
        assert_relative_eq!(lone.avg_price, 12.0);
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(1_234_567.4), "1,234,567");
        assert_eq!(group_thousands(-4500.0), "-4,500");
    }
}
