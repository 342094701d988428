//! Plain-text rendering of dashboard views for the CLI.

use std::fmt::Write;
use std::io;

use crate::domain::dashboard::{DashboardState, LoadState, Notice, Route};
use crate::domain::dropdown::CodeFilter;
use crate::domain::error::StockdashError;
use crate::domain::record::{RecordField, StockRecord};
use crate::domain::stats::{ChartPoint, SummaryStats, WindowStats, group_thousands};
use crate::domain::table::{PriceTrend, TableState, TableView};

const WIDTHS: [usize; 7] = [10, 12, 10, 10, 10, 10, 14];

pub fn render_table(view: &TableView<'_>, state: &TableState, filter: &CodeFilter) -> String {
    let mut out = String::new();
    match view {
        TableView::NoData => {
            out.push_str("No stock data available\n");
            if *filter != CodeFilter::All {
                out.push_str("Try selecting a different trade code or \"all\"\n");
            }
        }
        TableView::NoMatches { query } => {
            let _ = writeln!(out, "No records match \"{query}\"");
        }
        TableView::Rows(page) => {
            out.push_str(&header_line(state));
            out.push('\n');
            for row in &page.rows {
                out.push_str(&row_line(row.record, row.close_trend));
                out.push('\n');
            }
            let _ = writeln!(
                out,
                "Showing {} to {} of {} entries (page {}/{})",
                page.first_shown, page.last_shown, page.total_matches, page.page, page.total_pages
            );
            if !state.search.is_empty() {
                let _ = writeln!(out, "Search: \"{}\"", state.search);
            }
            if let Some(field) = state.sort_field {
                let _ = writeln!(out, "Sorted by {} ({})", field.name(), state.sort_order.as_str());
            }
        }
    }
    out
}

fn header_line(state: &TableState) -> String {
    let mut line = format!("{:>6} ", "ID");
    for (field, width) in RecordField::ALL.iter().zip(WIDTHS) {
        let mut label = field.label().to_string();
        if state.sort_field == Some(*field) {
            label.push(match state.sort_order {
                crate::domain::table::SortOrder::Asc => '^',
                crate::domain::table::SortOrder::Desc => 'v',
            });
        }
        let _ = write!(line, "{label:>width$} ");
    }
    line.trim_end().to_string()
}

pub fn row_line(record: &StockRecord, close_trend: PriceTrend) -> String {
    let mut line = format!("{:>6} ", record.id);
    for (field, width) in RecordField::ALL.iter().zip(WIDTHS) {
        let mut value = record.field(*field).to_string();
        if *field == RecordField::Close {
            value.push_str(match close_trend {
                PriceTrend::Up => "+",
                PriceTrend::Down => "-",
                PriceTrend::Flat => "",
            });
        }
        let _ = write!(line, "{value:>width$} ");
    }
    line.trim_end().to_string()
}

pub fn render_summary(stats: &SummaryStats, filter: &CodeFilter) -> String {
    let mut out = String::new();
    let sign = if stats.price_change >= 0.0 { "+" } else { "" };
    let _ = writeln!(out, "Trade code:    {}", filter.label());
    let _ = writeln!(
        out,
        "Latest price:  {:.2} ({sign}{:.2}, {sign}{:.2}%)",
        stats.last_price, stats.price_change, stats.price_change_percent
    );
    let _ = writeln!(out, "Average price: {:.2}", stats.avg_price);
    let _ = writeln!(
        out,
        "Price range:   {:.2} - {:.2}",
        stats.lowest_price, stats.highest_price
    );
    let _ = writeln!(out, "Total volume:  {}", group_thousands(stats.total_volume));
    let _ = writeln!(out, "Records:       {}", stats.total_records);
    out
}

pub fn render_chart_stats(points: &[ChartPoint], stats: &WindowStats) -> String {
    if points.is_empty() {
        return "No data available to display chart\n".to_string();
    }
    let mut out = String::new();
    let sign = if stats.price_change >= 0.0 { "+" } else { "" };
    let _ = writeln!(
        out,
        "Last {} records: min {:.2}  max {:.2}  avg {:.2}  volume {}  change {sign}{:.2}",
        points.len(),
        stats.min_price,
        stats.max_price,
        stats.avg_price,
        group_thousands(stats.total_volume),
        stats.price_change
    );
    out
}

/// Full-screen text of a `browse` session.
pub fn render_dashboard(state: &DashboardState) -> String {
    let mut out = String::new();
    for notice in &state.notices {
        let _ = writeln!(out, "{}", render_notice(notice));
    }

    if state.route == Route::Create {
        out.push_str("Create Stock\n");
        for field in RecordField::ALL {
            let _ = writeln!(out, "  {:<11} {}", field.name(), state.form.value(field));
        }
        if state.submitting {
            out.push_str("Creating...\n");
        }
        return out;
    }

    if let Some(err) = &state.codes_error {
        let _ = writeln!(out, "Error loading trade codes: {err}");
    }
    match &state.load {
        LoadState::Loading => out.push_str("Loading stock market data...\n"),
        LoadState::Refreshing => out.push_str("Updating data...\n"),
        LoadState::Failed(err) if state.records.is_empty() => {
            let _ = writeln!(out, "Error loading stock data: {err}");
            return out;
        }
        LoadState::Failed(err) => {
            let _ = writeln!(out, "Refresh failed, showing previous data: {err}");
        }
        LoadState::Idle | LoadState::Loaded => {}
    }
    if matches!(state.load, LoadState::Loading) {
        return out;
    }

    out.push_str(&render_summary(&state.summary(), state.code_filter()));
    out.push_str(&render_chart_stats(&state.chart(), &state.chart_stats()));
    out.push_str(&render_table(&state.table_view(), &state.table, state.code_filter()));

    if let Some(edit) = &state.editing {
        let _ = writeln!(out, "Editing {}: {}", edit.id(), row_line(&edit.draft, PriceTrend::Flat));
    }
    if let Some(id) = state.pending_delete {
        let _ = writeln!(out, "Are you sure you want to delete stock {id}? (confirm / dismiss)");
    }
    out
}

fn render_notice(notice: &Notice) -> String {
    let tag = if notice.is_error() { "error" } else { "ok" };
    format!("[{tag}] {}", notice.message())
}

/// Write records as CSV, header first, columns in table order.
pub fn write_csv<W: io::Write>(records: &[&StockRecord], out: W) -> Result<(), StockdashError> {
    let mut writer = csv::Writer::from_writer(out);
    let csv_err = |e: csv::Error| StockdashError::Io {
        reason: e.to_string(),
    };
    let mut header = vec!["id"];
    header.extend(RecordField::ALL.iter().map(|f| f.name()));
    writer.write_record(&header).map_err(csv_err)?;
    for record in records {
        let mut row = vec![record.id.to_string()];
        row.extend(RecordField::ALL.iter().map(|f| record.field(*f).to_string()));
        writer.write_record(&row).map_err(csv_err)?;
    }
    writer.flush()?;
    Ok(())
}
