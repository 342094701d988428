//! HTML templates using Askama, and the view models they render.

use askama::Template;

use crate::adapters::chart_svg::price_volume_svg;
use crate::domain::dashboard::{DashboardState, LoadState, Notice};
use crate::domain::dropdown::CodeFilter;
use crate::domain::form::StockForm;
use crate::domain::record::{RecordField, StockRecord};
use crate::domain::stats::group_thousands;
use crate::domain::table::{PageSize, PriceTrend, SortOrder, TableView};

use super::params::DashboardParams;

#[derive(Template)]
#[template(path = "base.html")]
pub struct BasePage<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}

pub struct NoticeView {
    pub class: &'static str,
    pub message: String,
}

impl NoticeView {
    fn all(notices: &[Notice]) -> Vec<Self> {
        notices
            .iter()
            .map(|n| NoticeView {
                class: if n.is_error() { "notice error" } else { "notice success" },
                message: n.message().to_string(),
            })
            .collect()
    }
}

pub struct HiddenField {
    pub name: &'static str,
    pub value: String,
}

fn hidden_fields(params: &DashboardParams, skip: &[&str]) -> Vec<HiddenField> {
    params
        .pairs()
        .into_iter()
        .filter(|(name, _)| !skip.contains(name))
        .map(|(name, value)| HiddenField { name, value })
        .collect()
}

pub struct OptionView {
    pub value: String,
    pub href: String,
    pub selected: bool,
}

pub struct CardView {
    pub title: &'static str,
    pub value: String,
    pub detail: String,
    pub class: &'static str,
}

pub struct HeaderView {
    pub label: &'static str,
    pub href: String,
    pub indicator: &'static str,
}

pub struct CellView {
    pub value: String,
    pub class: &'static str,
}

pub struct InputView {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: &'static str,
    /// Keyboard hint; empty for plain text.
    pub inputmode: &'static str,
    pub value: String,
}

impl InputView {
    /// Prices and volume are free text so wire values such as `2,285,416`
    /// survive a round trip; a date picker only when the value fits one.
    fn for_field(field: RecordField, value: &str) -> Self {
        let (kind, inputmode) = match field {
            RecordField::Date if value.is_empty() || is_plain_date(value) => ("date", ""),
            RecordField::Date | RecordField::TradeCode => ("text", ""),
            RecordField::Volume => ("text", "numeric"),
            RecordField::Open | RecordField::High | RecordField::Low | RecordField::Close => {
                ("text", "decimal")
            }
        };
        InputView {
            name: field.name(),
            label: field.label(),
            kind,
            inputmode,
            value: value.to_string(),
        }
    }
}

fn is_plain_date(value: &str) -> bool {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

pub struct RowView {
    pub id: i64,
    pub cells: Vec<CellView>,
    pub editing: bool,
    pub inputs: Vec<InputView>,
    pub edit_href: String,
    pub delete_href: String,
}

pub struct PageLinkView {
    pub number: usize,
    pub href: String,
    pub current: bool,
}

pub struct SizeOptionView {
    pub size: usize,
    pub href: String,
    pub selected: bool,
}

/// Body of the dashboard page; also the fragment returned to htmx.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardContent {
    pub notices: Vec<NoticeView>,
    pub load_error: String,
    pub refresh_failed: bool,

    pub code_label: String,
    pub dropdown_open: bool,
    pub codes_search: String,
    pub codes_error: String,
    pub options: Vec<OptionView>,
    pub codes_hidden: Vec<HiddenField>,

    pub cards: Vec<CardView>,
    pub chart_svg: String,
    pub chart_note: String,

    pub search: String,
    pub search_hidden: Vec<HiddenField>,
    pub headers: Vec<HeaderView>,
    pub rows: Vec<RowView>,
    pub empty_message: String,
    pub empty_hint: String,
    pub footer: String,
    pub prev_href: String,
    pub next_href: String,
    pub pages: Vec<PageLinkView>,
    pub sizes: Vec<SizeOptionView>,
    /// Current view without the edit row; target after a save or cancel.
    pub return_to: String,
}

impl DashboardContent {
    pub fn build(session: &DashboardState, params: &DashboardParams) -> Self {
        let (load_error, refresh_failed) = match &session.load {
            LoadState::Failed(err) if session.records.is_empty() => (err.clone(), false),
            LoadState::Failed(_) => (String::new(), true),
            _ => (String::new(), false),
        };

        let options = session
            .dropdown
            .options(&session.trade_codes)
            .into_iter()
            .map(|value| OptionView {
                value: value.to_string(),
                href: params.with_code(value).href(),
                selected: value == session.code_filter().value(),
            })
            .collect();

        let mut content = DashboardContent {
            notices: NoticeView::all(&session.notices),
            load_error,
            refresh_failed,
            code_label: session.code_filter().label().to_string(),
            dropdown_open: session.dropdown.open,
            codes_search: session.dropdown.search.clone(),
            codes_error: session.codes_error.clone().unwrap_or_default(),
            options,
            codes_hidden: hidden_fields(params, &["codes_q", "edit"]),
            cards: summary_cards(session),
            chart_svg: String::new(),
            chart_note: String::new(),
            search: params.table.search.clone(),
            search_hidden: hidden_fields(params, &["q", "page", "edit", "codes_q"]),
            headers: headers(params),
            rows: Vec::new(),
            empty_message: String::new(),
            empty_hint: String::new(),
            footer: String::new(),
            prev_href: String::new(),
            next_href: String::new(),
            pages: Vec::new(),
            sizes: PageSize::ALL
                .iter()
                .map(|size| SizeOptionView {
                    size: size.get(),
                    href: params.with_page_size(*size).href(),
                    selected: *size == params.table.page_size,
                })
                .collect(),
            return_to: params.settled().href(),
        };

        let points = session.chart();
        if !points.is_empty() {
            let window = session.chart_stats();
            content.chart_svg = price_volume_svg(&points);
            content.chart_note = format!(
                "Showing last {} records. Range {:.2} to {:.2}, change {}",
                points.len(),
                window.min_price,
                window.max_price,
                signed(window.price_change)
            );
        }

        match session.table_view() {
            TableView::NoData => {
                content.empty_message = "No stock data available".to_string();
                if *session.code_filter() != CodeFilter::All {
                    content.empty_hint =
                        "Try selecting a different trade code or \"all\".".to_string();
                }
            }
            TableView::NoMatches { query } => {
                content.empty_message = format!("No records match \"{query}\"");
            }
            TableView::Rows(page) => {
                content.footer = format!(
                    "Showing {} to {} of {} entries",
                    page.first_shown, page.last_shown, page.total_matches
                );
                if page.page > 1 {
                    content.prev_href = params.with_page(page.page - 1).href();
                }
                if page.page < page.total_pages {
                    content.next_href = params.with_page(page.page + 1).href();
                }
                content.pages = page
                    .page_links
                    .iter()
                    .map(|n| PageLinkView {
                        number: *n,
                        href: params.with_page(*n).href(),
                        current: *n == page.page,
                    })
                    .collect();
                let return_to = urlencoding::encode(&content.return_to).into_owned();
                content.rows = page
                    .rows
                    .iter()
                    .map(|row| {
                        let editing = session.editing.as_ref().filter(|e| e.id() == row.record.id);
                        RowView {
                            id: row.record.id,
                            cells: cells(row.record, row.open_trend, row.close_trend),
                            editing: editing.is_some(),
                            inputs: editing
                                .map(|e| {
                                    RecordField::ALL
                                        .iter()
                                        .map(|f| InputView::for_field(*f, e.draft.field(*f)))
                                        .collect()
                                })
                                .unwrap_or_default(),
                            edit_href: params.with_edit(row.record.id).href(),
                            delete_href: format!(
                                "/stocks/{}/delete?return_to={return_to}",
                                row.record.id
                            ),
                        }
                    })
                    .collect();
            }
        }
        content
    }
}

fn signed(value: f64) -> String {
    if value >= 0.0 {
        format!("+{value:.2}")
    } else {
        format!("{value:.2}")
    }
}

fn trend_class(value: f64) -> &'static str {
    if value >= 0.0 { "up" } else { "down" }
}

fn summary_cards(session: &DashboardState) -> Vec<CardView> {
    if session.records.is_empty() {
        return Vec::new();
    }
    let stats = session.summary();
    vec![
        CardView {
            title: "Latest Price",
            value: format!("${:.2}", stats.last_price),
            detail: format!(
                "{} ({}%)",
                signed(stats.price_change),
                signed(stats.price_change_percent)
            ),
            class: trend_class(stats.price_change),
        },
        CardView {
            title: "Average Price",
            value: format!("${:.2}", stats.avg_price),
            detail: format!("{} records", stats.total_records),
            class: "",
        },
        CardView {
            title: "Price Range",
            value: format!("${:.2} - ${:.2}", stats.lowest_price, stats.highest_price),
            detail: "Low - High".to_string(),
            class: "",
        },
        CardView {
            title: "Total Volume",
            value: group_thousands(stats.total_volume),
            detail: session.code_filter().label().to_string(),
            class: "",
        },
    ]
}

fn headers(params: &DashboardParams) -> Vec<HeaderView> {
    RecordField::ALL
        .iter()
        .map(|field| HeaderView {
            label: field.label(),
            href: params.with_sort(*field).href(),
            indicator: match (params.table.sort_field == Some(*field), params.table.sort_order) {
                (false, _) => "",
                (true, SortOrder::Asc) => "\u{25b2}",
                (true, SortOrder::Desc) => "\u{25bc}",
            },
        })
        .collect()
}

fn cells(record: &StockRecord, open: PriceTrend, close: PriceTrend) -> Vec<CellView> {
    RecordField::ALL
        .iter()
        .map(|field| CellView {
            value: record.field(*field).to_string(),
            class: match field {
                RecordField::Open => open.css_class(),
                RecordField::Close => close.css_class(),
                _ => "",
            },
        })
        .collect()
}

#[derive(Template)]
#[template(path = "create_form.html")]
pub struct CreateFormContent {
    pub notices: Vec<NoticeView>,
    pub inputs: Vec<InputView>,
}

impl CreateFormContent {
    pub fn build(form: &StockForm, notices: &[Notice]) -> Self {
        CreateFormContent {
            notices: NoticeView::all(notices),
            inputs: RecordField::ALL
                .iter()
                .map(|f| InputView::for_field(*f, form.value(*f)))
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "delete_confirm.html")]
pub struct DeleteConfirmContent {
    pub id: i64,
    pub summary: String,
    pub return_to: String,
}

impl DeleteConfirmContent {
    pub fn build(record: &StockRecord, return_to: &str) -> Self {
        DeleteConfirmContent {
            id: record.id,
            summary: format!("{} on {} (close {})", record.trade_code, record.date, record.close),
            return_to: return_to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::web::params::DashboardQuery;
    use crate::domain::dashboard::Event;

    fn record(id: i64, code: &str, date: &str, close: &str) -> StockRecord {
        StockRecord {
            id,
            date: date.into(),
            trade_code: code.into(),
            high: close.into(),
            low: close.into(),
            open: close.into(),
            close: close.into(),
            volume: "1000".into(),
        }
    }

    fn session(records: Vec<StockRecord>) -> DashboardState {
        let mut state = DashboardState::new(PageSize::Fifty);
        state.records = records;
        state.load = LoadState::Loaded;
        state.trade_codes = vec!["AAPL".into(), "GP".into()];
        state
    }

    fn params() -> DashboardParams {
        DashboardParams::from_query(&DashboardQuery::default(), PageSize::Fifty)
    }

    #[test]
    fn rows_cards_and_chart() {
        let state = session(vec![
            record(2, "AAPL", "2024-01-02", "12.0"),
            record(1, "AAPL", "2024-01-01", "10.0"),
        ]);
        let content = DashboardContent::build(&state, &params());
        assert_eq!(content.rows.len(), 2);
        assert_eq!(content.cards[0].value, "$12.00");
        assert_eq!(content.cards[0].class, "up");
        assert!(content.chart_svg.starts_with("<svg"));
        assert!(content.chart_note.contains("last 2 records"));
        assert_eq!(content.footer, "Showing 1 to 2 of 2 entries");
        assert_eq!(content.options[0].value, "all");
        assert!(content.options[0].selected);
    }

    #[test]
    fn empty_filtered_code_gets_a_hint() {
        let mut state = session(Vec::new());
        state.dropdown.select("GP");
        let content = DashboardContent::build(&state, &params());
        assert_eq!(content.empty_message, "No stock data available");
        assert!(!content.empty_hint.is_empty());
        assert!(content.cards.is_empty());
        assert!(content.chart_svg.is_empty());
    }

    #[test]
    fn edited_row_shows_inputs() {
        let mut state = session(vec![record(7, "GP", "2024-01-01", "3.5")]);
        state.update(Event::BeginEdit(7));
        let content = DashboardContent::build(&state, &params());
        assert!(content.rows[0].editing);
        assert_eq!(content.rows[0].inputs.len(), 7);
        assert_eq!(content.rows[0].inputs[0].kind, "date");
    }

    #[test]
    fn grouped_volume_stays_editable_text() {
        let mut wire = record(7, "GP", "2024-01-01T00:00:00", "3.5");
        wire.volume = "2,285,416".into();
        let mut state = session(vec![wire]);
        state.update(Event::BeginEdit(7));
        let content = DashboardContent::build(&state, &params());
        let inputs = &content.rows[0].inputs;
        let volume = inputs.iter().find(|i| i.name == "volume").unwrap();
        assert_eq!((volume.kind, volume.value.as_str()), ("text", "2,285,416"));
        assert_eq!(inputs[0].kind, "text");
        assert!(inputs.iter().all(|i| i.kind != "number"));
    }

    #[test]
    fn rendered_html_escapes_record_text() {
        let state = session(vec![record(1, "<b>X", "2024-01-01", "1")]);
        let html = DashboardContent::build(&state, &params()).render().unwrap();
        assert!(html.contains("&lt;b&gt;X"));
        assert!(!html.contains("<b>X"));
    }
}
