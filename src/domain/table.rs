//! Filter, sort and paginate pipeline over the fetched record set.

use std::cmp::Ordering;

use crate::domain::record::{RecordField, StockRecord, parse_date, parse_price, parse_volume};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    TwentyFive,
    #[default]
    Fifty,
    Hundred,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::TwentyFive, PageSize::Fifty, PageSize::Hundred];

    pub fn get(self) -> usize {
        match self {
            PageSize::TwentyFive => 25,
            PageSize::Fifty => 50,
            PageSize::Hundred => 100,
        }
    }

    pub fn from_count(n: usize) -> Option<Self> {
        match n {
            25 => Some(PageSize::TwentyFive),
            50 => Some(PageSize::Fifty),
            100 => Some(PageSize::Hundred),
            _ => None,
        }
    }
}

/// Per-view table state. Not persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableState {
    pub search: String,
    pub sort_field: Option<RecordField>,
    pub sort_order: SortOrder,
    pub page: usize,
    pub page_size: PageSize,
}

impl TableState {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page: 1,
            page_size,
            ..Self::default()
        }
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if search != self.search {
            self.search = search;
            self.page = 1;
        }
    }

    /// Header click: same field flips direction, a new field sorts ascending.
    pub fn toggle_sort(&mut self, field: RecordField) {
        if self.sort_field == Some(field) {
            self.sort_order = self.sort_order.flipped();
        } else {
            self.sort_field = Some(field);
            self.sort_order = SortOrder::Asc;
        }
        self.page = 1;
    }

    pub fn set_sort(&mut self, field: Option<RecordField>, order: SortOrder) {
        if self.sort_field != field || self.sort_order != order {
            self.sort_field = field;
            self.sort_order = order;
            self.page = 1;
        }
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.page = 1;
    }

    /// Clamp into `[1, total_pages]`; with no pages the index stays at 1.
    pub fn go_to_page(&mut self, page: usize, total_pages: usize) {
        self.page = page.min(total_pages).max(1);
    }

    /// Upstream trade code filter changed: back to defaults, keep page size.
    pub fn reset(&mut self) {
        *self = Self::new(self.page_size);
    }
}

/// Whether `record` matches the free-text `query`.
///
/// Trade code is compared case-insensitively; the other columns are matched
/// on their raw text.
pub fn matches_query(record: &StockRecord, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let lowered = query.to_lowercase();
    record.trade_code.to_lowercase().contains(&lowered)
        || record.date.contains(query)
        || record.open.contains(query)
        || record.high.contains(query)
        || record.low.contains(query)
        || record.close.contains(query)
        || record.volume.contains(query)
}

pub fn filter_records<'a>(records: &'a [StockRecord], query: &str) -> Vec<&'a StockRecord> {
    records.iter().filter(|r| matches_query(r, query)).collect()
}

/// Type-aware comparison. Unparseable values order before parseable ones.
pub fn compare_by(a: &StockRecord, b: &StockRecord, field: RecordField) -> Ordering {
    match field {
        RecordField::Open | RecordField::High | RecordField::Low | RecordField::Close => {
            cmp_option(parse_price(a.field(field)), parse_price(b.field(field)), f64::total_cmp)
        }
        RecordField::Volume => {
            cmp_option(parse_volume(&a.volume), parse_volume(&b.volume), |x, y| x.cmp(y))
        }
        RecordField::Date => {
            cmp_option(parse_date(&a.date), parse_date(&b.date), |x, y| x.cmp(y))
        }
        RecordField::TradeCode => a.trade_code.cmp(&b.trade_code),
    }
}

fn cmp_option<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(&x, &y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort; ties keep their incoming order in both directions.
pub fn sort_records(rows: &mut [&StockRecord], field: RecordField, order: SortOrder) {
    match order {
        SortOrder::Asc => rows.sort_by(|a, b| compare_by(a, b, field)),
        SortOrder::Desc => rows.sort_by(|a, b| compare_by(b, a, field)),
    }
}

/// Filtered and sorted rows, before pagination.
pub fn filter_and_sort<'a>(records: &'a [StockRecord], state: &TableState) -> Vec<&'a StockRecord> {
    let mut rows = filter_records(records, &state.search);
    if let Some(field) = state.sort_field {
        sort_records(&mut rows, field, state.sort_order);
    }
    rows
}

pub fn total_pages(total_items: usize, page_size: PageSize) -> usize {
    total_items.div_ceil(page_size.get())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTrend {
    Up,
    Down,
    Flat,
}

impl PriceTrend {
    pub fn between(current: &str, previous: Option<&str>) -> Self {
        let (Some(curr), Some(prev)) = (parse_price(current), previous.and_then(parse_price))
        else {
            return PriceTrend::Flat;
        };
        if curr > prev {
            PriceTrend::Up
        } else if curr < prev {
            PriceTrend::Down
        } else {
            PriceTrend::Flat
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            PriceTrend::Up => "up",
            PriceTrend::Down => "down",
            PriceTrend::Flat => "",
        }
    }
}

/// One rendered row with its colouring relative to the previous row.
#[derive(Debug, Clone)]
pub struct TableRow<'a> {
    pub record: &'a StockRecord,
    pub open_trend: PriceTrend,
    pub close_trend: PriceTrend,
}

#[derive(Debug, Clone)]
pub struct TablePage<'a> {
    pub rows: Vec<TableRow<'a>>,
    pub total_matches: usize,
    pub total_pages: usize,
    pub page: usize,
    /// One-based index of the first row shown.
    pub first_shown: usize,
    /// One-based index of the last row shown.
    pub last_shown: usize,
    pub page_links: Vec<usize>,
}

#[derive(Debug, Clone)]
pub enum TableView<'a> {
    /// Nothing was loaded at all.
    NoData,
    /// Records are loaded but the search matched none of them.
    NoMatches { query: String },
    Rows(TablePage<'a>),
}

/// Run the whole pipeline for one render.
pub fn build_view<'a>(records: &'a [StockRecord], state: &TableState) -> TableView<'a> {
    if records.is_empty() {
        return TableView::NoData;
    }
    let matched = filter_and_sort(records, state);
    if matched.is_empty() {
        return TableView::NoMatches {
            query: state.search.clone(),
        };
    }

    let total_matches = matched.len();
    let size = state.page_size.get();
    let pages = total_pages(total_matches, state.page_size);
    let page = state.page.clamp(1, pages);
    let start = (page - 1) * size;
    let end = (start + size).min(total_matches);

    let slice = &matched[start..end];
    let rows = slice
        .iter()
        .copied()
        .enumerate()
        .map(|(i, record)| {
            let previous = i.checked_sub(1).map(|p| slice[p]);
            TableRow {
                record,
                open_trend: PriceTrend::between(&record.open, previous.map(|r| r.open.as_str())),
                close_trend: PriceTrend::between(
                    &record.close,
                    previous.map(|r| r.close.as_str()),
                ),
            }
        })
        .collect();

    TableView::Rows(TablePage {
        rows,
        total_matches,
        total_pages: pages,
        page,
        first_shown: start + 1,
        last_shown: end,
        page_links: page_window(page, pages),
    })
}

/// Up to five page numbers centred on `current`.
pub fn page_window(current: usize, total: usize) -> Vec<usize> {
    if total == 0 {
        return Vec::new();
    }
    let count = total.min(5);
    let first = if current <= 3 {
        1
    } else if current + 2 >= total {
        total + 1 - count
    } else {
        current - 2
    };
    (first..first + count).collect()
}
