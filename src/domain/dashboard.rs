//! Dashboard session state and its update loop.
//!
//! [`DashboardState::update`] is the only way state changes. It consumes an
//! [`Event`] and returns the [`Command`]s (network calls) the driver must
//! perform; their completions come back as further events. Every list fetch
//! carries a generation number and completions from superseded fetches are
//! dropped.

use crate::domain::dropdown::{CodeDropdown, CodeFilter};
use crate::domain::error::StockdashError;
use crate::domain::form::{RecordEdit, StockForm};
use crate::domain::record::{NewStockRecord, RecordField, StockRecord};
use crate::domain::stats::{self, ChartPoint, SummaryStats, WindowStats};
use crate::domain::table::{self, PageSize, TableState, TableView};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    /// First load, nothing to show yet.
    Loading,
    /// Reloading while earlier data stays on screen.
    Refreshing,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Listing,
    Create,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Error(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Update { id: i64 },
    Delete { id: i64 },
}

impl Mutation {
    fn verb(self) -> &'static str {
        match self {
            Mutation::Create => "create",
            Mutation::Update { .. } => "update",
            Mutation::Delete { .. } => "delete",
        }
    }

    /// Notification shown when this mutation completes.
    pub fn notice(self, ok: bool) -> Notice {
        let text = match (self, ok) {
            (Mutation::Create, true) => "Stock created successfully!",
            (Mutation::Update { .. }, true) => "Stock updated successfully!",
            (Mutation::Delete { .. }, true) => "Deleted successfully!",
            (Mutation::Create, false) => "Failed to create stock.",
            (Mutation::Update { .. }, false) => "Failed to update stock.",
            (Mutation::Delete { .. }, false) => "Failed to delete!",
        };
        if ok {
            Notice::Success(text.to_string())
        } else {
            Notice::Error(text.to_string())
        }
    }

    /// Short key for carrying an outcome across a redirect, e.g. `update-ok`.
    pub fn notice_key(self, ok: bool) -> String {
        format!("{}-{}", self.verb(), if ok { "ok" } else { "failed" })
    }
}

impl Notice {
    /// Inverse of [`Mutation::notice_key`].
    pub fn from_key(key: &str) -> Option<Notice> {
        let (verb, outcome) = key.split_once('-')?;
        let mutation = match verb {
            "create" => Mutation::Create,
            "update" => Mutation::Update { id: 0 },
            "delete" => Mutation::Delete { id: 0 },
            _ => return None,
        };
        match outcome {
            "ok" => Some(mutation.notice(true)),
            "failed" => Some(mutation.notice(false)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Session start: load trade codes and the first record batch.
    Start,
    Refresh,
    SelectCode(String),
    CodeSearch(String),
    StocksLoaded {
        generation: u64,
        result: Result<Vec<StockRecord>, StockdashError>,
    },
    CodesLoaded(Result<Vec<String>, StockdashError>),
    Search(String),
    SortBy(RecordField),
    SetPageSize(PageSize),
    GoToPage(usize),
    NextPage,
    PrevPage,
    BeginEdit(i64),
    EditField(RecordField, String),
    SaveEdit,
    CancelEdit,
    RequestDelete(i64),
    ConfirmDelete,
    DismissDelete,
    Navigate(Route),
    FormField(RecordField, String),
    SubmitForm,
    MutationDone {
        mutation: Mutation,
        result: Result<(), StockdashError>,
    },
    ClearNotices,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchStocks {
        generation: u64,
        trade_code: Option<String>,
    },
    FetchTradeCodes,
    CreateRecord(NewStockRecord),
    UpdateRecord(StockRecord),
    DeleteRecord(i64),
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub route: Route,
    pub dropdown: CodeDropdown,
    pub trade_codes: Vec<String>,
    pub codes_error: Option<String>,
    pub records: Vec<StockRecord>,
    pub load: LoadState,
    pub table: TableState,
    pub editing: Option<RecordEdit>,
    pub pending_delete: Option<i64>,
    pub form: StockForm,
    pub submitting: bool,
    pub in_flight: Vec<Mutation>,
    pub notices: Vec<Notice>,
    generation: u64,
}

impl DashboardState {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            route: Route::Listing,
            dropdown: CodeDropdown::default(),
            trade_codes: Vec::new(),
            codes_error: None,
            records: Vec::new(),
            load: LoadState::Idle,
            table: TableState::new(page_size),
            editing: None,
            pending_delete: None,
            form: StockForm::default(),
            submitting: false,
            in_flight: Vec::new(),
            notices: Vec::new(),
            generation: 0,
        }
    }

    pub fn code_filter(&self) -> &CodeFilter {
        &self.dropdown.selected
    }

    pub fn update(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::Start => vec![Command::FetchTradeCodes, self.fetch_stocks()],
            Event::Refresh => vec![self.fetch_stocks()],
            Event::SelectCode(value) => {
                if self.dropdown.select(&value) {
                    self.table.reset();
                    self.editing = None;
                    self.pending_delete = None;
                    vec![self.fetch_stocks()]
                } else {
                    Vec::new()
                }
            }
            Event::CodeSearch(text) => {
                self.dropdown.open = true;
                self.dropdown.set_search(text);
                Vec::new()
            }
            Event::StocksLoaded { generation, result } => {
                if generation != self.generation {
                    tracing::debug!(
                        generation,
                        latest = self.generation,
                        "discarding superseded stock list"
                    );
                    return Vec::new();
                }
                match result {
                    Ok(records) => {
                        self.records = records;
                        self.load = LoadState::Loaded;
                    }
                    Err(err) => {
                        self.load = LoadState::Failed(err.to_string());
                    }
                }
                Vec::new()
            }
            Event::CodesLoaded(result) => {
                match result {
                    Ok(codes) => {
                        self.trade_codes = codes;
                        self.codes_error = None;
                    }
                    Err(err) => self.codes_error = Some(err.to_string()),
                }
                Vec::new()
            }
            Event::Search(text) => {
                self.table.set_search(text);
                Vec::new()
            }
            Event::SortBy(field) => {
                self.table.toggle_sort(field);
                Vec::new()
            }
            Event::SetPageSize(size) => {
                self.table.set_page_size(size);
                Vec::new()
            }
            Event::GoToPage(page) => {
                let pages = self.total_pages();
                self.table.go_to_page(page, pages);
                Vec::new()
            }
            Event::NextPage => {
                let pages = self.total_pages();
                self.table.go_to_page(self.table.page + 1, pages);
                Vec::new()
            }
            Event::PrevPage => {
                let pages = self.total_pages();
                self.table.go_to_page(self.table.page.saturating_sub(1), pages);
                Vec::new()
            }
            Event::BeginEdit(id) => {
                if let Some(record) = self.records.iter().find(|r| r.id == id) {
                    self.editing = Some(RecordEdit::begin(record));
                }
                Vec::new()
            }
            Event::EditField(field, value) => {
                if let Some(edit) = self.editing.as_mut() {
                    edit.set(field, value);
                }
                Vec::new()
            }
            Event::SaveEdit => match self.editing.take() {
                Some(edit) => {
                    self.in_flight.push(Mutation::Update { id: edit.id() });
                    vec![Command::UpdateRecord(edit.draft)]
                }
                None => Vec::new(),
            },
            Event::CancelEdit => {
                self.editing = None;
                Vec::new()
            }
            Event::RequestDelete(id) => {
                if self.records.iter().any(|r| r.id == id) {
                    self.pending_delete = Some(id);
                }
                Vec::new()
            }
            Event::ConfirmDelete => match self.pending_delete.take() {
                Some(id) => {
                    self.in_flight.push(Mutation::Delete { id });
                    vec![Command::DeleteRecord(id)]
                }
                None => Vec::new(),
            },
            Event::DismissDelete => {
                self.pending_delete = None;
                Vec::new()
            }
            Event::Navigate(route) => {
                self.route = route;
                Vec::new()
            }
            Event::FormField(field, value) => {
                self.form.set(field, value);
                Vec::new()
            }
            Event::SubmitForm => {
                if self.submitting {
                    return Vec::new();
                }
                match self.form.to_payload() {
                    Ok(payload) => {
                        self.submitting = true;
                        self.in_flight.push(Mutation::Create);
                        vec![Command::CreateRecord(payload)]
                    }
                    Err(err) => {
                        self.notices.push(Notice::Error(err.to_string()));
                        Vec::new()
                    }
                }
            }
            Event::MutationDone { mutation, result } => self.finish_mutation(mutation, result),
            Event::ClearNotices => {
                self.notices.clear();
                Vec::new()
            }
        }
    }

    fn finish_mutation(
        &mut self,
        mutation: Mutation,
        result: Result<(), StockdashError>,
    ) -> Vec<Command> {
        if let Some(pos) = self.in_flight.iter().position(|m| *m == mutation) {
            self.in_flight.remove(pos);
        }
        if mutation == Mutation::Create {
            self.submitting = false;
        }

        match result {
            Ok(()) => {
                if mutation == Mutation::Create {
                    self.form.clear();
                    self.route = Route::Listing;
                }
                self.notices.push(mutation.notice(true));
                vec![self.fetch_stocks()]
            }
            Err(err) => {
                tracing::warn!(?mutation, error = %err, "mutation failed");
                self.notices.push(mutation.notice(false));
                Vec::new()
            }
        }
    }

    fn fetch_stocks(&mut self) -> Command {
        self.generation += 1;
        self.load = if self.records.is_empty() {
            LoadState::Loading
        } else {
            LoadState::Refreshing
        };
        Command::FetchStocks {
            generation: self.generation,
            trade_code: self.code_filter().as_query().map(str::to_string),
        }
    }

    fn total_pages(&self) -> usize {
        let matched = table::filter_and_sort(&self.records, &self.table).len();
        table::total_pages(matched, self.table.page_size)
    }

    pub fn table_view(&self) -> TableView<'_> {
        table::build_view(&self.records, &self.table)
    }

    pub fn summary(&self) -> SummaryStats {
        stats::summary_stats(&self.records)
    }

    pub fn chart(&self) -> Vec<ChartPoint> {
        stats::chart_series(&self.records)
    }

    pub fn chart_stats(&self) -> WindowStats {
        stats::window_stats(&self.chart())
    }

    pub fn is_mutating(&self, mutation: Mutation) -> bool {
        self.in_flight.contains(&mutation)
    }
}
