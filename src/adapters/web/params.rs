//! Dashboard view state carried in the query string.

use serde::Deserialize;

use crate::domain::dropdown::CodeFilter;
use crate::domain::record::RecordField;
use crate::domain::table::{PageSize, SortOrder, TableState};

/// Raw query parameters. Everything is optional text so that a malformed
/// value falls back to its default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub code: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub edit: Option<String>,
    pub codes_q: Option<String>,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardParams {
    pub filter: CodeFilter,
    pub table: TableState,
    pub edit: Option<i64>,
    pub codes_q: Option<String>,
    default_page_size: PageSize,
}

impl DashboardParams {
    pub fn from_query(query: &DashboardQuery, default_page_size: PageSize) -> Self {
        let filter = CodeFilter::parse(query.code.as_deref().unwrap_or_default());

        let page_size = query
            .per_page
            .as_deref()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .and_then(PageSize::from_count)
            .unwrap_or(default_page_size);
        let mut table = TableState::new(page_size);
        table.set_search(query.q.as_deref().unwrap_or_default().trim());
        let sort_field = query.sort.as_deref().and_then(RecordField::parse);
        let order = query
            .order
            .as_deref()
            .and_then(SortOrder::parse)
            .unwrap_or_default();
        table.set_sort(sort_field, order);
        table.page = query
            .page
            .as_deref()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);

        Self {
            filter,
            table,
            edit: query.edit.as_deref().and_then(|s| s.trim().parse().ok()),
            codes_q: query.codes_q.clone().filter(|s| !s.is_empty()),
            default_page_size,
        }
    }

    /// Non-default parameters in a stable order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if self.filter != CodeFilter::All {
            pairs.push(("code", self.filter.value().to_string()));
        }
        if !self.table.search.is_empty() {
            pairs.push(("q", self.table.search.clone()));
        }
        if let Some(field) = self.table.sort_field {
            pairs.push(("sort", field.name().to_string()));
            pairs.push(("order", self.table.sort_order.as_str().to_string()));
        }
        if self.table.page_size != self.default_page_size {
            pairs.push(("per_page", self.table.page_size.get().to_string()));
        }
        if self.table.page > 1 {
            pairs.push(("page", self.table.page.to_string()));
        }
        if let Some(id) = self.edit {
            pairs.push(("edit", id.to_string()));
        }
        if let Some(search) = &self.codes_q {
            pairs.push(("codes_q", search.clone()));
        }
        pairs
    }

    pub fn href(&self) -> String {
        let pairs = self.pairs();
        if pairs.is_empty() {
            return "/".to_string();
        }
        let query: Vec<String> = pairs
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect();
        format!("/?{}", query.join("&"))
    }

    /// Same view with transient parts (edit row, dropdown search) dropped.
    pub fn settled(&self) -> Self {
        Self {
            edit: None,
            codes_q: None,
            ..self.clone()
        }
    }

    pub fn with_code(&self, value: &str) -> Self {
        let mut next = self.settled();
        next.filter = CodeFilter::parse(value);
        next.table.reset();
        next
    }

    pub fn with_sort(&self, field: RecordField) -> Self {
        let mut next = self.settled();
        next.table.toggle_sort(field);
        next
    }

    pub fn with_page(&self, page: usize) -> Self {
        let mut next = self.settled();
        next.table.page = page.max(1);
        next
    }

    pub fn with_page_size(&self, size: PageSize) -> Self {
        let mut next = self.settled();
        next.table.set_page_size(size);
        next
    }

    pub fn with_edit(&self, id: i64) -> Self {
        Self {
            edit: Some(id),
            codes_q: None,
            ..self.clone()
        }
    }
}

/// `path` if it stays on this site, else `/`.
///
/// Browsers read `\` as `/` and drop tabs and newlines in a `Location`, so
/// `/\host` and `/\t/host` are as off-site as `//host`.
pub fn local_path(path: &str) -> &str {
    let local = path.starts_with('/')
        && !path[1..].starts_with('/')
        && !path.chars().any(|c| c == '\\' || c.is_control());
    if local { path } else { "/" }
}

/// Post-mutation redirect target carrying the outcome notice.
pub fn return_target(return_to: &str, notice_key: &str) -> String {
    let base = local_path(return_to);
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}notice={notice_key}")
}
