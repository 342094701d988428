//! Trade code filter and its searchable dropdown.

/// Option value that stands for "no trade code filter".
pub const ALL_CODES: &str = "all";

/// Options shown while the dropdown search box is blank.
pub const BLANK_SEARCH_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CodeFilter {
    #[default]
    All,
    Code(String),
}

impl CodeFilter {
    /// Blank input and the `all` option both mean no filter.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_CODES {
            CodeFilter::All
        } else {
            CodeFilter::Code(value.to_string())
        }
    }

    /// `trade_code` query parameter, omitted for [`CodeFilter::All`].
    pub fn as_query(&self) -> Option<&str> {
        match self {
            CodeFilter::All => None,
            CodeFilter::Code(code) => Some(code),
        }
    }

    pub fn value(&self) -> &str {
        self.as_query().unwrap_or(ALL_CODES)
    }

    pub fn label(&self) -> &str {
        match self {
            CodeFilter::All => "All Trade Codes",
            CodeFilter::Code(code) => code,
        }
    }
}

/// Options matching `search`, `all` first. A blank search shows only the
/// first few options.
pub fn visible_options<'a>(codes: &'a [String], search: &str) -> Vec<&'a str> {
    let needle = search.to_lowercase();
    let matching = std::iter::once(ALL_CODES)
        .chain(codes.iter().map(String::as_str))
        .filter(|value| value.to_lowercase().contains(&needle));
    if search.trim().is_empty() {
        matching.take(BLANK_SEARCH_LIMIT).collect()
    } else {
        matching.collect()
    }
}

/// Open/closed state and search text of the dropdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeDropdown {
    pub open: bool,
    pub search: String,
    pub selected: CodeFilter,
}

impl CodeDropdown {
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    /// Pick an option. Closes the list and clears the search. Returns true
    /// when the selection actually changed.
    pub fn select(&mut self, value: &str) -> bool {
        let next = CodeFilter::parse(value);
        self.open = false;
        self.search.clear();
        if next == self.selected {
            return false;
        }
        self.selected = next;
        true
    }

    pub fn options<'a>(&self, codes: &'a [String]) -> Vec<&'a str> {
        visible_options(codes, &self.search)
    }
}
