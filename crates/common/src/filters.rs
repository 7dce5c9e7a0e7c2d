//! Paging and sorting for list endpoints

use serde::{Deserialize, Serialize};

use crate::validation::Validator;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE: i64 = 10_000_000;
const MAX_PAGE_SIZE: i64 = 100;

/// Direction of an ORDER BY clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Raw `page`, `page_size` and `sort` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort: Option<String>,
}

/// Validated paging and sorting for one resource
#[derive(Debug, Clone)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
    sort_safelist: &'static [&'static str],
}

impl Filters {
    /// Apply defaults; `default_sort` must be in `sort_safelist`
    pub fn new(
        params: FilterParams,
        default_sort: &str,
        sort_safelist: &'static [&'static str],
    ) -> Self {
        Self {
            page: params.page.unwrap_or(DEFAULT_PAGE),
            page_size: params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            sort: params.sort.unwrap_or_else(|| default_sort.to_string()),
            sort_safelist,
        }
    }

    pub fn validate(&self, v: &mut Validator) {
        v.check(self.page > 0, "page", "must be greater than zero");
        v.check(self.page <= MAX_PAGE, "page", "must be a maximum of 10 million");
        v.check(self.page_size > 0, "page_size", "must be greater than zero");
        v.check(
            self.page_size <= MAX_PAGE_SIZE,
            "page_size",
            "must be a maximum of 100",
        );
        v.check(
            self.sort_safelist.contains(&self.sort.as_str()),
            "sort",
            "invalid sort value",
        );
    }

    /// Column name with any leading `-` stripped.
    ///
    /// Only values from the safelist reach SQL; anything else falls back to
    /// the first safelisted column.
    pub fn sort_column(&self) -> &str {
        if self.sort_safelist.contains(&self.sort.as_str()) {
            self.sort.trim_start_matches('-')
        } else {
            self.sort_safelist
                .first()
                .map(|s| s.trim_start_matches('-'))
                .unwrap_or("id")
        }
    }

    pub fn sort_direction(&self) -> SortDirection {
        if self.sort.starts_with('-') {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// Parse an optional integer query value, recording a field error when it
/// is present but not an integer.
pub fn read_int(v: &mut Validator, key: &str, raw: Option<&str>) -> Option<i64> {
    let raw = raw.filter(|s| !s.is_empty())?;
    match raw.parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => {
            v.add_error(key, "must be an integer value");
            None
        }
    }
}

/// Split a comma-separated query value, dropping empty items
pub fn read_csv(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Paging metadata returned next to a list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_records: Option<i64>,
}

impl Metadata {
    /// Empty when there are no records
    pub fn calculate(total_records: i64, page: i64, page_size: i64) -> Self {
        if total_records == 0 || page_size <= 0 {
            return Self::default();
        }

        Self {
            current_page: Some(page),
            page_size: Some(page_size),
            first_page: Some(1),
            last_page: Some((total_records + page_size - 1) / page_size),
            total_records: Some(total_records),
        }
    }
}
