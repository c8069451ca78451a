//! List filtering, sorting and pagination rules.
//!
//! The admin frontend mirrors its table state (search, page, page size,
//! sort column, sort direction, extra filters) into the URL query string.
//! [`ListQuery::parse`] applies the same normalization on the server:
//! anything out of range falls back to its default instead of failing the
//! request. [`ListQuery::query_pairs`] produces the canonical query string
//! used in pagination links, omitting every value that equals its default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Page size used when none (or an invalid one) is requested.
pub const DEFAULT_PER_PAGE: i64 = 15;

/// Largest accepted page size.
pub const MAX_PER_PAGE: i64 = 100;

// ---------------------------------------------------------------------------
// Sort direction / trashed scope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    /// Case-insensitive parse of `asc` / `desc`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Which rows a query sees with respect to soft deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Trashed {
    /// Live rows only.
    #[default]
    Without,
    /// Live and soft-deleted rows.
    With,
    /// Soft-deleted rows only.
    Only,
}

impl Trashed {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "with" => Some(Self::With),
            "only" => Some(Self::Only),
            _ => None,
        }
    }

    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Self::Without => None,
            Self::With => Some("with"),
            Self::Only => Some("only"),
        }
    }

    /// SQL predicate on `deleted_at` for the given table alias, if any.
    pub fn sql_predicate(self, alias: &str) -> Option<String> {
        match self {
            Self::Without => Some(format!("{alias}.deleted_at IS NULL")),
            Self::With => None,
            Self::Only => Some(format!("{alias}.deleted_at IS NOT NULL")),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw params / spec
// ---------------------------------------------------------------------------

/// Query parameters exactly as received. Resource-specific filters land in
/// `extra`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawListParams {
    pub search: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub trashed: Option<String>,
    pub all: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl RawListParams {
    /// A resource-specific filter value, `None` when absent or blank.
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Per-resource listing rules.
#[derive(Debug, Clone, Copy)]
pub struct ListSpec {
    /// Columns a client may sort by. Anything else is ignored.
    pub sortable: &'static [&'static str],
    pub default_per_page: i64,
    pub max_per_page: i64,
}

impl ListSpec {
    pub const fn new(sortable: &'static [&'static str]) -> Self {
        Self {
            sortable,
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: MAX_PER_PAGE,
        }
    }

    /// Highest page whose row offset still fits in an `i64`.
    pub const fn max_page(&self) -> i64 {
        i64::MAX / self.max_per_page + 1
    }
}

// ---------------------------------------------------------------------------
// ListQuery
// ---------------------------------------------------------------------------

/// Normalized list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: i64,
    pub per_page: i64,
    /// Always one of [`ListSpec::sortable`], safe to interpolate into SQL.
    pub sort: Option<&'static str>,
    pub dir: Option<SortDir>,
    pub trashed: Trashed,
    /// Return every matching row without pagination.
    pub all: bool,
    default_per_page: i64,
}

impl ListQuery {
    pub fn parse(raw: &RawListParams, spec: &ListSpec) -> Self {
        let search = raw
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let page = raw
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p.min(spec.max_page()))
            .unwrap_or(1);

        let per_page = raw
            .per_page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| (1..=spec.max_per_page).contains(p))
            .unwrap_or(spec.default_per_page);

        let sort = raw.sort.as_deref().and_then(|s| {
            let s = s.trim();
            spec.sortable.iter().copied().find(|col| *col == s)
        });

        let dir = raw.dir.as_deref().and_then(SortDir::parse);

        let trashed = raw
            .trashed
            .as_deref()
            .and_then(Trashed::parse)
            .unwrap_or_default();

        Self {
            search,
            page,
            per_page,
            sort,
            dir,
            trashed,
            all: raw.all.is_some(),
            default_per_page: spec.default_per_page,
        }
    }

    /// Row offset of the current page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// `ORDER BY` body for the requested sort, or `fallback` when unsorted.
    ///
    /// A sort column without a direction sorts ascending. `id` breaks ties
    /// so pages over repeated values stay stable.
    pub fn order_by(&self, alias: &str, fallback: &str) -> String {
        match self.sort {
            Some(col) => format!(
                "{alias}.{col} {}, {alias}.id",
                self.dir.unwrap_or(SortDir::Asc).as_sql()
            ),
            None => fallback.to_string(),
        }
    }

    /// The same query pointing at another page.
    pub fn with_page(&self, page: i64) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Query-string pairs for this state, omitting defaults.
    ///
    /// `extra` carries the resource-specific filters already in their wire
    /// form (e.g. `categories=a,b`).
    pub fn query_pairs(&self, extra: &[(&str, String)]) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(ref search) = self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        if self.page != 1 {
            pairs.push(("page".to_string(), self.page.to_string()));
        }
        if self.per_page != self.default_per_page {
            pairs.push(("per_page".to_string(), self.per_page.to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort".to_string(), sort.to_string()));
            if let Some(dir) = self.dir {
                pairs.push(("dir".to_string(), dir.as_str().to_string()));
            }
        }
        if let Some(trashed) = self.trashed.as_str() {
            pairs.push(("trashed".to_string(), trashed.to_string()));
        }
        for (key, value) in extra {
            if !value.is_empty() {
                pairs.push((key.to_string(), value.clone()));
            }
        }
        pairs
    }

    /// URL-encoded query string (without the leading `?`).
    pub fn to_query_string(&self, extra: &[(&str, String)]) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_pairs(extra))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Page arithmetic for a filtered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        Self {
            total: total.max(0),
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn last_page(&self) -> i64 {
        ((self.total + self.per_page - 1) / self.per_page).max(1)
    }

    fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    fn count_on_page(&self) -> i64 {
        (self.total - self.offset()).clamp(0, self.per_page)
    }

    /// 1-based index of the first row on this page, `None` for an empty page.
    pub fn from(&self) -> Option<i64> {
        (self.count_on_page() > 0).then(|| self.offset() + 1)
    }

    /// 1-based index of the last row on this page, `None` for an empty page.
    pub fn to(&self) -> Option<i64> {
        self.from().map(|from| from + self.count_on_page() - 1)
    }

    pub fn prev_page(&self) -> Option<i64> {
        (self.page > 1).then(|| self.page - 1)
    }

    pub fn next_page(&self) -> Option<i64> {
        (self.page < self.last_page()).then(|| self.page + 1)
    }
}

/// Split a comma-separated filter value, dropping blanks.
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
