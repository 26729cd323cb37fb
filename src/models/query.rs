//! List query and pagination types shared by events and posts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default page size when only `page` is given
pub const DEFAULT_LIMIT: u32 = 20;

/// Upper bound for `limit`
pub const MAX_LIMIT: u32 = 100;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "1" => Ok(SortOrder::Asc),
            "desc" | "-1" => Ok(SortOrder::Desc),
            _ => Err(anyhow::anyhow!("Invalid sort order: {}", s)),
        }
    }
}

/// Query parameters accepted by list endpoints
///
/// Pagination only kicks in when `page` or `limit` is present; otherwise the
/// full sorted collection is returned.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
}

impl ListQuery {
    pub fn is_paginated(&self) -> bool {
        self.page.is_some() || self.limit.is_some()
    }

    /// Effective page number (1-indexed)
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size, clamped to `1..=MAX_LIMIT`
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Pagination metadata returned next to list data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

/// One page of a sorted listing
#[derive(Debug, Clone)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> PagedResult<T> {
    /// Slice an already sorted collection according to `query`
    pub fn paginate(items: Vec<T>, query: &ListQuery) -> Self {
        let total = items.len();
        if !query.is_paginated() {
            return Self {
                items,
                meta: PageMeta {
                    total,
                    page: None,
                    limit: None,
                    total_pages: None,
                },
            };
        }

        let page = query.page();
        let limit = query.limit();
        let offset = (page as usize - 1).saturating_mul(limit as usize);
        let total_pages = total.div_ceil(limit as usize) as u32;
        let items = items
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect();

        Self {
            items,
            meta: PageMeta {
                total,
                page: Some(page),
                limit: Some(limit),
                total_pages: Some(total_pages),
            },
        }
    }
}
