//! Page requests, paged result sets and the `X-Pagination` metadata blob.
//!
//! Repositories fetch one page using `PageRequest::offset`/`limit` together
//! with the total row count; `PagedList::new` then derives the page metadata.

use serde::{Deserialize, Serialize};

/// Pagination query parameters as received from the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceParameters {
    pub order_by: Option<String>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A normalised page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
    /// The `orderBy` value exactly as requested, echoed back in page links.
    pub order_by: Option<String>,
}

impl PageRequest {
    /// Clamps the raw values: page numbers below 1 become 1 and page sizes
    /// are capped to `[1, max_page_size]`.
    pub fn new(
        page_number: Option<i64>,
        page_size: Option<i64>,
        order_by: Option<String>,
        max_page_size: u32,
    ) -> Self {
        let max_page_size = max_page_size.max(1);
        let page_number = page_number.unwrap_or(1).clamp(1, u32::MAX as i64) as u32;
        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE as i64)
            .clamp(1, max_page_size as i64) as u32;

        Self {
            page_number,
            page_size,
            order_by: order_by.filter(|o| !o.trim().is_empty()),
        }
    }

    pub fn from_parameters(params: ResourceParameters, max_page_size: u32) -> Self {
        Self::new(
            params.page_number,
            params.page_size,
            params.order_by,
            max_page_size,
        )
    }

    /// Number of rows preceding this page.
    pub fn offset(&self) -> i64 {
        (self.page_number as i64 - 1) * self.page_size as i64
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    fn with_page(&self, page_number: u32) -> Self {
        Self {
            page_number,
            ..self.clone()
        }
    }
}

/// One page of a larger ordered result set.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedList<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub page_size: u32,
}

impl<T> PagedList<T> {
    /// Wraps the rows of the requested page. A page past the end simply has
    /// no items; the counts are still reported.
    pub fn new(items: Vec<T>, total_count: u64, request: &PageRequest) -> Self {
        let page_size = request.page_size.max(1);
        let total_pages = total_count.div_ceil(page_size as u64) as u32;

        Self {
            items,
            total_count,
            total_pages,
            current_page: request.page_number,
            page_size,
        }
    }

    /// Slices an already ordered, complete result set.
    pub fn from_ordered(all: Vec<T>, request: &PageRequest) -> Self {
        let total_count = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Self::new(items, total_count, request)
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedList<U> {
        PagedList {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            total_pages: self.total_pages,
            current_page: self.current_page,
            page_size: self.page_size,
        }
    }
}

/// Body of the `X-Pagination` response header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMetadata {
    pub total_count: u64,
    pub page_size: u32,
    pub current_page: u32,
    pub total_pages: u32,
    pub previous_page_link: Option<String>,
    pub next_page_link: Option<String>,
}

impl PaginationMetadata {
    pub const HEADER: &'static str = "x-pagination";

    pub fn from_paged<T>(list: &PagedList<T>, request: &PageRequest, base_path: &str) -> Self {
        let previous_page_link = list
            .has_previous()
            .then(|| page_link(base_path, &request.with_page(request.page_number - 1)));
        let next_page_link = list
            .has_next()
            .then(|| page_link(base_path, &request.with_page(request.page_number + 1)));

        Self {
            total_count: list.total_count,
            page_size: list.page_size,
            current_page: list.current_page,
            total_pages: list.total_pages,
            previous_page_link,
            next_page_link,
        }
    }
}

/// Builds `base?orderBy=..&pageNumber=..&pageSize=..` for a page request.
pub fn page_link(base_path: &str, request: &PageRequest) -> String {
    let mut link = format!("{base_path}?");
    if let Some(order_by) = &request.order_by {
        link.push_str("orderBy=");
        link.push_str(&urlencoding::encode(order_by));
        link.push('&');
    }
    link.push_str(&format!(
        "pageNumber={}&pageSize={}",
        request.page_number, request.page_size
    ));
    link
}
