//! This modules defines the common functionality for paging data.

use serde::{Deserialize, Serialize};

use crate::Error;

/// The name of the query parameter holding the requested page number.
pub const PAGE_QUERY_PARAM: &str = "page";
/// The name of the query parameter holding the requested page size.
pub const PAGE_SIZE_QUERY_PARAM: &str = "page_size";

/// The config for pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a client may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// The page a client asked for, resolved against a [PaginationConfig].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// The 1-based page number.
    pub page: u64,
    /// The maximum number of items on the page.
    pub page_size: u64,
}

impl PageRequest {
    /// Read the page number and page size from raw query parameters.
    ///
    /// A missing or invalid `page_size` falls back to the configured default,
    /// and a page size larger than the configured maximum is clamped.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidPage] if `page` is present but is not a positive integer.
    pub fn from_query(params: &[(String, String)], config: &PaginationConfig) -> Result<Self, Error> {
        let page = match find_param(params, PAGE_QUERY_PARAM) {
            Some(raw_page) => match raw_page.trim().parse::<u64>() {
                Ok(page) if page > 0 => page,
                _ => return Err(Error::InvalidPage),
            },
            None => 1,
        };

        let page_size = find_param(params, PAGE_SIZE_QUERY_PARAM)
            .and_then(|raw_size| raw_size.trim().parse::<u64>().ok())
            .filter(|&size| size > 0)
            .unwrap_or(config.default_page_size)
            .min(config.max_page_size);

        Ok(Self { page, page_size })
    }

    /// The number of items to skip to reach this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Check that this page exists when there are `count` items in total.
    ///
    /// The first page always exists, even when there are no items.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidPage] if the page is past the last page.
    pub fn validate(&self, count: u64) -> Result<(), Error> {
        if self.page > page_count(count, self.page_size) {
            Err(Error::InvalidPage)
        } else {
            Ok(())
        }
    }
}

/// The number of pages needed to show `count` items, at least one.
pub fn page_count(count: u64, page_size: u64) -> u64 {
    count.div_ceil(page_size.max(1)).max(1)
}

fn find_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// One page of results along with links to the neighbouring pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The total number of items across all pages.
    pub count: u64,
    /// The link to the next page, if there is one.
    pub next: Option<String>,
    /// The link to the previous page, if there is one.
    pub previous: Option<String>,
    /// The items on this page.
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Create a page of `results` out of `count` items in total.
    ///
    /// The `next` and `previous` links point at `path` and keep every query
    /// parameter in `params` except the page number.
    pub fn new(
        results: Vec<T>,
        count: u64,
        request: PageRequest,
        path: &str,
        params: &[(String, String)],
    ) -> Self {
        let last_page = page_count(count, request.page_size);

        let next =
            (request.page < last_page).then(|| page_link(path, params, Some(request.page + 1)));
        let previous = (request.page > 1).then(|| {
            let previous_page = request.page - 1;
            // The first page is linked without a page number.
            page_link(path, params, (previous_page > 1).then_some(previous_page))
        });

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

fn page_link(path: &str, params: &[(String, String)], page: Option<u64>) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .filter(|(key, _)| key != PAGE_QUERY_PARAM)
        .cloned()
        .collect();

    if let Some(page) = page {
        pairs.push((PAGE_QUERY_PARAM.to_owned(), page.to_string()));
    }

    let query = serde_urlencoded::to_string(&pairs).unwrap_or_else(|error| {
        tracing::error!("could not encode query parameters {pairs:?}: {error}");
        String::new()
    });

    if query.is_empty() {
        path.to_owned()
    } else {
        format!("{path}?{query}")
    }
}
