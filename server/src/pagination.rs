//! Windowing of ordered listings.
//!
//! Two schemes exist: offset/limit (comments) and page/size (attendees).
//! Both clamp oversized windows to a hard cap, treat out-of-range positions
//! as an empty page and leave the ordering to the query that produced the
//! rows.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 50;
pub const DEFAULT_PAGE_SIZE: u64 = 25;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Rows `[offset, offset + limit)` of an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

impl Window {
    pub fn empty() -> Self {
        Self { offset: 0, limit: 0 }
    }

    pub fn apply<T>(&self, rows: impl IntoIterator<Item = T>) -> Vec<T> {
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        rows.into_iter().skip(offset).take(limit).collect()
    }
}

/// One window of rows together with the size of the whole listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Raw pagination parameters. Everything is kept as text so that junk values
/// fall back to defaults instead of failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Builds listing links that keep the request path and its filters.
#[derive(Debug, Clone)]
pub struct Links {
    path: String,
    params: Vec<(String, String)>,
}

impl Links {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    pub fn keep(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.params.push((key.to_string(), value.to_string()));
        }
        self
    }

    fn build(&self, extra: &[(&str, u64)]) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            query.append_pair(key, value);
        }
        for (key, value) in extra {
            query.append_pair(key, &value.to_string());
        }
        let query = query.finish();

        if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, query)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    LimitOffset {
        limit: u64,
        offset: u64,
    },
    /// `page` is `None` when the caller asked for something that can never
    /// hold rows (page 0, a negative or non-numeric page).
    PageNumber {
        page: Option<u64>,
        page_size: u64,
    },
}

impl Pagination {
    pub fn limit_offset(query: &PaginationQuery) -> Self {
        Pagination::LimitOffset {
            limit: positive_or(query.limit.as_deref(), DEFAULT_LIMIT).min(MAX_LIMIT),
            offset: query
                .offset
                .as_deref()
                .and_then(|raw| raw.trim().parse::<u64>().ok())
                .unwrap_or(0),
        }
    }

    pub fn page_number(query: &PaginationQuery) -> Self {
        let page = match query.page.as_deref() {
            None => Some(1),
            Some(raw) => raw.trim().parse::<u64>().ok().filter(|page| *page >= 1),
        };

        Pagination::PageNumber {
            page,
            page_size: positive_or(query.page_size.as_deref(), DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
        }
    }

    pub fn window(&self) -> Window {
        match *self {
            Pagination::LimitOffset { limit, offset } => Window { offset, limit },
            Pagination::PageNumber {
                page: Some(page),
                page_size,
            } => Window {
                offset: (page - 1).saturating_mul(page_size),
                limit: page_size,
            },
            Pagination::PageNumber { page: None, .. } => Window::empty(),
        }
    }

    pub fn into_page<T>(self, slice: Slice<T>, links: &Links) -> Page<T> {
        let count = slice.total;

        let (next, previous) = match self {
            Pagination::LimitOffset { limit, offset } => {
                let next = offset
                    .checked_add(limit)
                    .filter(|end| *end < count)
                    .map(|end| links.build(&[("limit", limit), ("offset", end)]));

                let previous = if offset == 0 {
                    None
                } else if offset <= limit {
                    Some(links.build(&[("limit", limit)]))
                } else {
                    Some(links.build(&[("limit", limit), ("offset", offset - limit)]))
                };

                (next, previous)
            }
            Pagination::PageNumber {
                page: Some(page),
                page_size,
            } => {
                let last_page = count.div_ceil(page_size).max(1);

                let next = (page < last_page)
                    .then(|| links.build(&[("page", page + 1), ("page_size", page_size)]));

                let previous = (page > 1).then(|| match (page - 1).min(last_page) {
                    1 => links.build(&[("page_size", page_size)]),
                    target => links.build(&[("page", target), ("page_size", page_size)]),
                });

                (next, previous)
            }
            Pagination::PageNumber { page: None, .. } => (None, None),
        };

        Page {
            count,
            next,
            previous,
            results: slice.items,
        }
    }
}

fn positive_or(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn query(pairs: &[(&str, &str)]) -> PaginationQuery {
        let mut query = PaginationQuery::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "limit" => query.limit = value,
                "offset" => query.offset = value,
                "page" => query.page = value,
                "page_size" => query.page_size = value,
                _ => {}
            }
        }
        query
    }

    fn slice(total: u64, window: Window) -> Slice<u64> {
        Slice {
            items: window.apply(0..total),
            total,
        }
    }

    #[rstest]
    #[case(&[], 10, 0)]
    #[case(&[("limit", "1000")], 50, 0)]
    #[case(&[("limit", "0")], 10, 0)]
    #[case(&[("limit", "-4")], 10, 0)]
    #[case(&[("limit", "abc"), ("offset", "-1")], 10, 0)]
    #[case(&[("limit", "5"), ("offset", "20")], 5, 20)]
    fn test_limit_offset_parsing(
        #[case] pairs: &[(&str, &str)],
        #[case] limit: u64,
        #[case] offset: u64,
    ) {
        assert_eq!(
            Pagination::limit_offset(&query(pairs)).window(),
            Window { offset, limit }
        );
    }

    #[rstest]
    #[case(&[], Some(1), 25)]
    #[case(&[("page_size", "500")], Some(1), 100)]
    #[case(&[("page", "3"), ("page_size", "10")], Some(3), 10)]
    #[case(&[("page", "0")], None, 25)]
    #[case(&[("page", "last")], None, 25)]
    fn test_page_number_parsing(
        #[case] pairs: &[(&str, &str)],
        #[case] page: Option<u64>,
        #[case] page_size: u64,
    ) {
        assert_eq!(
            Pagination::page_number(&query(pairs)),
            Pagination::PageNumber { page, page_size }
        );
    }

    #[test]
    fn test_offset_past_end_is_empty() {
        let pagination = Pagination::limit_offset(&query(&[("offset", "500")]));
        let page = pagination.into_page(slice(7, pagination.window()), &Links::new("/c"));

        assert_eq!(page.count, 7);
        assert!(page.results.is_empty());
        assert!(page.next.is_none());
        assert_eq!(page.previous.as_deref(), Some("/c?limit=10&offset=490"));
    }

    #[test]
    fn test_limit_offset_links() {
        let pagination = Pagination::limit_offset(&query(&[("limit", "2"), ("offset", "2")]));
        let page = pagination.into_page(slice(5, pagination.window()), &Links::new("/c"));

        assert_eq!(page.results, vec![2, 3]);
        assert_eq!(page.next.as_deref(), Some("/c?limit=2&offset=4"));
        assert_eq!(page.previous.as_deref(), Some("/c?limit=2"));
    }

    #[test]
    fn test_last_window_has_no_next() {
        let pagination = Pagination::limit_offset(&query(&[("limit", "2"), ("offset", "4")]));
        let page = pagination.into_page(slice(5, pagination.window()), &Links::new("/c"));

        assert_eq!(page.results, vec![4]);
        assert!(page.next.is_none());
        assert_eq!(page.previous.as_deref(), Some("/c?limit=2&offset=2"));
    }

    #[test]
    fn test_page_links_keep_filters() {
        let pagination = Pagination::page_number(&query(&[("page", "2"), ("page_size", "2")]));
        let links = Links::new("/a").keep("usuario", Some("u1"));
        let page = pagination.into_page(slice(5, pagination.window()), &links);

        assert_eq!(page.results, vec![2, 3]);
        assert_eq!(page.next.as_deref(), Some("/a?usuario=u1&page=3&page_size=2"));
        assert_eq!(page.previous.as_deref(), Some("/a?usuario=u1&page_size=2"));
    }

    #[test]
    fn test_far_page_is_empty_and_points_back_to_last_page() {
        let pagination = Pagination::page_number(&query(&[("page", "9999")]));
        let page = pagination.into_page(slice(60, pagination.window()), &Links::new("/a"));

        assert_eq!(page.count, 60);
        assert!(page.results.is_empty());
        assert!(page.next.is_none());
        assert_eq!(page.previous.as_deref(), Some("/a?page=3&page_size=25"));
    }

    #[test]
    fn test_invalid_page_is_empty() {
        let pagination = Pagination::page_number(&query(&[("page", "0")]));
        assert_eq!(pagination.window(), Window::empty());

        let page = pagination.into_page(slice(3, pagination.window()), &Links::new("/a"));
        assert_eq!(page.count, 3);
        assert!(page.results.is_empty());
        assert!(page.next.is_none() && page.previous.is_none());
    }

    #[test]
    fn test_empty_listing_is_single_page() {
        let pagination = Pagination::page_number(&PaginationQuery::default());
        let page = pagination.into_page(slice(0, pagination.window()), &Links::new("/a"));

        assert_eq!(page.count, 0);
        assert!(page.next.is_none() && page.previous.is_none());
    }

    #[test]
    fn test_window_preserves_order() {
        let window = Window { offset: 1, limit: 2 };
        assert_eq!(window.apply(vec!["c", "b", "a"]), vec!["b", "a"]);
    }
}
