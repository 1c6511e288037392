//! Fixed-size pages over an ordered listing.
//!
//! Page numbers come straight from the `?page=` query parameter and are
//! clamped rather than rejected: garbage falls back to the first page and
//! anything out of range lands on the last one.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum::http::Uri;

/// Posts shown on every paginated listing.
pub const POSTS_PER_PAGE: u32 = 10;

/// `?page=` as sent by the client, kept raw so clamping can see bad input.
#[derive(Debug, Default)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            page: last_value(pairs, "page"),
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

/// Never rejects: a repeated `page` keeps its last value and an
/// undecodable query string reads as empty.
impl<S: Send + Sync> FromRequestParts<S> for PageQuery {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_pairs(&query_pairs(&parts.uri)))
    }
}

/// Decoded `name=value` pairs of the query string, in order.
pub fn query_pairs(uri: &Uri) -> Vec<(String, String)> {
    Query::<Vec<(String, String)>>::try_from_uri(uri)
        .map(|Query(pairs)| pairs)
        .unwrap_or_default()
}

/// Last value sent for `name`.
pub fn last_value(pairs: &[(String, String)], name: &str) -> Option<String> {
    pairs
        .iter()
        .rev()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub count: i64,
}

/// One entry of the page navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub number: u32,
    pub current: bool,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }

    pub fn previous_page_number(&self) -> u32 {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_page_number(&self) -> u32 {
        (self.number + 1).min(self.num_pages)
    }

    pub fn links(&self) -> Vec<PageLink> {
        (1..=self.num_pages)
            .map(|number| PageLink {
                number,
                current: number == self.number,
            })
            .collect()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
        }
    }
}

/// Total pages for `count` rows. An empty listing still has one page.
pub fn num_pages(count: i64, per_page: u32) -> u32 {
    if count <= 0 {
        return 1;
    }
    let per_page = i64::from(per_page.max(1));
    ((count + per_page - 1) / per_page) as u32
}

/// Resolve the requested page number against the page count.
pub fn resolve_page(raw: Option<&str>, num_pages: u32) -> u32 {
    let Some(raw) = raw else {
        return 1;
    };
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 1 && n <= i64::from(num_pages) => n as u32,
        Ok(_) => num_pages,
        Err(_) => 1,
    }
}

/// Build a page from a row count and a fetcher taking `(limit, offset)`.
pub fn paginate<T, E>(
    count: i64,
    raw_page: Option<&str>,
    per_page: u32,
    fetch: impl FnOnce(i64, i64) -> Result<Vec<T>, E>,
) -> Result<Page<T>, E> {
    let pages = num_pages(count, per_page);
    let number = resolve_page(raw_page, pages);
    let offset = i64::from(number - 1) * i64::from(per_page);
    let items = fetch(i64::from(per_page), offset)?;

    Ok(Page {
        items,
        number,
        num_pages: pages,
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_of(count: i64, raw: Option<&str>) -> Page<i64> {
        paginate::<_, ()>(count, raw, POSTS_PER_PAGE, |limit, offset| {
            Ok((offset..(offset + limit).min(count)).collect())
        })
        .unwrap()
    }

    #[test]
    fn thirteen_items_split_ten_and_three() {
        let first = page_of(13, None);
        assert_eq!(first.len(), 10);
        assert_eq!(first.num_pages, 2);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let second = page_of(13, Some("2"));
        assert_eq!(second.len(), 3);
        assert_eq!(second.items, vec![10, 11, 12]);
        assert!(!second.has_next());
        assert_eq!(second.previous_page_number(), 1);
    }

    #[test]
    fn empty_listing_has_one_empty_page() {
        let page = page_of(0, Some("3"));
        assert_eq!(page.num_pages, 1);
        assert_eq!(page.number, 1);
        assert!(page.is_empty());
        assert!(!page.has_other_pages());
    }

    #[test]
    fn out_of_range_pages_clamp_to_last() {
        assert_eq!(resolve_page(Some("99"), 3), 3);
        assert_eq!(resolve_page(Some("0"), 3), 3);
        assert_eq!(resolve_page(Some("-1"), 3), 3);
    }

    #[test]
    fn garbage_pages_fall_back_to_first() {
        assert_eq!(resolve_page(Some("abc"), 3), 1);
        assert_eq!(resolve_page(Some("2.5"), 3), 1);
        assert_eq!(resolve_page(Some(""), 3), 1);
        assert_eq!(resolve_page(None, 3), 1);
    }

    #[test]
    fn exact_multiple_does_not_add_a_page() {
        assert_eq!(num_pages(20, 10), 2);
        assert_eq!(num_pages(21, 10), 3);
    }

    #[test]
    fn repeated_page_keeps_last_value() {
        let uri: Uri = "/profile/leo/?page=1&q=x&page=2".parse().unwrap();
        let query = PageQuery::from_pairs(&query_pairs(&uri));
        assert_eq!(query.raw(), Some("2"));

        let uri: Uri = "/".parse().unwrap();
        assert_eq!(PageQuery::from_pairs(&query_pairs(&uri)).raw(), None);
    }

    #[test]
    fn links_mark_current_page() {
        let page = page_of(25, Some("2"));
        let links = page.links();
        assert_eq!(links.len(), 3);
        assert!(links[1].current);
        assert!(!links[0].current && !links[2].current);
    }
}
