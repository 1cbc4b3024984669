//! Page requests and page envelopes shared by the store and the HTTP layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Lenient parse used for query strings: anything but `desc` is ascending.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        if s.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Zero-based page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort_by: String,
    pub sort_dir: SortDirection,
}

impl PageRequest {
    #[must_use]
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.max(1),
            sort_by: "id".into(),
            sort_dir: SortDirection::Asc,
        }
    }

    #[must_use]
    pub fn sorted(mut self, sort_by: impl Into<String>, sort_dir: SortDirection) -> Self {
        self.sort_by = sort_by.into();
        self.sort_dir = sort_dir;
        self
    }

    /// Clamp the page size into `1..=max`.
    #[must_use]
    pub fn capped(mut self, max: u32) -> Self {
        self.size = self.size.clamp(1, max.max(1));
        self
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub number: u32,
    pub size: u32,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        let size = u64::from(request.size.max(1));
        let total_pages = total_elements.div_ceil(size);
        Self {
            content,
            total_elements,
            total_pages,
            number: request.page,
            size: request.size,
            first: request.page == 0,
            last: u64::from(request.page) + 1 >= total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            number: self.number,
            size: self.size,
            first: self.first,
            last: self.last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_totals() {
        let req = PageRequest::new(1, 10);
        let page = Page::new(vec![1, 2, 3], &req, 23);
        assert_eq!(page.total_pages, 3);
        assert!(!page.first);
        assert!(!page.last);
        assert_eq!(req.offset(), 10);

        let last = Page::new(vec![1], &PageRequest::new(2, 10), 21);
        assert!(last.last);
    }

    #[test]
    fn empty_page_is_first_and_last() {
        let page: Page<i32> = Page::new(vec![], &PageRequest::new(0, 10), 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.first && page.last);
    }

    #[test]
    fn size_is_capped() {
        assert_eq!(PageRequest::new(0, 500).capped(100).size, 100);
        assert_eq!(PageRequest::new(0, 0).capped(100).size, 1);
    }

    #[test]
    fn lenient_sort_direction() {
        assert_eq!(SortDirection::parse_lenient("DESC"), SortDirection::Desc);
        assert_eq!(SortDirection::parse_lenient("whatever"), SortDirection::Asc);
    }
}
