//! Paging primitives shared by the `/page` listings.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

pub const DEFAULT_LINES_PER_PAGE: u32 = 10;
pub const MAX_LINES_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl core::str::FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            _ => Err(DomainError::integrity(format!(
                "direction must be ASC or DESC, got '{s}'"
            ))),
        }
    }
}

/// Zero-based page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub lines_per_page: u32,
    pub order_by: String,
    pub direction: Direction,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            lines_per_page: DEFAULT_LINES_PER_PAGE,
            order_by: "name".to_string(),
            direction: Direction::Asc,
        }
    }
}

impl PageRequest {
    /// Builds a request from optional query values, applying defaults and
    /// capping the page size.
    pub fn from_parts(
        page: Option<u32>,
        lines_per_page: Option<u32>,
        order_by: Option<String>,
        direction: Option<&str>,
    ) -> DomainResult<Self> {
        let lines_per_page = lines_per_page.unwrap_or(DEFAULT_LINES_PER_PAGE);
        if lines_per_page == 0 {
            return Err(DomainError::integrity("lines_per_page must be positive"));
        }
        Ok(Self {
            page: page.unwrap_or(0),
            lines_per_page: lines_per_page.min(MAX_LINES_PER_PAGE),
            order_by: order_by
                .filter(|o| !o.trim().is_empty())
                .unwrap_or_else(|| "name".to_string()),
            direction: direction.map(str::parse::<Direction>).transpose()?.unwrap_or_default(),
        })
    }

    pub fn offset(&self) -> usize {
        self.page as usize * self.lines_per_page as usize
    }
}

/// One page of an already filtered and ordered result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub number: u32,
    pub size: u32,
    pub number_of_elements: u32,
}

impl<T> Page<T> {
    /// Cuts the requested window out of `items`.
    pub fn slice(items: Vec<T>, request: &PageRequest) -> Self {
        let total = items.len();
        let size = request.lines_per_page.max(1) as usize;
        let total_pages = total.div_ceil(size) as u32;
        let content: Vec<T> = items.into_iter().skip(request.offset()).take(size).collect();
        Self {
            number_of_elements: content.len() as u32,
            content,
            total_elements: total as u64,
            total_pages,
            number: request.page,
            size: size as u32,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            number: self.number,
            size: self.size,
            number_of_elements: self.number_of_elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_requested_window() {
        let req = PageRequest::from_parts(Some(1), Some(3), None, None).unwrap();
        let page = Page::slice((1..=8).collect::<Vec<_>>(), &req);
        assert_eq!(page.content, vec![4, 5, 6]);
        assert_eq!(page.total_elements, 8);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.number, 1);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page = Page::<u8>::slice(Vec::new(), &PageRequest::default());
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.number_of_elements, 0);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let req = PageRequest::from_parts(Some(5), Some(10), None, None).unwrap();
        let page = Page::slice(vec![1, 2, 3], &req);
        assert!(page.content.is_empty());
        assert_eq!(page.total_elements, 3);
    }

    #[test]
    fn direction_is_case_insensitive_and_strict() {
        assert_eq!("desc".parse::<Direction>().unwrap(), Direction::Desc);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn caps_page_size() {
        let req = PageRequest::from_parts(None, Some(5_000), None, None).unwrap();
        assert_eq!(req.lines_per_page, MAX_LINES_PER_PAGE);
        assert!(PageRequest::from_parts(None, Some(0), None, None).is_err());
    }
}
