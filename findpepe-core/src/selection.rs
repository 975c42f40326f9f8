//! Query descriptions and the pages they produce.
//!
//! Pagination law: `offset` is a zero-based page index. With page size `P`
//! the page holds records `[offset * P, (offset + 1) * P)` of the stable
//! enumeration order for the selection. Windows never overlap and an offset
//! past the end yields an empty page.

use std::num::{IntErrorKind, NonZeroU32};
use std::ops::Range;

use serde::Serialize;

use crate::error::{CatalogError, Result};
use crate::types::{Board, Category, ImageRecord};

pub const DEFAULT_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(25).unwrap();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    index: u64,
    size: NonZeroU32,
}

impl PageRequest {
    pub const fn new(index: u64, size: NonZeroU32) -> Self {
        Self { index, size }
    }

    pub const fn first(size: NonZeroU32) -> Self {
        Self::new(0, size)
    }

    /// Parse a raw `offset` value. Absent or empty means the first page.
    pub fn parse(raw: Option<&str>, size: NonZeroU32) -> Result<Self> {
        let raw = match raw {
            None => return Ok(Self::first(size)),
            Some(value) if value.is_empty() => return Ok(Self::first(size)),
            Some(value) => value,
        };

        // Offsets too large for u64 are still past the end of any corpus.
        let index = match raw.parse::<u64>() {
            Ok(index) => index,
            Err(err) if *err.kind() == IntErrorKind::PosOverflow => u64::MAX,
            Err(_) => {
                return Err(CatalogError::InvalidPagination(
                    "Offset has to be a non-negative integer".to_string(),
                ));
            }
        };

        Ok(Self::new(index, size))
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn size(&self) -> u32 {
        self.size.get()
    }

    /// Position of the first record on this page.
    pub fn start(&self) -> u64 {
        self.index.saturating_mul(u64::from(self.size.get()))
    }

    pub fn end(&self) -> u64 {
        self.start().saturating_add(u64::from(self.size.get()))
    }

    pub fn window(&self) -> Range<u64> {
        self.start()..self.end()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// A filter plus pagination. Built once per request from validated input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    category: Option<Category>,
    board: Option<Board>,
    page: PageRequest,
}

impl Selection {
    pub fn new(
        category: Option<Category>,
        board: Option<Board>,
        page: PageRequest,
    ) -> Self {
        Self {
            category,
            board,
            page,
        }
    }

    /// No filters: the whole corpus.
    pub fn all(page: PageRequest) -> Self {
        Self::new(None, None, page)
    }

    /// Build a selection from raw request parameters. The category is
    /// checked first, then the offset; nothing here touches a backing.
    /// Empty values count as absent.
    pub fn from_params(
        category: Option<&str>,
        board: Option<&str>,
        offset: Option<&str>,
        page_size: NonZeroU32,
    ) -> Result<Self> {
        let category = category
            .filter(|raw| !raw.is_empty())
            .map(str::parse::<Category>)
            .transpose()?;
        let page = PageRequest::parse(offset, page_size)?;
        let board = board.filter(|raw| !raw.is_empty()).map(Board::from);

        Ok(Self::new(category, board, page))
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_board(mut self, board: impl Into<Board>) -> Self {
        self.board = Some(board.into());
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn page(&self) -> PageRequest {
        self.page
    }

    /// Categories the selection ranges over, in enumeration order.
    pub fn categories(&self) -> Vec<Category> {
        match self.category {
            Some(category) => vec![category],
            None => Category::ALL.to_vec(),
        }
    }

    /// AND of both filters; an absent filter matches everything.
    pub fn matches(&self, record: &ImageRecord) -> bool {
        self.category.is_none_or(|category| record.category == category)
            && self.board.as_ref().is_none_or(|board| &record.board == board)
    }
}

/// A bounded slice of a selection's enumeration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub index: u64,
    pub size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest) -> Self {
        debug_assert!(items.len() <= request.size() as usize);
        Self {
            items,
            index: request.index(),
            size: request.size(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position of the first item within the full enumeration.
    pub fn start(&self) -> u64 {
        self.index.saturating_mul(u64::from(self.size))
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn try_map<U, E, F>(self, f: F) -> std::result::Result<Page<U>, E>
    where
        F: FnMut(T) -> std::result::Result<U, E>,
    {
        let items = self
            .items
            .into_iter()
            .map(f)
            .collect::<std::result::Result<Vec<_>, E>>()?;
        Ok(Page {
            items,
            index: self.index,
            size: self.size,
        })
    }
}
