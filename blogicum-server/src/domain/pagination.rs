/// Listings are always cut into pages of this many items.
pub(crate) const PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pagination {
    pub(crate) page: u32,
    pub(crate) page_size: u32,
}

impl Pagination {
    pub(crate) fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub(crate) fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Page<T> {
    pub(crate) items: Vec<T>,
    pub(crate) number: u32,
    pub(crate) num_pages: u32,
    pub(crate) count: i64,
}

impl<T> Page<T> {
    pub(crate) fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub(crate) fn has_previous(&self) -> bool {
        self.number > 1
    }
}

/// Number of pages for `count` items; an empty listing still has one page.
pub(crate) fn num_pages(count: i64, page_size: u32) -> u32 {
    let page_size = i64::from(page_size.max(1));
    let pages = (count.max(0) + page_size - 1) / page_size;
    u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
}

/// Resolves the raw `page` query value against the listing size.
///
/// Missing or non-numeric input yields the first page. Numbers below one or
/// past the end clamp to the last page.
pub(crate) fn resolve_page(raw: Option<&str>, count: i64, page_size: u32) -> Pagination {
    let last = num_pages(count, page_size);
    let page = match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => 1,
        Some(value) => match value.parse::<i64>() {
            Err(_) => 1,
            Ok(number) if number < 1 || number > i64::from(last) => last,
            Ok(number) => number as u32,
        },
    };
    Pagination { page, page_size }
}
