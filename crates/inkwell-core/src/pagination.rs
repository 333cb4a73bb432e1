//! Page-number pagination for feeds.
//!
//! Out-of-range requests never fail: a missing or non-numeric page number
//! resolves to the first page, anything past either end resolves to the last
//! page, and an empty feed still has exactly one (empty) page.

/// Number of posts shown per page.
pub const PAGE_SIZE: usize = 10;

/// A page number as requested by the client, before it is resolved against a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageRequest {
    requested: Option<i64>,
}

impl PageRequest {
    /// The first page.
    pub fn first() -> Self {
        Self::default()
    }

    pub fn number(number: i64) -> Self {
        Self {
            requested: Some(number),
        }
    }

    /// Parse the raw `page` query value. Anything that is not an integer means "first page".
    pub fn parse(raw: Option<&str>) -> Self {
        Self {
            requested: raw.and_then(|value| value.trim().parse::<i64>().ok()),
        }
    }
}

/// Resolved position of a page inside a feed of `total` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

impl PageWindow {
    /// Cache discriminator. Keyed on the resolved page, so every request that
    /// lands on the same page (`?page=99`, `?page=-5`, ...) shares one entry.
    pub fn cache_key(&self) -> String {
        format!("page={}", self.number)
    }
}

/// Slices feeds into fixed-size pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl Paginator {
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    /// Number of pages for `total` items; never zero.
    pub fn num_pages(&self, total: usize) -> usize {
        total.div_ceil(self.per_page).max(1)
    }

    /// Resolve a request against a feed of `total` items.
    pub fn window(&self, total: usize, request: PageRequest) -> PageWindow {
        let num_pages = self.num_pages(total);
        let number = match request.requested {
            None => 1,
            Some(n) if n < 1 => num_pages,
            Some(n) => usize::try_from(n).map_or(num_pages, |n| n.min(num_pages)),
        };
        let offset = (number - 1) * self.per_page;
        let limit = self.per_page.min(total.saturating_sub(offset));

        PageWindow {
            number,
            num_pages,
            total,
            offset,
            limit,
        }
    }

    /// Paginate an already ordered in-memory sequence.
    pub fn paginate<T>(&self, items: Vec<T>, request: PageRequest) -> Page<T> {
        let window = self.window(items.len(), request);
        let items = items
            .into_iter()
            .skip(window.offset)
            .take(window.limit)
            .collect();
        Page::new(items, window)
    }
}

/// One page of a feed plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    items: Vec<T>,
    number: usize,
    num_pages: usize,
    total: usize,
}

impl<T> Page<T> {
    /// Assemble a page from items fetched for `window`.
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total: window.total,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 1-based page number.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    /// Size of the whole feed, not of this page.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous().then(|| self.number - 1)
    }

    /// Replace the items while keeping the page position.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}
