use std::num::NonZeroUsize;

/// A contiguous run of at most `page_size` items, tagged with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub index: usize,
    pub items: Vec<T>,
}

/// Splits `items` into order-preserving pages of `page_size`; only the last
/// page may be shorter. Empty input yields no pages.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page_size: NonZeroUsize) -> Vec<Page<T>> {
    let size = page_size.get();
    let mut pages = Vec::with_capacity(items.len().div_ceil(size));
    let mut rest = items.into_iter().peekable();

    while rest.peek().is_some() {
        pages.push(Page {
            index: pages.len(),
            items: rest.by_ref().take(size).collect(),
        });
    }
    pages
}
