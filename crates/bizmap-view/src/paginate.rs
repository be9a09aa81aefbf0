/// One page of a larger collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// Always at least 1, even for an empty collection.
    pub total_pages: usize,
    /// The requested 1-based index clamped into `1..=total_pages`.
    pub clamped_page_index: usize,
}

impl<T> Page<'_, T> {
    /// True when `requested` was out of range and had to be clamped.
    #[must_use]
    pub fn was_clamped(&self, requested: usize) -> bool {
        self.clamped_page_index != requested
    }
}

/// Slices `items` into the 1-based page `page_index` of `page_size` items.
///
/// A `page_size` of zero is treated as one.
#[must_use]
pub fn paginate<T>(items: &[T], page_index: usize, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_pages = items.len().div_ceil(page_size).max(1);
    let clamped_page_index = page_index.clamp(1, total_pages);

    let start = (clamped_page_index - 1) * page_size;
    let end = (start + page_size).min(items.len());
    let items = items.get(start..end).unwrap_or_default();

    Page {
        items,
        total_pages,
        clamped_page_index,
    }
}
