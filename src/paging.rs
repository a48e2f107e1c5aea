//! Working-set caps and paged views. Capping is a final pipeline stage,
//! applied after filtering and aggregation so displayed totals never mix
//! capped and uncapped counts.

/// Default cap for table-style consumers.
pub const DEFAULT_TABLE_CAP: usize = 2000;
/// Default cap for dashboard metric consumers.
pub const DEFAULT_METRICS_CAP: usize = 1000;
/// Default page size for tabular views.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// At most the first `max_count` items.
pub fn limit<T>(items: &[T], max_count: usize) -> &[T] {
    &items[..items.len().min(max_count)]
}

/// One page of a sliced view.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based page number actually served (clamped into range).
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slices `items` into the requested 1-based page. Out-of-range requests
/// clamp to the nearest valid page; a zero `per_page` falls back to the
/// default page size.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = if per_page == 0 { DEFAULT_PAGE_SIZE } else { per_page };
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total_items);
    Page {
        items: &items[start.min(total_items)..end],
        page,
        per_page,
        total_items,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_slices_prefix() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(limit(&items, 3), &[0, 1, 2]);
        assert_eq!(limit(&items, 100).len(), 10);
        assert!(limit(&items, 0).is_empty());
    }

    #[test]
    fn test_paginate_pages() {
        let items: Vec<u32> = (0..105).collect();
        let first = paginate(&items, 1, 50);
        assert_eq!(first.items.len(), 50);
        assert_eq!(first.total_pages, 3);

        let last = paginate(&items, 3, 50);
        assert_eq!(last.items.len(), 5);
        assert_eq!(last.items[0], 100);
    }

    #[test]
    fn test_paginate_clamps_out_of_range() {
        let items: Vec<u32> = (0..10).collect();
        let page = paginate(&items, 99, 50);
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 10);

        let empty: Vec<u32> = Vec::new();
        let page = paginate(&empty, 1, 50);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }
}
