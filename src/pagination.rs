use serde::{Deserialize, Serialize};

/// Raw `limit`/`offset` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub indicators: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Slice `items` by the requested page. A zero or missing limit uses
/// `default_limit`; larger limits are clamped to `max_limit`.
pub fn paginate<T: Clone>(
    items: &[T],
    params: PageParams,
    default_limit: usize,
    max_limit: usize,
) -> Page<T> {
    let limit = match params.limit {
        Some(0) | None => default_limit,
        Some(l) => l,
    }
    .min(max_limit.max(1));
    let offset = params.offset.unwrap_or(0);

    let indicators = items.iter().skip(offset).take(limit).cloned().collect();
    Page {
        indicators,
        total: items.len(),
        limit,
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page() {
        let items: Vec<u64> = (1..=25).collect();
        let page = paginate(&items, PageParams::default(), 10, 100);
        assert_eq!(page.indicators, (1..=10).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
        assert_eq!(page.limit, 10);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_offset_past_end() {
        let items: Vec<u64> = (1..=5).collect();
        let page = paginate(&items, PageParams { limit: Some(3), offset: Some(4) }, 10, 100);
        assert_eq!(page.indicators, vec![5]);
        let page = paginate(&items, PageParams { limit: Some(3), offset: Some(40) }, 10, 100);
        assert!(page.indicators.is_empty());
        assert_eq!(page.total, 5);
    }

    #[test]
    fn test_limit_clamped() {
        let items: Vec<u64> = (1..=500).collect();
        let page = paginate(&items, PageParams { limit: Some(1000), offset: None }, 10, 100);
        assert_eq!(page.limit, 100);
        assert_eq!(page.indicators.len(), 100);
    }
}
