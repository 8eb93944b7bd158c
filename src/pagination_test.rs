use super::*;

#[test]
fn defaults_to_first_page_of_ten() {
    let page = PageRequest::default();
    assert_eq!(page, PageRequest { page: 1, limit: 10 });
    assert_eq!(page.offset(), 0);
}

#[test]
fn clamps_out_of_range_values() {
    assert_eq!(PageRequest::from_params(Some(0), Some(0)), PageRequest { page: 1, limit: 1 });
    assert_eq!(PageRequest::from_params(Some(-4), Some(10_000)), PageRequest { page: 1, limit: MAX_PAGE_SIZE });
}

#[test]
fn offset_skips_previous_pages() {
    assert_eq!(PageRequest::from_params(Some(3), Some(10)).offset(), 20);
}

#[test]
fn page_count_is_ceiling() {
    let page = PageRequest::from_params(None, Some(10));
    assert_eq!(page.page_count(0), 0);
    assert_eq!(page.page_count(1), 1);
    assert_eq!(page.page_count(10), 1);
    assert_eq!(page.page_count(25), 3);
}

#[test]
fn slice_returns_partial_last_page() {
    let items: Vec<u32> = (0..25).collect();
    let third = PageRequest::from_params(Some(3), Some(10)).slice(items.clone());
    assert_eq!(third, vec![20, 21, 22, 23, 24]);
    let beyond = PageRequest::from_params(Some(4), Some(10)).slice(items);
    assert!(beyond.is_empty());
}

#[test]
fn huge_page_does_not_overflow() {
    let page = PageRequest::from_params(Some(i64::MAX), Some(100));
    assert_eq!(page.offset(), i64::MAX);
    assert!(page.slice(vec![1, 2, 3]).is_empty());
}
