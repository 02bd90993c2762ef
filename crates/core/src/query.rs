use crate::models::{HistoryItem, HistoryQuery, PaginatedHistory, SortOrder};
use std::cmp::Ordering;

/// Filters, searches, sorts and pages a snapshot of history items.
///
/// `query` is expected to have passed [`HistoryQuery::validate`].
pub fn run_query(items: Vec<HistoryItem>, query: &HistoryQuery) -> PaginatedHistory {
    let search = query.search_term();

    let mut matched = items
        .into_iter()
        .filter(|item| query.type_filter.map_or(true, |kind| item.kind() == kind))
        .filter(|item| {
            search
                .as_deref()
                .map_or(true, |term| matches_search(item, term))
        })
        .collect::<Vec<_>>();

    matched.sort_by(|left, right| {
        let ascending = compare_by_time(left, right);
        match query.sort {
            SortOrder::Asc => ascending,
            SortOrder::Desc => ascending.reverse(),
        }
    });

    let per_page = query.per_page.max(1) as usize;
    let total = matched.len();
    let total_pages = total.div_ceil(per_page);
    let start = (query.page.max(1) as usize - 1).saturating_mul(per_page);

    let items = matched.into_iter().skip(start).take(per_page).collect();

    PaginatedHistory {
        items,
        total,
        page: query.page,
        per_page: query.per_page,
        total_pages,
    }
}

/// `term` must already be lowercased.
fn matches_search(item: &HistoryItem, term: &str) -> bool {
    item.content.to_lowercase().contains(term)
        || item
            .interaction
            .generated_text()
            .to_lowercase()
            .contains(term)
}

fn compare_by_time(left: &HistoryItem, right: &HistoryItem) -> Ordering {
    left.timestamp
        .cmp(&right.timestamp)
        .then_with(|| left.id.cmp(&right.id))
}
