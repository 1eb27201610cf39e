//! Catalog sort orders, shared by both backends so that listings come back
//! in the same order whichever store serves them. Ties fall back to the
//! story id.

use std::cmp::Ordering;

use domains::{CatalogSort, StorySummary};

pub(crate) fn compare_summaries(sort: CatalogSort, a: &StorySummary, b: &StorySummary) -> Ordering {
    let primary = match sort {
        CatalogSort::Updated => b.last_updated_at.cmp(&a.last_updated_at),
        CatalogSort::Newest => b.created_at.cmp(&a.created_at),
        CatalogSort::Views => b.view_count.cmp(&a.view_count),
        CatalogSort::Rating => b
            .rating
            .mean
            .total_cmp(&a.rating.mean)
            .then_with(|| b.rating.count.cmp(&a.rating.count)),
        CatalogSort::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[cfg(feature = "db-postgres")]
pub(crate) fn order_by_clause(sort: CatalogSort) -> &'static str {
    match sort {
        CatalogSort::Updated => "s.last_updated_at DESC, s.id ASC",
        CatalogSort::Newest => "s.created_at DESC, s.id ASC",
        CatalogSort::Views => "s.view_count DESC, s.id ASC",
        CatalogSort::Rating => "s.rating_mean DESC, s.rating_count DESC, s.id ASC",
        CatalogSort::Title => "LOWER(s.title) ASC, s.id ASC",
    }
}
