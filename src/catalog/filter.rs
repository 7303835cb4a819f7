use std::cmp::Ordering;

use crate::models::{Course, FilterCriteria, SortKey};

/// Applies category, level, price and search filters, then a stable sort.
pub fn filter_and_sort(courses: &[Course], criteria: &FilterCriteria) -> Vec<Course> {
    let needle = criteria.search.trim().to_lowercase();

    let mut filtered: Vec<Course> = courses
        .iter()
        .filter(|c| matches(c, criteria, &needle))
        .cloned()
        .collect();

    sort_courses(&mut filtered, criteria.sort);
    filtered
}

fn matches(course: &Course, criteria: &FilterCriteria, needle: &str) -> bool {
    let category_ok = criteria
        .category
        .as_ref()
        .is_none_or(|cat| &course.category == cat);
    let level_ok = criteria.level.matches(course.level);

    let price = course.effective_price();
    let price_ok = criteria.min_price.is_none_or(|min| price >= min)
        && criteria.max_price.is_none_or(|max| price <= max);

    let search_ok = needle.is_empty()
        || course.title.to_lowercase().contains(needle)
        || course.description.to_lowercase().contains(needle);

    category_ok && level_ok && price_ok && search_ok
}

/// `sort_by` is stable, so equal keys keep their input order.
pub fn sort_courses(courses: &mut [Course], key: SortKey) {
    match key {
        SortKey::Popular => courses.sort_by(|a, b| {
            b.students
                .cmp(&a.students)
                .then_with(|| b.rating.total_cmp(&a.rating))
        }),
        SortKey::Newest => courses.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::PriceLow => courses.sort_by(|a, b| cmp_price(a, b)),
        SortKey::PriceHigh => courses.sort_by(|a, b| cmp_price(b, a)),
    }
}

fn cmp_price(a: &Course, b: &Course) -> Ordering {
    a.effective_price().total_cmp(&b.effective_price())
}
