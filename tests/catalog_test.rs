use chrono::{Duration, TimeZone, Utc};
use course_catalog::catalog::filter_and_sort;
use course_catalog::models::{Course, FilterCriteria, Level, SortKey};
use course_catalog::source::seed::demo_courses;

fn course(id: u32, category: &str, price: f64, students: u32, rating: f64) -> Course {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(id as i64);
    Course {
        id: id.to_string(),
        title: format!("Course {}", id),
        description: String::new(),
        category: category.to_string(),
        level: Level::Beginner,
        price,
        discount: None,
        duration: String::new(),
        rating,
        students,
        lessons: Vec::new(),
        instructor: None,
        created_at: created,
        updated_at: created,
    }
}

fn ids(courses: &[Course]) -> Vec<String> {
    courses.iter().map(|c| c.id.clone()).collect()
}

fn all_with(sort: SortKey) -> FilterCriteria {
    FilterCriteria::from_raw(Some("All"), Some("All"), Some(""), Some(sort.as_str()))
}

#[test]
fn test_price_low_scenario() {
    let courses = vec![
        course(1, "Programming", 50.0, 10, 4.5),
        course(2, "Design", 30.0, 20, 4.0),
    ];
    let result = filter_and_sort(&courses, &all_with(SortKey::PriceLow));
    assert_eq!(ids(&result), vec!["2", "1"]);
}

#[test]
fn test_all_criteria_keep_every_course() {
    let courses = demo_courses().expect("demo catalog");
    for sort in [SortKey::Popular, SortKey::Newest, SortKey::PriceLow, SortKey::PriceHigh] {
        let result = filter_and_sort(&courses, &all_with(sort));
        assert_eq!(result.len(), courses.len());

        let mut got = ids(&result);
        let mut want = ids(&courses);
        got.sort();
        want.sort();
        assert_eq!(got, want, "courses dropped or duplicated for {:?}", sort);
    }
}

#[test]
fn test_idempotent() {
    let courses = demo_courses().expect("demo catalog");
    let criteria = FilterCriteria::from_raw(Some("Programming"), None, Some("a"), Some("price-high"));
    let first = filter_and_sort(&courses, &criteria);
    let second = filter_and_sort(&courses, &criteria);
    assert_eq!(first, second);
}

#[test]
fn test_price_low_reversed_is_price_high() {
    let courses = demo_courses().expect("demo catalog");
    let mut low = filter_and_sort(&courses, &all_with(SortKey::PriceLow));
    let high = filter_and_sort(&courses, &all_with(SortKey::PriceHigh));
    low.reverse();

    let low_prices: Vec<f64> = low.iter().map(Course::effective_price).collect();
    let high_prices: Vec<f64> = high.iter().map(Course::effective_price).collect();
    assert_eq!(low_prices, high_prices);
}

#[test]
fn test_search_react_case_insensitive() {
    let mut react = course(1, "Programming", 89.99, 10, 4.8);
    react.title = "Complete React Developer Course".to_string();
    let mut design = course(2, "Design", 79.99, 10, 4.7);
    design.title = "UI/UX Design".to_string();

    let criteria = FilterCriteria::from_raw(None, None, Some("react"), None);
    let result = filter_and_sort(&[react, design], &criteria);
    assert_eq!(ids(&result), vec!["1"]);
}

#[test]
fn test_unknown_sort_falls_back_to_popular() {
    let courses = vec![
        course(1, "Design", 10.0, 5, 4.0),
        course(2, "Design", 10.0, 50, 4.0),
    ];
    let criteria = FilterCriteria::from_raw(None, None, None, Some("by-vibes"));
    assert_eq!(criteria.sort, SortKey::Popular);
    assert_eq!(ids(&filter_and_sort(&courses, &criteria)), vec!["2", "1"]);
}

#[test]
fn test_newest_on_demo_catalog() {
    let courses = demo_courses().expect("demo catalog");
    let result = filter_and_sort(&courses, &all_with(SortKey::Newest));
    let stamps: Vec<_> = result.iter().map(|c| c.created_at).collect();
    assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_filter_matches_predicate() {
    let courses = demo_courses().expect("demo catalog");
    let criteria = FilterCriteria::from_raw(Some("Programming"), Some("Advanced"), None, None);
    let result = filter_and_sort(&courses, &criteria);
    assert!(!result.is_empty());
    assert!(result
        .iter()
        .all(|c| c.category == "Programming" && c.level == Level::Advanced));
}
