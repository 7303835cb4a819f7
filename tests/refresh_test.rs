use std::sync::Arc;
use std::time::Duration;

use course_catalog::catalog::{CatalogQuery, CatalogStore};
use course_catalog::models::FilterCriteria;
use course_catalog::services::CatalogRefresher;
use course_catalog::source::{CourseSource, MemorySource, seed::demo_courses};

#[tokio::test]
async fn test_run_once_loads_catalog() {
    let source: Arc<dyn CourseSource> = Arc::new(MemorySource::with_seed().unwrap());
    let catalog = Arc::new(CatalogStore::default());

    let refresher = CatalogRefresher::new(catalog.clone(), source, 60);
    assert_eq!(refresher.run_once().await.unwrap(), 6);
    assert_eq!(catalog.len().await, 6);
}

#[tokio::test]
async fn test_refresher_picks_up_new_courses() {
    let source = Arc::new(MemorySource::new(Vec::new()));
    let catalog = Arc::new(CatalogStore::default());
    assert!(catalog.is_empty().await);

    let refresher = CatalogRefresher::new(catalog.clone(), source.clone(), 1);
    let task = tokio::spawn(refresher.start());

    source.set_courses(demo_courses().unwrap()).await;
    tokio::time::sleep(Duration::from_millis(1500)).await;
    task.abort();

    let page = catalog
        .browse(&CatalogQuery::new(FilterCriteria::default(), 3))
        .await;
    assert_eq!(page.total, 6);
    assert_eq!(page.courses.len(), 3);
    assert!(page.has_more);
}
