use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::services::LearningService;
use crate::source::CourseSource;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogStore>,
    pub source: Arc<dyn CourseSource>,
    pub page_size: usize,
}

impl AppState {
    pub fn new(catalog: Arc<CatalogStore>, source: Arc<dyn CourseSource>, page_size: usize) -> Self {
        Self {
            catalog,
            source,
            page_size,
        }
    }

    pub fn learning(&self) -> LearningService {
        LearningService::new(self.catalog.clone(), self.source.clone())
    }
}
