use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::catalog::filter::filter_and_sort;
use crate::error::AppError;
use crate::models::{Course, FilterCriteria};
use crate::source::CourseSource;

pub const DEFAULT_PAGE_SIZE: usize = 6;

/// One window of a filtered catalog listing. Clients "load more" by asking for
/// the next window at `offset + limit`.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub criteria: FilterCriteria,
    pub offset: usize,
    pub limit: usize,
}

impl CatalogQuery {
    pub fn new(criteria: FilterCriteria, page_size: usize) -> Self {
        Self {
            criteria,
            offset: 0,
            limit: page_size.max(1),
        }
    }

    pub fn starting_at(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub total: usize,
    pub offset: usize,
    pub courses: Vec<Course>,
    pub has_more: bool,
}

struct Snapshot {
    courses: Vec<Course>,
    refreshed_at: Option<DateTime<Utc>>,
}

/// Shared course list. Refreshes swap the whole list so readers never
/// observe a partially loaded catalog.
pub struct CatalogStore {
    inner: RwLock<Snapshot>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl CatalogStore {
    pub fn new(courses: Vec<Course>) -> Self {
        Self {
            inner: RwLock::new(Snapshot {
                courses,
                refreshed_at: None,
            }),
        }
    }

    pub async fn replace(&self, courses: Vec<Course>) {
        let mut guard = self.inner.write().await;
        guard.courses = courses;
        guard.refreshed_at = Some(Utc::now());
    }

    /// Reloads the catalog from `source`. On failure the previous list stays.
    pub async fn refresh(&self, source: &dyn CourseSource) -> Result<usize, AppError> {
        let courses: Vec<Course> = source
            .list_courses()
            .await?
            .into_iter()
            .map(|course| match course.validate() {
                Ok(()) => course,
                Err(e) => {
                    warn!("clamping malformed course: {}", e);
                    course.sanitized()
                }
            })
            .collect();

        let count = courses.len();
        self.replace(courses).await;
        info!("catalog refreshed with {} courses", count);
        Ok(count)
    }

    pub async fn courses(&self) -> Vec<Course> {
        self.inner.read().await.courses.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.courses.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.refreshed_at
    }

    pub async fn get(&self, course_id: &str) -> Option<Course> {
        self.inner
            .read()
            .await
            .courses
            .iter()
            .find(|c| c.id == course_id)
            .cloned()
    }

    pub async fn browse(&self, query: &CatalogQuery) -> CatalogPage {
        let filtered = {
            let guard = self.inner.read().await;
            filter_and_sort(&guard.courses, &query.criteria)
        };

        let total = filtered.len();
        let courses: Vec<Course> = filtered
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();
        let has_more = query.offset.saturating_add(courses.len()) < total;

        CatalogPage {
            total,
            offset: query.offset,
            courses,
            has_more,
        }
    }
}
