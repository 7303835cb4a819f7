pub mod http;
pub mod seed;
pub mod sqlite;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::{Course, Enrollment, LessonCompleted};

pub use http::{HttpSource, HttpSourceConfig};
pub use sqlite::SqliteSource;

/// Where courses, enrollments and lesson activity come from.
#[async_trait]
pub trait CourseSource: Send + Sync {
    async fn list_courses(&self) -> Result<Vec<Course>, AppError>;
    async fn list_enrollments(&self, user_id: &str) -> Result<Vec<Enrollment>, AppError>;
    /// Returns the existing enrollment when the user already joined the course.
    async fn enroll(&self, user_id: &str, course_id: &str) -> Result<Enrollment, AppError>;
    async fn record_lesson_complete(&self, event: &LessonCompleted) -> Result<(), AppError>;
    /// `None` when the source keeps no activity log.
    async fn list_activity(&self, user_id: &str) -> Result<Option<Vec<LessonCompleted>>, AppError>;

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Default)]
struct MemoryData {
    courses: Vec<Course>,
    enrollments: Vec<Enrollment>,
    activity: Vec<LessonCompleted>,
}

/// Mock data held in process; used for demos and tests.
pub struct MemorySource {
    data: RwLock<MemoryData>,
    track_activity: bool,
}

impl MemorySource {
    pub fn new(courses: Vec<Course>) -> Self {
        Self {
            data: RwLock::new(MemoryData {
                courses,
                ..Default::default()
            }),
            track_activity: true,
        }
    }

    pub fn with_seed() -> Result<Self, AppError> {
        Ok(Self::new(seed::demo_courses()?))
    }

    /// Drops the activity log, as a backend without event history would.
    pub fn without_activity(mut self) -> Self {
        self.track_activity = false;
        self
    }

    pub async fn set_courses(&self, courses: Vec<Course>) {
        self.data.write().await.courses = courses;
    }
}

#[async_trait]
impl CourseSource for MemorySource {
    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        Ok(self.data.read().await.courses.clone())
    }

    async fn list_enrollments(&self, user_id: &str) -> Result<Vec<Enrollment>, AppError> {
        Ok(self
            .data
            .read()
            .await
            .enrollments
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn enroll(&self, user_id: &str, course_id: &str) -> Result<Enrollment, AppError> {
        let mut data = self.data.write().await;
        if !data.courses.iter().any(|c| c.id == course_id) {
            return Err(AppError::NotFound);
        }
        if let Some(existing) = data.enrollments.iter().find(|e| e.matches(user_id, course_id)) {
            return Ok(existing.clone());
        }

        let enrollment = Enrollment::new(user_id, course_id);
        data.enrollments.push(enrollment.clone());
        Ok(enrollment)
    }

    async fn record_lesson_complete(&self, event: &LessonCompleted) -> Result<(), AppError> {
        let mut data = self.data.write().await;
        let MemoryData {
            courses,
            enrollments,
            activity,
        } = &mut *data;

        let course = courses
            .iter()
            .find(|c| c.id == event.course_id)
            .ok_or(AppError::NotFound)?;
        let enrollment = enrollments
            .iter_mut()
            .find(|e| e.matches(&event.user_id, &event.course_id))
            .ok_or(AppError::NotFound)?;

        if course.lesson(&event.lesson_id).is_none() {
            return Err(AppError::NotFound);
        }
        if enrollment.is_lesson_complete(&event.lesson_id) {
            return Ok(());
        }

        enrollment
            .completed_lessons
            .insert(event.lesson_id.clone(), true);
        if self.track_activity {
            activity.push(event.clone());
        }
        Ok(())
    }

    async fn list_activity(&self, user_id: &str) -> Result<Option<Vec<LessonCompleted>>, AppError> {
        if !self.track_activity {
            return Ok(None);
        }
        Ok(Some(
            self.data
                .read()
                .await
                .activity
                .iter()
                .filter(|ev| ev.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }
}
