use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::CatalogStore;
use crate::error::AppError;
use crate::models::{Course, Enrollment, LessonCompleted};
use crate::progress::{
    self, DashboardSummary, EnrolledCourse, EnrollmentStatus, LessonOutcome, NextLesson,
};
use crate::source::CourseSource;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonRef {
    pub id: String,
    pub title: String,
}

/// What the course detail and lesson pages need to pick "Enroll" vs
/// "Continue Learning" and draw the progress bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseEnrollmentView {
    pub course_id: String,
    pub enrolled: bool,
    pub progress: u8,
    pub status: EnrollmentStatus,
    /// `None` once every lesson is complete or when the course has none.
    pub next_lesson: Option<LessonRef>,
}

impl CourseEnrollmentView {
    fn build(user_id: &str, course: &Course, enrollments: &[Enrollment]) -> Self {
        let status = progress::status(user_id, course, enrollments);
        let next_lesson = match progress::next_lesson(user_id, course, enrollments) {
            NextLesson::Lesson(l) => Some(LessonRef {
                id: l.id.clone(),
                title: l.title.clone(),
            }),
            NextLesson::Completed | NextLesson::Empty => None,
        };

        Self {
            course_id: course.id.clone(),
            enrolled: status.is_enrolled(),
            progress: progress::progress(user_id, course, enrollments),
            status,
            next_lesson,
        }
    }
}

/// Per-request glue between the catalog, the course source and the pure
/// enrollment/progress derivations.
pub struct LearningService {
    catalog: Arc<CatalogStore>,
    source: Arc<dyn CourseSource>,
}

impl LearningService {
    pub fn new(catalog: Arc<CatalogStore>, source: Arc<dyn CourseSource>) -> Self {
        Self { catalog, source }
    }

    async fn course(&self, course_id: &str) -> Result<Course, AppError> {
        self.catalog.get(course_id).await.ok_or(AppError::NotFound)
    }

    pub async fn course_view(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<CourseEnrollmentView, AppError> {
        let course = self.course(course_id).await?;
        let enrollments = self.source.list_enrollments(user_id).await?;
        Ok(CourseEnrollmentView::build(user_id, &course, &enrollments))
    }

    /// Called once checkout has succeeded.
    pub async fn enroll(&self, user_id: &str, course_id: &str) -> Result<Enrollment, AppError> {
        self.course(course_id).await?;
        let enrollment = self.source.enroll(user_id, course_id).await?;
        info!("user {} enrolled in course {}", user_id, course_id);
        Ok(enrollment)
    }

    pub async fn complete_lesson(
        &self,
        event: LessonCompleted,
    ) -> Result<CourseEnrollmentView, AppError> {
        let course = self.course(&event.course_id).await?;
        let mut enrollments = self.source.list_enrollments(&event.user_id).await?;

        let enrollment = enrollments
            .iter_mut()
            .find(|e| e.matches(&event.user_id, &event.course_id))
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "user {} is not enrolled in course {}",
                    event.user_id, event.course_id
                ))
            })?;

        match enrollment.complete_lesson(&course, &event.lesson_id) {
            LessonOutcome::UnknownLesson => return Err(AppError::NotFound),
            LessonOutcome::AlreadyComplete | LessonOutcome::CourseCompleted => {
                debug!(
                    "lesson {} of course {} already complete for {}",
                    event.lesson_id, event.course_id, event.user_id
                );
            }
            LessonOutcome::Recorded { from, to } => {
                self.source.record_lesson_complete(&event).await?;
                if from != to {
                    info!(
                        "user {} course {}: {:?} -> {:?}",
                        event.user_id, event.course_id, from, to
                    );
                }
            }
        }

        Ok(CourseEnrollmentView::build(&event.user_id, &course, &enrollments))
    }

    pub async fn my_courses(&self, user_id: &str) -> Result<Vec<EnrolledCourse>, AppError> {
        let courses = self.catalog.courses().await;
        let enrollments = self.source.list_enrollments(user_id).await?;
        Ok(progress::enrolled_courses(user_id, &courses, &enrollments))
    }

    pub async fn dashboard(&self, user_id: &str) -> Result<DashboardSummary, AppError> {
        let courses = self.catalog.courses().await;
        let enrollments = self.source.list_enrollments(user_id).await?;

        let summary = match self.source.list_activity(user_id).await? {
            Some(activity) => progress::aggregate_with_activity(
                &enrollments,
                &courses,
                &activity,
                Utc::now().date_naive(),
            ),
            None => progress::aggregate(&enrollments, &courses),
        };
        Ok(summary)
    }

    pub async fn recommendations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Course>, AppError> {
        let courses = self.catalog.courses().await;
        let enrollments = self.source.list_enrollments(user_id).await?;
        Ok(progress::recommendations(user_id, &courses, &enrollments, limit))
    }
}
