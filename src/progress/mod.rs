pub mod aggregate;
pub mod resolver;

pub use aggregate::{DashboardSummary, Metric, aggregate, aggregate_with_activity};
pub use resolver::{
    EnrolledCourse, EnrollmentStatus, LessonOutcome, NextLesson, enrolled_courses,
    enrollment_progress, enrollment_status, find_enrollment, is_enrolled, next_lesson, progress, progress_by_id,
    recommendations, status,
};
