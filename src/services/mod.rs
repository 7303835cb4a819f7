pub mod learning;
pub mod refresh;

pub use learning::{CourseEnrollmentView, LearningService, LessonRef};
pub use refresh::CatalogRefresher;
