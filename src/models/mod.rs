pub mod course;
pub mod criteria;
pub mod enrollment;

pub use course::{Course, InstructorRef, Lesson, Level};
pub use criteria::{FilterCriteria, LevelFilter, SortKey};
pub use enrollment::{Enrollment, LessonCompleted, NewEnrollmentRequest};
