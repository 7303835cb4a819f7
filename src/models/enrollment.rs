use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub enrolled_at: DateTime<Utc>,
    /// lesson id -> completed
    #[serde(default)]
    pub completed_lessons: BTreeMap<String, bool>,
}

impl Enrollment {
    pub fn new(user_id: &str, course_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            enrolled_at: Utc::now(),
            completed_lessons: BTreeMap::new(),
        }
    }

    pub fn matches(&self, user_id: &str, course_id: &str) -> bool {
        self.user_id == user_id && self.course_id == course_id
    }

    pub fn is_lesson_complete(&self, lesson_id: &str) -> bool {
        self.completed_lessons.get(lesson_id).copied().unwrap_or(false)
    }
}

/// Reported by the lesson page when a student finishes a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonCompleted {
    pub user_id: String,
    pub course_id: String,
    pub lesson_id: String,
    #[serde(default = "Utc::now")]
    pub completed_at: DateTime<Utc>,
}

impl LessonCompleted {
    pub fn new(user_id: &str, course_id: &str, lesson_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            lesson_id: lesson_id.to_string(),
            completed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEnrollmentRequest {
    pub course_id: String,
}
