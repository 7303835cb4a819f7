use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            other => Err(AppError::InvalidInput(format!("unknown level: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructorRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub level: Level,
    pub price: f64,
    /// Percentage off the list price.
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub students: u32,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub instructor: Option<InstructorRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Discount percentage clamped to 0..=100; absent means no discount.
    pub fn discount_percent(&self) -> f64 {
        match self.discount {
            Some(d) if d.is_finite() => d.clamp(0.0, 100.0),
            _ => 0.0,
        }
    }

    /// Price the student actually pays.
    pub fn effective_price(&self) -> f64 {
        let price = if self.price.is_finite() { self.price.max(0.0) } else { 0.0 };
        price * (1.0 - self.discount_percent() / 100.0)
    }

    pub fn lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == lesson_id)
    }

    pub fn total_minutes(&self) -> u64 {
        self.lessons.iter().map(|l| u64::from(l.duration_minutes)).sum()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.id.trim().is_empty() {
            return Err(AppError::InvalidInput("course id is empty".to_string()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppError::InvalidInput(format!(
                "course {}: price must be >= 0, got {}",
                self.id, self.price
            )));
        }
        if !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(AppError::InvalidInput(format!(
                "course {}: rating must be within 0..=5, got {}",
                self.id, self.rating
            )));
        }
        if let Some(d) = self.discount {
            if !(0.0..=100.0).contains(&d) {
                return Err(AppError::InvalidInput(format!(
                    "course {}: discount must be within 0..=100, got {}",
                    self.id, d
                )));
            }
        }
        let mut seen = HashSet::new();
        for lesson in &self.lessons {
            if !seen.insert(lesson.id.as_str()) {
                return Err(AppError::InvalidInput(format!(
                    "course {}: duplicate lesson id {}",
                    self.id, lesson.id
                )));
            }
        }
        Ok(())
    }

    /// Clamps out-of-range numbers and drops repeated lesson ids (first wins).
    pub fn sanitized(mut self) -> Self {
        if !self.price.is_finite() || self.price < 0.0 {
            self.price = 0.0;
        }
        self.rating = if self.rating.is_finite() {
            self.rating.clamp(0.0, MAX_RATING)
        } else {
            0.0
        };
        let discount = self.discount_percent();
        self.discount = self.discount.map(|_| discount);

        let mut seen = HashSet::new();
        self.lessons.retain(|l| seen.insert(l.id.clone()));
        self
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use super::*;

    pub fn course(id: &str, category: &str, price: f64, students: u32, rating: f64) -> Course {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Course {
            id: id.to_string(),
            title: format!("Course {}", id),
            description: String::new(),
            category: category.to_string(),
            level: Level::Beginner,
            price,
            discount: None,
            duration: "4 weeks".to_string(),
            rating,
            students,
            lessons: Vec::new(),
            instructor: None,
            created_at: created,
            updated_at: created,
        }
    }

    pub fn with_lessons(mut course: Course, n: usize) -> Course {
        course.lessons = (1..=n)
            .map(|i| Lesson {
                id: format!("l{}", i),
                title: format!("Lesson {}", i),
                duration_minutes: 30,
                video_url: None,
            })
            .collect();
        course
    }
}
