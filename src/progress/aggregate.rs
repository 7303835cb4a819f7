use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::{Course, Enrollment, LessonCompleted};
use crate::progress::resolver::enrollment_progress;

/// A dashboard figure that may not be derivable from the data at hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Metric<T> {
    Available(T),
    Unavailable,
}

impl<T> Metric<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Metric::Available(v) => Some(v),
            Metric::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub enrolled_courses: usize,
    pub completed_lessons: usize,
    pub certificates: usize,
    pub total_hours: Metric<f64>,
    pub streak_days: Metric<u32>,
}

/// Rollup without an activity log: hours and streak are reported as unavailable.
pub fn aggregate(enrollments: &[Enrollment], courses: &[Course]) -> DashboardSummary {
    let by_id: HashMap<&str, &Course> = courses.iter().map(|c| (c.id.as_str(), c)).collect();

    let completed_lessons = enrollments
        .iter()
        .map(|e| e.completed_lessons.values().filter(|done| **done).count())
        .sum();

    let certificates = enrollments
        .iter()
        .filter(|e| {
            by_id
                .get(e.course_id.as_str())
                .is_some_and(|course| enrollment_progress(course, e) == 100)
        })
        .count();

    DashboardSummary {
        enrolled_courses: enrollments.len(),
        completed_lessons,
        certificates,
        total_hours: Metric::Unavailable,
        streak_days: Metric::Unavailable,
    }
}

pub fn aggregate_with_activity(
    enrollments: &[Enrollment],
    courses: &[Course],
    activity: &[LessonCompleted],
    today: NaiveDate,
) -> DashboardSummary {
    DashboardSummary {
        total_hours: Metric::Available(total_hours(courses, activity)),
        streak_days: Metric::Available(streak_days(activity, today)),
        ..aggregate(enrollments, courses)
    }
}

/// Hours of lesson content completed, one decimal place. Each lesson counts once.
pub fn total_hours(courses: &[Course], activity: &[LessonCompleted]) -> f64 {
    let by_id: HashMap<&str, &Course> = courses.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut seen = HashSet::new();

    let minutes: u64 = activity
        .iter()
        .filter(|ev| seen.insert((ev.course_id.as_str(), ev.lesson_id.as_str())))
        .filter_map(|ev| {
            let course = by_id.get(ev.course_id.as_str())?;
            course.lesson(&ev.lesson_id).map(|l| u64::from(l.duration_minutes))
        })
        .sum();

    (minutes as f64 / 60.0 * 10.0).round() / 10.0
}

/// Consecutive UTC days with at least one completion, ending today or yesterday.
pub fn streak_days(activity: &[LessonCompleted], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = activity
        .iter()
        .map(|ev| ev.completed_at.date_naive())
        .filter(|d| *d <= today)
        .collect();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}
