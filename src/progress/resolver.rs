use serde::Serialize;

use crate::catalog::sort_courses;
use crate::models::{Course, Enrollment, Lesson, SortKey};

/// Per-user lifecycle of a course: NotEnrolled -> Enrolled -> InProgress -> Completed.
/// Driven by lesson counts, not by the rounded percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EnrollmentStatus {
    NotEnrolled,
    Enrolled,
    InProgress,
    Completed,
}

impl EnrollmentStatus {
    pub fn is_enrolled(&self) -> bool {
        !matches!(self, EnrollmentStatus::NotEnrolled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NextLesson<'a> {
    Lesson(&'a Lesson),
    Completed,
    /// The course has no lessons at all.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonOutcome {
    Recorded {
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    },
    AlreadyComplete,
    CourseCompleted,
    UnknownLesson,
}

pub fn find_enrollment<'a>(
    user_id: &str,
    course_id: &str,
    enrollments: &'a [Enrollment],
) -> Option<&'a Enrollment> {
    enrollments.iter().find(|e| e.matches(user_id, course_id))
}

pub fn is_enrolled(user_id: &str, course_id: &str, enrollments: &[Enrollment]) -> bool {
    find_enrollment(user_id, course_id, enrollments).is_some()
}

/// Number of the course's lessons marked complete. Flags for lessons that
/// are not part of the course are ignored.
pub fn completed_count(course: &Course, enrollment: &Enrollment) -> usize {
    course
        .lessons
        .iter()
        .filter(|l| enrollment.is_lesson_complete(&l.id))
        .count()
}

pub fn progress(user_id: &str, course: &Course, enrollments: &[Enrollment]) -> u8 {
    find_enrollment(user_id, &course.id, enrollments)
        .map_or(0, |enrollment| enrollment_progress(course, enrollment))
}

/// `round(100 * done / total)`, halves rounding up; 0 for a course without lessons.
pub fn enrollment_progress(course: &Course, enrollment: &Enrollment) -> u8 {
    let total = course.lessons.len();
    if total == 0 {
        return 0;
    }
    let done = completed_count(course, enrollment);
    ((200 * done + total) / (2 * total)).min(100) as u8
}

/// Like [`progress`] but looks the course up first; unknown courses read 0%.
pub fn progress_by_id(
    user_id: &str,
    course_id: &str,
    courses: &[Course],
    enrollments: &[Enrollment],
) -> u8 {
    courses
        .iter()
        .find(|c| c.id == course_id)
        .map_or(0, |course| progress(user_id, course, enrollments))
}

pub fn status(user_id: &str, course: &Course, enrollments: &[Enrollment]) -> EnrollmentStatus {
    match find_enrollment(user_id, &course.id, enrollments) {
        Some(enrollment) => enrollment_status(course, enrollment),
        None => EnrollmentStatus::NotEnrolled,
    }
}

pub fn enrollment_status(course: &Course, enrollment: &Enrollment) -> EnrollmentStatus {
    let total = course.lessons.len();
    let done = completed_count(course, enrollment);

    if total == 0 || done == 0 {
        return EnrollmentStatus::Enrolled;
    }
    if done >= total {
        return EnrollmentStatus::Completed;
    }
    EnrollmentStatus::InProgress
}

pub fn next_lesson<'a>(
    user_id: &str,
    course: &'a Course,
    enrollments: &[Enrollment],
) -> NextLesson<'a> {
    if course.lessons.is_empty() {
        return NextLesson::Empty;
    }

    let enrollment = find_enrollment(user_id, &course.id, enrollments);
    course
        .lessons
        .iter()
        .find(|l| !enrollment.is_some_and(|e| e.is_lesson_complete(&l.id)))
        .map_or(NextLesson::Completed, NextLesson::Lesson)
}

impl Enrollment {
    /// Marks `lesson_id` complete. Repeated events and events after the
    /// course is completed leave the enrollment untouched.
    pub fn complete_lesson(&mut self, course: &Course, lesson_id: &str) -> LessonOutcome {
        if course.lesson(lesson_id).is_none() {
            return LessonOutcome::UnknownLesson;
        }
        let from = enrollment_status(course, self);
        if from == EnrollmentStatus::Completed {
            return LessonOutcome::CourseCompleted;
        }
        if self.is_lesson_complete(lesson_id) {
            return LessonOutcome::AlreadyComplete;
        }

        self.completed_lessons.insert(lesson_id.to_string(), true);
        LessonOutcome::Recorded {
            from,
            to: enrollment_status(course, self),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrolledCourse {
    pub course: Course,
    pub progress: u8,
    pub status: EnrollmentStatus,
    pub completed_lessons: usize,
    pub total_lessons: usize,
}

/// The user's courses in catalog order.
pub fn enrolled_courses(
    user_id: &str,
    courses: &[Course],
    enrollments: &[Enrollment],
) -> Vec<EnrolledCourse> {
    courses
        .iter()
        .filter_map(|course| {
            let enrollment = find_enrollment(user_id, &course.id, enrollments)?;
            let status = enrollment_status(course, enrollment);
            Some(EnrolledCourse {
                course: course.clone(),
                progress: enrollment_progress(course, enrollment),
                status,
                completed_lessons: completed_count(course, enrollment),
                total_lessons: course.lessons.len(),
            })
        })
        .collect()
}

/// Most popular courses the user has not joined yet.
pub fn recommendations(
    user_id: &str,
    courses: &[Course],
    enrollments: &[Enrollment],
    limit: usize,
) -> Vec<Course> {
    let mut candidates: Vec<Course> = courses
        .iter()
        .filter(|c| !is_enrolled(user_id, &c.id, enrollments))
        .cloned()
        .collect();
    sort_courses(&mut candidates, SortKey::Popular);
    candidates.truncate(limit);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::course::fixtures::{course, with_lessons};

    fn enrolled(user: &str, course: &Course, done: &[&str]) -> Enrollment {
        let mut e = Enrollment::new(user, &course.id);
        for id in done {
            e.completed_lessons.insert(id.to_string(), true);
        }
        e
    }

    #[test]
    fn test_not_enrolled_reads_zero() {
        let c = with_lessons(course("5", "Design", 10.0, 0, 0.0), 3);
        assert!(!is_enrolled("u1", "5", &[]));
        assert_eq!(progress("u1", &c, &[]), 0);
        assert_eq!(status("u1", &c, &[]), EnrollmentStatus::NotEnrolled);
        assert_eq!(progress_by_id("u1", "missing", &[c], &[]), 0);
    }

    #[test]
    fn test_enrollment_is_exact_pair() {
        let c = course("5", "Design", 10.0, 0, 0.0);
        let e = vec![enrolled("u1", &c, &[])];
        assert!(is_enrolled("u1", "5", &e));
        assert!(!is_enrolled("u2", "5", &e));
        assert!(!is_enrolled("u1", "50", &e));
    }

    #[test]
    fn test_three_of_four_then_complete() {
        let c = with_lessons(course("c", "Design", 10.0, 0, 0.0), 4);
        let mut e = vec![enrolled("u1", &c, &["l1", "l2", "l3"])];
        assert_eq!(progress("u1", &c, &e), 75);
        assert_eq!(status("u1", &c, &e), EnrollmentStatus::InProgress);

        let outcome = e[0].complete_lesson(&c, "l4");
        assert_eq!(
            outcome,
            LessonOutcome::Recorded {
                from: EnrollmentStatus::InProgress,
                to: EnrollmentStatus::Completed,
            }
        );
        assert_eq!(progress("u1", &c, &e), 100);
        assert_eq!(next_lesson("u1", &c, &e), NextLesson::Completed);

        assert_eq!(e[0].complete_lesson(&c, "l4"), LessonOutcome::CourseCompleted);
        assert_eq!(progress("u1", &c, &e), 100);
    }

    #[test]
    fn test_zero_lessons() {
        let c = course("c", "Design", 10.0, 0, 0.0);
        let e = vec![enrolled("u1", &c, &[])];
        assert_eq!(progress("u1", &c, &e), 0);
        assert_eq!(status("u1", &c, &e), EnrollmentStatus::Enrolled);
        assert_eq!(next_lesson("u1", &c, &e), NextLesson::Empty);
    }

    #[test]
    fn test_progress_monotonic_and_bounded() {
        let c = with_lessons(course("c", "Design", 10.0, 0, 0.0), 7);
        let mut e = vec![enrolled("u1", &c, &[])];
        let mut last = progress("u1", &c, &e);
        assert_eq!(last, 0);

        for lesson in c.lessons.clone() {
            e[0].complete_lesson(&c, &lesson.id);
            let now = progress("u1", &c, &e);
            assert!(now >= last);
            assert!(now <= 100);
            last = now;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn test_progress_rounds_independently_of_status() {
        let c = with_lessons(course("c", "Design", 10.0, 0, 0.0), 200);
        let done: Vec<String> = (1..=199).map(|i| format!("l{}", i)).collect();
        let refs: Vec<&str> = done.iter().map(String::as_str).collect();
        let e = vec![enrolled("u1", &c, &refs)];
        assert_eq!(progress("u1", &c, &e), 100);
        assert_eq!(status("u1", &c, &e), EnrollmentStatus::InProgress);
        assert!(matches!(next_lesson("u1", &c, &e), NextLesson::Lesson(l) if l.id == "l200"));

        let c = with_lessons(course("c", "Design", 10.0, 0, 0.0), 300);
        let e = vec![enrolled("u1", &c, &["l1"])];
        assert_eq!(progress("u1", &c, &e), 0);
        assert_eq!(status("u1", &c, &e), EnrollmentStatus::InProgress);

        let c = with_lessons(course("c", "Design", 10.0, 0, 0.0), 3);
        let e = vec![enrolled("u1", &c, &["l1"])];
        assert_eq!(progress("u1", &c, &e), 33);
        let e = vec![enrolled("u1", &c, &["l1", "l2"])];
        assert_eq!(progress("u1", &c, &e), 67);
    }

    #[test]
    fn test_stray_flags_ignored() {
        let c = with_lessons(course("c", "Design", 10.0, 0, 0.0), 2);
        let mut e = enrolled("u1", &c, &["l1", "ghost"]);
        e.completed_lessons.insert("l2".to_string(), false);
        assert_eq!(progress("u1", &c, &[e]), 50);
    }

    #[test]
    fn test_next_lesson_is_first_incomplete() {
        let c = with_lessons(course("c", "Design", 10.0, 0, 0.0), 3);
        let e = vec![enrolled("u1", &c, &["l1", "l3"])];
        match next_lesson("u1", &c, &e) {
            NextLesson::Lesson(l) => assert_eq!(l.id, "l2"),
            other => panic!("unexpected {:?}", other),
        }
        match next_lesson("someone-else", &c, &e) {
            NextLesson::Lesson(l) => assert_eq!(l.id, "l1"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_complete_lesson_noops() {
        let c = with_lessons(course("c", "Design", 10.0, 0, 0.0), 2);
        let mut e = enrolled("u1", &c, &["l1"]);
        assert_eq!(e.complete_lesson(&c, "l1"), LessonOutcome::AlreadyComplete);
        assert_eq!(e.complete_lesson(&c, "nope"), LessonOutcome::UnknownLesson);
        assert_eq!(e.completed_lessons.len(), 1);
    }

    #[test]
    fn test_unknown_lesson_on_completed_course() {
        let c = with_lessons(course("c", "Design", 10.0, 0, 0.0), 2);
        let mut e = enrolled("u1", &c, &["l1", "l2"]);
        assert_eq!(e.complete_lesson(&c, "nope"), LessonOutcome::UnknownLesson);
        assert_eq!(e.complete_lesson(&c, "l2"), LessonOutcome::CourseCompleted);
    }

    #[test]
    fn test_enrolled_courses_and_recommendations() {
        let a = with_lessons(course("a", "Design", 10.0, 5, 4.0), 2);
        let b = course("b", "Design", 10.0, 50, 4.0);
        let c = course("c", "Design", 10.0, 500, 4.0);
        let courses = vec![a.clone(), b, c];
        let e = vec![enrolled("u1", &a, &["l1"])];

        let mine = enrolled_courses("u1", &courses, &e);
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].progress, 50);
        assert_eq!(mine[0].completed_lessons, 1);
        assert_eq!(mine[0].total_lessons, 2);

        let recs = recommendations("u1", &courses, &e, 5);
        let ids: Vec<&str> = recs.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert_eq!(recommendations("u1", &courses, &e, 1).len(), 1);
    }
}
