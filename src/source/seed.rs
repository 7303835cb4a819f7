use crate::error::AppError;
use crate::models::Course;

const DEMO_COURSES: &str = include_str!("../../seed/courses.json");

/// Bundled mock catalog used by the memory source and for seeding SQLite.
pub fn demo_courses() -> Result<Vec<Course>, AppError> {
    let courses: Vec<Course> = serde_json::from_str(DEMO_COURSES)
        .map_err(|e| AppError::InvalidInput(format!("failed to parse demo catalog: {}", e)))?;
    for course in &courses {
        course.validate()?;
    }
    Ok(courses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_catalog_parses() {
        let courses = demo_courses().expect("demo catalog should be valid");
        assert_eq!(courses.len(), 6);
        assert!(courses.iter().all(|c| !c.lessons.is_empty()));
        assert!(courses.iter().any(|c| c.instructor.is_none()));
    }
}
