use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use tracing::info;

use crate::error::AppError;
use crate::models::{Course, Enrollment, InstructorRef, Lesson, LessonCompleted, Level};
use crate::source::CourseSource;

#[derive(Debug, FromRow)]
struct CourseRow {
    id: String,
    title: String,
    description: String,
    category: String,
    level: String,
    price: f64,
    discount: Option<f64>,
    duration: String,
    rating: f64,
    students: i64,
    instructor_id: Option<String>,
    instructor_name: Option<String>,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, FromRow)]
struct LessonRow {
    course_id: String,
    id: String,
    title: String,
    duration_minutes: i64,
    video_url: Option<String>,
}

#[derive(Debug, FromRow)]
struct EnrollmentRow {
    id: String,
    user_id: String,
    course_id: String,
    enrolled_at: String,
}

#[derive(Debug, FromRow)]
struct CompletionRow {
    user_id: String,
    course_id: String,
    lesson_id: String,
    completed_at: String,
}

impl CourseRow {
    fn into_course(self, lessons: Vec<Lesson>) -> Result<Course, AppError> {
        let instructor = match (self.instructor_id, self.instructor_name) {
            (Some(id), Some(name)) => Some(InstructorRef { id, name }),
            _ => None,
        };

        Ok(Course {
            level: Level::from_str(&self.level)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            price: self.price,
            discount: self.discount,
            duration: self.duration,
            rating: self.rating,
            students: u32::try_from(self.students).unwrap_or(0),
            lessons,
            instructor,
        })
    }
}

impl From<LessonRow> for Lesson {
    fn from(row: LessonRow) -> Self {
        Lesson {
            id: row.id,
            title: row.title,
            duration_minutes: u32::try_from(row.duration_minutes).unwrap_or(0),
            video_url: row.video_url,
        }
    }
}

impl CompletionRow {
    fn into_event(self) -> Result<LessonCompleted, AppError> {
        Ok(LessonCompleted {
            completed_at: parse_timestamp(&self.completed_at)?,
            user_id: self.user_id,
            course_id: self.course_id,
            lesson_id: self.lesson_id,
        })
    }
}

fn parse_timestamp(ts: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::InvalidInput(format!("bad timestamp {:?}: {}", ts, e)))
}

/// Courses, enrollments and lesson completions persisted in SQLite.
#[derive(Clone)]
pub struct SqliteSource {
    db: SqlitePool,
}

impl SqliteSource {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Opens (creating if needed) the database at `url` and runs migrations.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Single-connection in-memory database, mainly for tests.
    pub async fn in_memory() -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    pub async fn count_courses(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    /// Inserts or replaces a course together with its lessons.
    pub async fn upsert_course(&self, course: &Course) -> Result<(), AppError> {
        course.validate()?;

        let mut tx = self.db.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO courses
                (id, title, description, category, level, price, discount, duration,
                rating, students, instructor_id, instructor_name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                category = excluded.category,
                level = excluded.level,
                price = excluded.price,
                discount = excluded.discount,
                duration = excluded.duration,
                rating = excluded.rating,
                students = excluded.students,
                instructor_id = excluded.instructor_id,
                instructor_name = excluded.instructor_name,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&course.id)
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.category)
        .bind(course.level.as_str())
        .bind(course.price)
        .bind(course.discount)
        .bind(&course.duration)
        .bind(course.rating)
        .bind(i64::from(course.students))
        .bind(course.instructor.as_ref().map(|i| i.id.clone()))
        .bind(course.instructor.as_ref().map(|i| i.name.clone()))
        .bind(course.created_at.to_rfc3339())
        .bind(course.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM lessons WHERE course_id = ?")
            .bind(&course.id)
            .execute(&mut *tx)
            .await?;

        for (position, lesson) in course.lessons.iter().enumerate() {
            sqlx::query(
                "INSERT INTO lessons (course_id, id, position, title, duration_minutes, video_url) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&course.id)
            .bind(&lesson.id)
            .bind(position as i64)
            .bind(&lesson.title)
            .bind(i64::from(lesson.duration_minutes))
            .bind(&lesson.video_url)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Loads `courses` only when the catalog table is still empty.
    pub async fn seed_if_empty(&self, courses: &[Course]) -> Result<usize, AppError> {
        if self.count_courses().await? > 0 {
            return Ok(0);
        }
        for course in courses {
            self.upsert_course(course).await?;
        }
        info!("seeded {} courses", courses.len());
        Ok(courses.len())
    }

    async fn course_exists(&self, course_id: &str) -> Result<bool, AppError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM courses WHERE id = ?")
            .bind(course_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(found.is_some())
    }

    async fn completions_for(&self, user_id: &str) -> Result<Vec<CompletionRow>, AppError> {
        let rows = sqlx::query_as::<_, CompletionRow>(
            "SELECT user_id, course_id, lesson_id, completed_at FROM lesson_completions WHERE user_id = ? ORDER BY completed_at",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_enrollment(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<Enrollment>, AppError> {
        let enrollment = self
            .list_enrollments(user_id)
            .await?
            .into_iter()
            .find(|e| e.course_id == course_id);
        Ok(enrollment)
    }
}

#[async_trait]
impl CourseSource for SqliteSource {
    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let rows = sqlx::query_as::<_, CourseRow>(
            "SELECT id, title, description, category, level, price, discount, duration, rating, students, instructor_id, instructor_name, created_at, updated_at FROM courses ORDER BY rowid",
        )
        .fetch_all(&self.db)
        .await?;

        let lesson_rows = sqlx::query_as::<_, LessonRow>(
            "SELECT course_id, id, title, duration_minutes, video_url FROM lessons ORDER BY course_id, position",
        )
        .fetch_all(&self.db)
        .await?;

        let mut lessons: HashMap<String, Vec<Lesson>> = HashMap::new();
        for row in lesson_rows {
            lessons.entry(row.course_id.clone()).or_default().push(row.into());
        }

        rows.into_iter()
            .map(|row| {
                let course_lessons = lessons.remove(&row.id).unwrap_or_default();
                row.into_course(course_lessons)
            })
            .collect()
    }

    async fn list_enrollments(&self, user_id: &str) -> Result<Vec<Enrollment>, AppError> {
        let rows = sqlx::query_as::<_, EnrollmentRow>(
            "SELECT id, user_id, course_id, enrolled_at FROM enrollments WHERE user_id = ? ORDER BY enrolled_at",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let mut completed: HashMap<String, BTreeMap<String, bool>> = HashMap::new();
        for row in self.completions_for(user_id).await? {
            completed
                .entry(row.course_id)
                .or_default()
                .insert(row.lesson_id, true);
        }

        rows.into_iter()
            .map(|row| {
                Ok(Enrollment {
                    enrolled_at: parse_timestamp(&row.enrolled_at)?,
                    completed_lessons: completed.remove(&row.course_id).unwrap_or_default(),
                    id: row.id,
                    user_id: row.user_id,
                    course_id: row.course_id,
                })
            })
            .collect()
    }

    async fn enroll(&self, user_id: &str, course_id: &str) -> Result<Enrollment, AppError> {
        if !self.course_exists(course_id).await? {
            return Err(AppError::NotFound);
        }

        let fresh = Enrollment::new(user_id, course_id);
        sqlx::query(
            r#"
            INSERT INTO enrollments (id, user_id, course_id, enrolled_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, course_id) DO NOTHING
            "#,
        )
        .bind(&fresh.id)
        .bind(&fresh.user_id)
        .bind(&fresh.course_id)
        .bind(fresh.enrolled_at.to_rfc3339())
        .execute(&self.db)
        .await?;

        self.find_enrollment(user_id, course_id)
            .await?
            .ok_or(AppError::InternalServerError)
    }

    async fn record_lesson_complete(&self, event: &LessonCompleted) -> Result<(), AppError> {
        if self
            .find_enrollment(&event.user_id, &event.course_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound);
        }

        let lesson: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM lessons WHERE course_id = ? AND id = ?")
                .bind(&event.course_id)
                .bind(&event.lesson_id)
                .fetch_optional(&self.db)
                .await?;
        if lesson.is_none() {
            return Err(AppError::NotFound);
        }

        sqlx::query(
            r#"
            INSERT INTO lesson_completions (user_id, course_id, lesson_id, completed_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, course_id, lesson_id) DO NOTHING
            "#,
        )
        .bind(&event.user_id)
        .bind(&event.course_id)
        .bind(&event.lesson_id)
        .bind(event.completed_at.to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn list_activity(&self, user_id: &str) -> Result<Option<Vec<LessonCompleted>>, AppError> {
        let events = self
            .completions_for(user_id)
            .await?
            .into_iter()
            .map(CompletionRow::into_event)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(events))
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("select 1").execute(&self.db).await?;
        Ok(())
    }
}
