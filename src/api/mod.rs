use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogPage, CatalogQuery};
use crate::error::AppError;
use crate::models::*;
use crate::progress::{DashboardSummary, EnrolledCourse};
use crate::services::CourseEnrollmentView;
use crate::state::AppState;

const DEFAULT_RECOMMENDATIONS: usize = 4;
const MAX_PAGE: usize = 100;

#[derive(Debug, Default, Deserialize)]
struct CatalogQueryParams {
    category: Option<String>,
    level: Option<String>,
    search: Option<String>,
    sort: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    limit: Option<usize>,
    #[serde(default)]
    offset: usize,
}

#[derive(Deserialize)]
struct LimitParams {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct RefreshResponse {
    courses: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/courses", get(list_courses))
        .route("/courses/{course_id}", get(get_course))
        .route("/catalog/refresh", post(refresh_catalog))
        .route("/users/{user_id}/courses", get(my_courses))
        .route("/users/{user_id}/enrollments", post(enroll))
        .route("/users/{user_id}/courses/{course_id}", get(course_view))
        .route(
            "/users/{user_id}/courses/{course_id}/lessons/{lesson_id}/complete",
            post(complete_lesson),
        )
        .route("/users/{user_id}/dashboard", get(dashboard))
        .route("/users/{user_id}/recommendations", get(recommendations))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.source.ping().await?;
    Ok(StatusCode::OK)
}

async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<CatalogQueryParams>,
) -> Result<Json<CatalogPage>, AppError> {
    let criteria = FilterCriteria::from_raw(
        params.category.as_deref(),
        params.level.as_deref(),
        params.search.as_deref(),
        params.sort.as_deref(),
    )
    .with_price_range(params.min_price, params.max_price);

    let limit = params
        .limit
        .map_or(state.page_size, |limit| limit.clamp(1, MAX_PAGE));
    let query = CatalogQuery::new(criteria, limit).starting_at(params.offset);

    Ok(Json(state.catalog.browse(&query).await))
}

async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Course>, AppError> {
    let course = state.catalog.get(&course_id).await.ok_or(AppError::NotFound)?;
    Ok(Json(course))
}

async fn refresh_catalog(State(state): State<AppState>) -> Result<Json<RefreshResponse>, AppError> {
    let courses = state.catalog.refresh(state.source.as_ref()).await?;
    Ok(Json(RefreshResponse { courses }))
}

async fn my_courses(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<EnrolledCourse>>, AppError> {
    Ok(Json(state.learning().my_courses(&user_id).await?))
}

async fn enroll(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<NewEnrollmentRequest>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    let enrollment = state.learning().enroll(&user_id, &req.course_id).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

async fn course_view(
    State(state): State<AppState>,
    Path((user_id, course_id)): Path<(String, String)>,
) -> Result<Json<CourseEnrollmentView>, AppError> {
    Ok(Json(state.learning().course_view(&user_id, &course_id).await?))
}

async fn complete_lesson(
    State(state): State<AppState>,
    Path((user_id, course_id, lesson_id)): Path<(String, String, String)>,
) -> Result<Json<CourseEnrollmentView>, AppError> {
    let event = LessonCompleted::new(&user_id, &course_id, &lesson_id);
    Ok(Json(state.learning().complete_lesson(event).await?))
}

async fn dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(state.learning().dashboard(&user_id).await?))
}

async fn recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<Course>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_RECOMMENDATIONS).min(MAX_PAGE);
    Ok(Json(state.learning().recommendations(&user_id, limit).await?))
}
