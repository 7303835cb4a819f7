use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::{Course, Enrollment, LessonCompleted, NewEnrollmentRequest};
use crate::source::CourseSource;

#[derive(Clone, Debug)]
pub struct HttpSourceConfig {
    pub base_url: String,
    pub api_token: Option<String>,
}

impl HttpSourceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }
}

/// Thin client for the external course backend's REST API.
pub struct HttpSource {
    client: Client,
    base_url: Url,
    config: HttpSourceConfig,
}

impl HttpSource {
    pub fn new(config: HttpSourceConfig) -> Result<Self, AppError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            AppError::Config(format!("Invalid course API url {}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "Course API url {} cannot carry a path",
                config.base_url
            )));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Appends `segments` to the base path. Each segment is percent-encoded,
    /// so ids containing `/`, `?` or `#` stay a single segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, AppError> {
        let response = self
            .authorized(self.client.get(self.url(segments)))
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound);
    }

    let body = response.text().await.unwrap_or_default();
    if status.is_client_error() {
        return Err(AppError::BadRequest(format!("course API error {}: {}", status, body)));
    }
    Err(AppError::Upstream(format!("course API error {}: {}", status, body)))
}

#[async_trait]
impl CourseSource for HttpSource {
    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let courses: Vec<Course> = self.get_json(&["courses"]).await?;
        debug!("fetched {} courses from {}", courses.len(), self.config.base_url);
        Ok(courses)
    }

    async fn list_enrollments(&self, user_id: &str) -> Result<Vec<Enrollment>, AppError> {
        self.get_json(&["users", user_id, "enrollments"]).await
    }

    async fn enroll(&self, user_id: &str, course_id: &str) -> Result<Enrollment, AppError> {
        let body = NewEnrollmentRequest {
            course_id: course_id.to_string(),
        };
        let response = self
            .authorized(
                self.client
                    .post(self.url(&["users", user_id, "enrollments"]))
                    .json(&body),
            )
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<Enrollment>().await?)
    }

    async fn record_lesson_complete(&self, event: &LessonCompleted) -> Result<(), AppError> {
        let response = self
            .authorized(self.client.post(self.url(&["lesson-completions"])).json(event))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn list_activity(&self, user_id: &str) -> Result<Option<Vec<LessonCompleted>>, AppError> {
        match self.get_json(&["users", user_id, "activity"]).await {
            Ok(events) => Ok(Some(events)),
            Err(AppError::NotFound) => {
                warn!("course API has no activity log for user {}", user_id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn ping(&self) -> Result<(), AppError> {
        let response = self
            .authorized(self.client.get(self.url(&["health"])))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
