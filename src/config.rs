use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::catalog::DEFAULT_PAGE_SIZE;
use crate::error::AppError;
use crate::source::HttpSourceConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Sqlite,
    Http,
    Memory,
}

impl FromStr for SourceKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(SourceKind::Sqlite),
            "http" => Ok(SourceKind::Http),
            "memory" => Ok(SourceKind::Memory),
            other => Err(AppError::Config(format!("unknown COURSE_SOURCE: {}", other))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub source: SourceKind,
    pub http: Option<HttpSourceConfig>,
    /// 0 disables background refresh.
    pub refresh_interval_secs: u64,
    pub page_size: usize,
    pub seed_demo_data: bool,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://catalog.db".to_string());

        let bind_addr = parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?;

        let source = match lookup("COURSE_SOURCE") {
            Some(v) => v.parse()?,
            None => SourceKind::Sqlite,
        };

        let http = match lookup("COURSE_API_URL") {
            Some(url) => {
                let config = HttpSourceConfig::new(url);
                Some(match lookup("COURSE_API_TOKEN") {
                    Some(token) => config.with_token(token),
                    None => config,
                })
            }
            None => None,
        };
        if source == SourceKind::Http && http.is_none() {
            return Err(AppError::Config(
                "COURSE_API_URL is required when COURSE_SOURCE=http".to_string(),
            ));
        }

        let page_size: usize = parse_or(&lookup, "CATALOG_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(AppError::Config("CATALOG_PAGE_SIZE must be > 0".to_string()));
        }

        Ok(Self {
            database_url,
            bind_addr,
            source,
            http,
            refresh_interval_secs: parse_or(&lookup, "CATALOG_REFRESH_SECS", 300)?,
            page_size,
            seed_demo_data: parse_or(&lookup, "SEED_DEMO_DATA", false)?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{} is invalid: {}", key, e))),
        None => Ok(default),
    }
}
