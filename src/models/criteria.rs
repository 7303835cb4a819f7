use serde::{Deserialize, Serialize};

use crate::models::Level;

pub const ALL: &str = "All";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum SortKey {
    #[default]
    Popular,
    Newest,
    PriceLow,
    PriceHigh,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Popular => "popular",
            SortKey::Newest => "newest",
            SortKey::PriceLow => "price-low",
            SortKey::PriceHigh => "price-high",
        }
    }
}

/// Unknown keys fall back to `Popular`.
impl From<&str> for SortKey {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => SortKey::Newest,
            "price-low" => SortKey::PriceLow,
            "price-high" => SortKey::PriceHigh,
            _ => SortKey::Popular,
        }
    }
}

impl From<String> for SortKey {
    fn from(s: String) -> Self {
        SortKey::from(s.as_str())
    }
}

/// Level selection. A value that names no known level is kept as `Unknown`
/// and matches no course.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LevelFilter {
    #[default]
    All,
    Only(Level),
    Unknown(String),
}

impl LevelFilter {
    pub fn matches(&self, level: Level) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Only(wanted) => *wanted == level,
            LevelFilter::Unknown(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterCriteria {
    /// `None` means "All".
    pub category: Option<String>,
    pub level: LevelFilter,
    pub search: String,
    pub sort: SortKey,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl FilterCriteria {
    /// Builds criteria from raw UI/query values. "All" and empty values
    /// select everything.
    pub fn from_raw(
        category: Option<&str>,
        level: Option<&str>,
        search: Option<&str>,
        sort: Option<&str>,
    ) -> Self {
        let level = match selection(level) {
            None => LevelFilter::All,
            Some(raw) => match raw.parse::<Level>() {
                Ok(level) => LevelFilter::Only(level),
                Err(e) => {
                    tracing::debug!("level filter matches nothing: {}", e);
                    LevelFilter::Unknown(raw.to_string())
                }
            },
        };

        Self {
            category: selection(category).map(str::to_string),
            level,
            search: search.unwrap_or_default().to_string(),
            sort: sort.map(SortKey::from).unwrap_or_default(),
            min_price: None,
            max_price: None,
        }
    }

    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min.filter(|v| v.is_finite());
        self.max_price = max.filter(|v| v.is_finite());
        self
    }
}

fn selection(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ALL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_fallback() {
        assert_eq!(SortKey::from("price-high"), SortKey::PriceHigh);
        assert_eq!(SortKey::from("NEWEST"), SortKey::Newest);
        assert_eq!(SortKey::from("alphabetical"), SortKey::Popular);
        assert_eq!(SortKey::from(""), SortKey::Popular);
    }

    #[test]
    fn test_sort_key_serde() {
        let key: SortKey = serde_json::from_str("\"price-low\"").unwrap();
        assert_eq!(key, SortKey::PriceLow);
        let key: SortKey = serde_json::from_str("\"bogus\"").unwrap();
        assert_eq!(key, SortKey::Popular);
        assert_eq!(serde_json::to_string(&SortKey::PriceHigh).unwrap(), "\"price-high\"");
    }

    #[test]
    fn test_from_raw_all_means_no_filter() {
        let c = FilterCriteria::from_raw(Some("All"), Some("all"), None, None);
        assert_eq!(c, FilterCriteria::default());

        let c = FilterCriteria::from_raw(Some("Design"), Some("Advanced"), Some("ux"), Some("newest"));
        assert_eq!(c.category.as_deref(), Some("Design"));
        assert_eq!(c.level, LevelFilter::Only(Level::Advanced));
        assert_eq!(c.search, "ux");
        assert_eq!(c.sort, SortKey::Newest);
    }

    #[test]
    fn test_unknown_level_matches_nothing() {
        let c = FilterCriteria::from_raw(None, Some("Expert"), None, None);
        assert_eq!(c.level, LevelFilter::Unknown("Expert".to_string()));
        assert!(!c.level.matches(Level::Beginner));
        assert!(!c.level.matches(Level::Advanced));
        assert!(LevelFilter::All.matches(Level::Advanced));
    }
}
