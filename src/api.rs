//! Directory and weather API clients

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::state::{City, PAGE_SIZE, UnitPreference, WeatherSnapshot};

pub const DEFAULT_DIRECTORY_URL: &str = "https://public.opendatasoft.com/api/explore/v2.1/catalog/datasets/geonames-all-cities-with-a-population-1000/records";
pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Directory results are always sorted by name.
const ORDER_BY: &str = "name ASC";

// ============================================================================
// Errors
// ============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("missing weather API key")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upstream returned {0}")]
    Status(StatusCode),
    #[error("unexpected response: {0}")]
    Parse(String),
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status(status));
    }
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
}

// ============================================================================
// Client seams
// ============================================================================

/// Source of paginated city records
#[async_trait]
pub trait CityDirectory: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<City>, ApiError>;
}

/// Source of current weather for a named city
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current_weather(
        &self,
        city: &str,
        unit: UnitPreference,
    ) -> Result<WeatherSnapshot, ApiError>;
}

// ============================================================================
// Directory API
// ============================================================================

/// One page of the city directory
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub query: String,
    pub limit: u32,
    pub offset: u32,
}

impl PageRequest {
    /// Request for page number `cursor` of `query`
    pub fn new(query: String, cursor: u32) -> Self {
        Self {
            query,
            limit: PAGE_SIZE,
            offset: cursor * PAGE_SIZE,
        }
    }

    /// Substring filter over `name`. `None` for a blank query so the filter
    /// is left out of the request entirely.
    pub fn where_clause(&self) -> Option<String> {
        let query = self.query.trim();
        if query.is_empty() {
            return None;
        }
        let escaped = query.replace('\\', "\\\\").replace('"', "\\\"");
        Some(format!("search(name, \"{escaped}\")"))
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];
        if let Some(filter) = self.where_clause() {
            params.push(("where", filter));
        }
        params.push(("order_by", ORDER_BY.to_string()));
        params
    }
}

#[derive(Debug, Deserialize)]
struct DirectoryResponse {
    results: Vec<DirectoryRecord>,
}

#[derive(Debug, Deserialize)]
struct DirectoryRecord {
    name: String,
    cou_name_en: Option<String>,
}

impl From<DirectoryRecord> for City {
    fn from(record: DirectoryRecord) -> Self {
        City {
            name: record.name,
            country: record.cou_name_en.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DirectoryClient {
    http: Client,
    url: String,
}

impl DirectoryClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
        }
    }
}

impl Default for DirectoryClient {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTORY_URL)
    }
}

#[async_trait]
impl CityDirectory for DirectoryClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<City>, ApiError> {
        tracing::debug!(
            offset = request.offset,
            limit = request.limit,
            filtered = request.where_clause().is_some(),
            "requesting city page"
        );
        let response = self
            .http
            .get(&self.url)
            .query(&request.query_params())
            .send()
            .await?;
        let data: DirectoryResponse = read_json(response).await?;
        Ok(data.results.into_iter().map(City::from).collect())
    }
}

// ============================================================================
// Weather API
// ============================================================================

/// Where the weather API key comes from. Resolved on every request and never
/// stored in state or logged.
#[derive(Clone, Debug)]
pub enum ApiKey {
    /// Read from this environment variable at request time
    Env(String),
    Fixed(String),
}

impl ApiKey {
    pub fn resolve(&self) -> Result<String, ApiError> {
        let key = match self {
            ApiKey::Env(var) => std::env::var(var).unwrap_or_default(),
            ApiKey::Fixed(key) => key.clone(),
        };
        if key.trim().is_empty() {
            return Err(ApiError::MissingApiKey);
        }
        Ok(key)
    }
}

impl Default for ApiKey {
    fn default() -> Self {
        ApiKey::Env(API_KEY_ENV.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    name: String,
    main: MainReadings,
    weather: Vec<Conditions>,
    coord: Coordinates,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Conditions {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct Coordinates {
    lat: f64,
    lon: f64,
}

impl TryFrom<WeatherResponse> for WeatherSnapshot {
    type Error = ApiError;

    fn try_from(data: WeatherResponse) -> Result<Self, Self::Error> {
        let conditions = data
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Parse("empty weather list".to_string()))?;
        Ok(WeatherSnapshot {
            city_name: data.name,
            temperature: data.main.temp,
            description: conditions.description,
            icon_code: conditions.icon,
            lat: data.coord.lat,
            lon: data.coord.lon,
        })
    }
}

#[derive(Clone, Debug)]
pub struct WeatherClient {
    http: Client,
    url: String,
    key: ApiKey,
}

impl WeatherClient {
    pub fn new(url: impl Into<String>, key: ApiKey) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
            key,
        }
    }
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new(DEFAULT_WEATHER_URL, ApiKey::default())
    }
}

#[async_trait]
impl WeatherSource for WeatherClient {
    async fn current_weather(
        &self,
        city: &str,
        unit: UnitPreference,
    ) -> Result<WeatherSnapshot, ApiError> {
        let key = self.key.resolve()?;
        tracing::debug!(city, units = unit.as_query(), "requesting current weather");
        // The URL carries the key, so keep it out of transport errors.
        let response = self
            .http
            .get(&self.url)
            .query(&[("q", city), ("appid", key.as_str()), ("units", unit.as_query())])
            .send()
            .await
            .map_err(|e| ApiError::Request(e.without_url()))?;
        let data: WeatherResponse = read_json(response)
            .await
            .map_err(|e| match e {
                ApiError::Request(e) => ApiError::Request(e.without_url()),
                other => other,
            })?;
        WeatherSnapshot::try_from(data)
    }
}
