use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::model::WeatherRecord;

use super::{LookupError, WeatherProvider};

const DEFAULT_BASE_URL: &str = "http://api.weatherstack.com";

/// Weatherstack current-weather client (`location.name`/`current.*`
/// schema). Reports wind in km/h, converted here to m/s.
#[derive(Debug, Clone)]
pub struct WeatherstackProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherstackProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Point the client at a different host. Used by tests with a fixture
    /// server.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WsLocation {
    name: String,
    localtime_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WsCurrent {
    temperature: f64,
    weather_descriptions: Vec<String>,
    humidity: u8,
    wind_speed: f64,
}

#[derive(Debug, Deserialize)]
struct WsError {
    code: i64,
    info: Option<String>,
}

/// Weatherstack reports failures as HTTP 200 with an error object instead
/// of a non-2xx status, so the body shape decides success.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WsEnvelope {
    Failure {
        #[allow(dead_code)]
        success: bool,
        error: WsError,
    },
    Current {
        location: WsLocation,
        current: WsCurrent,
    },
}

fn map_current(location: WsLocation, current: WsCurrent) -> Result<WeatherRecord, LookupError> {
    let description = current
        .weather_descriptions
        .first()
        .cloned()
        .ok_or_else(|| LookupError::Malformed("weather description list was empty".into()))?;

    let observed_at = location
        .localtime_epoch
        .and_then(unix_to_utc)
        .unwrap_or_else(Utc::now);

    Ok(WeatherRecord {
        city: location.name,
        temperature_c: current.temperature,
        description,
        humidity_pct: current.humidity,
        wind_speed_mps: current.wind_speed / 3.6,
        observed_at,
    })
}

#[async_trait]
impl WeatherProvider for WeatherstackProvider {
    async fn current(&self, location: &str) -> Result<WeatherRecord, LookupError> {
        let url = format!("{}/current", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("access_key", self.api_key.as_str()),
                ("query", location),
                ("units", "m"),
            ])
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(LookupError::Transport(format!(
                "status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: WsEnvelope = serde_json::from_str(&body)
            .map_err(|e| LookupError::Malformed(e.to_string()))?;

        match parsed {
            WsEnvelope::Failure { error, .. } => {
                tracing::debug!(
                    location,
                    code = error.code,
                    info = error.info.as_deref().unwrap_or(""),
                    "weatherstack rejected the lookup"
                );
                Err(LookupError::NotFound)
            }
            WsEnvelope::Current { location, current } => map_current(location, current),
        }
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn maps_current_weather_and_converts_wind() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .and(query_param("query", "Kyiv"))
            .and(query_param("units", "m"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "location": { "name": "Kyiv", "localtime_epoch": 1754388000 },
                "current": {
                    "temperature": 21.0,
                    "weather_descriptions": ["Partly cloudy"],
                    "humidity": 55,
                    "wind_speed": 18.0
                }
            })))
            .mount(&server)
            .await;

        let provider = WeatherstackProvider::with_base_url("KEY".into(), server.uri());
        let record = provider.current("Kyiv").await.unwrap();

        assert_eq!(record.city, "Kyiv");
        assert_eq!(record.temperature_c, 21.0);
        assert_eq!(record.description, "Partly cloudy");
        assert_eq!(record.humidity_pct, 55);
        assert_eq!(record.wind_speed_mps, 5.0);
    }

    #[tokio::test]
    async fn error_body_maps_to_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": {
                    "code": 615,
                    "type": "request_failed",
                    "info": "Your API request failed. Please try again or contact support."
                }
            })))
            .mount(&server)
            .await;

        let provider = WeatherstackProvider::with_base_url("KEY".into(), server.uri());
        let err = provider.current("Nowheresville").await.unwrap_err();

        assert!(matches!(err, LookupError::NotFound));
    }

    #[tokio::test]
    async fn unexpected_body_maps_to_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "location": { "name": "Kyiv" }
            })))
            .mount(&server)
            .await;

        let provider = WeatherstackProvider::with_base_url("KEY".into(), server.uri());
        let err = provider.current("Kyiv").await.unwrap_err();

        assert!(matches!(err, LookupError::Malformed(_)));
    }
}
