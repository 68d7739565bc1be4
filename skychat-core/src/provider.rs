use crate::{
    Config, WeatherRecord,
    provider::{openweather::OpenWeatherProvider, weatherstack::WeatherstackProvider},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod openweather;
pub mod weatherstack;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    Weatherstack,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::Weatherstack => "weatherstack",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::Weatherstack]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherstack" => Ok(ProviderId::Weatherstack),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherstack."
            )),
        }
    }
}

/// How a single lookup can fail. Each kind is rendered as its own
/// user-facing sentence by the pipeline; none of them crosses a component
/// boundary as a raw error.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("location did not resolve to any weather data")]
    NotFound,
    #[error("weather endpoint unreachable: {0}")]
    Transport(String),
    #[error("weather endpoint returned an unexpected body: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch current weather for one location string. Never retries.
    async fn current(&self, location: &str) -> Result<WeatherRecord, LookupError>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `skychat configure {id}` and enter your API key,\n\
                 or set the WEATHER_API_KEY environment variable."
        )
    })?;

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenWeather => Box::new(OpenWeatherProvider::new(api_key)),
        ProviderId::Weatherstack => Box::new(WeatherstackProvider::new(api_key)),
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}
