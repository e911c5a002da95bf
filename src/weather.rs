//! Forecast lookup, consumed best-effort by the trip service: failures are
//! logged and surface as `None`, never as a request error.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use time::Date;
use tracing::warn;

use crate::config::WeatherConfig;

/// One day's forecast, in the shape the trip-day weather snapshot stores.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub condition: String,
    pub temperature: String,
    pub icon: Option<String>,
    pub humidity: Option<String>,
    pub wind: Option<String>,
    pub precipitation: Option<String>,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn forecast(&self, city: &str, date: Date) -> Option<Forecast>;
}

#[derive(Debug, Deserialize)]
struct GeoEntry {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt_txt: String,
    weather: Vec<ForecastWeather>,
    main: ForecastMain,
    wind: Option<ForecastWind>,
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct ForecastMain {
    temp_min: f64,
    temp_max: f64,
    humidity: i64,
}

#[derive(Debug, Deserialize)]
struct ForecastWind {
    speed: f64,
}

pub struct OpenWeatherClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    geo_url: String,
}

impl OpenWeatherClient {
    pub fn new(http: reqwest::Client, config: &WeatherConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            geo_url: config.geo_url.clone(),
        }
    }

    async fn fetch(&self, city: &str, date: Date) -> anyhow::Result<Option<Forecast>> {
        let geo: Vec<GeoEntry> = self
            .http
            .get(&self.geo_url)
            .query(&[("q", city), ("limit", "1"), ("appid", &self.api_key)])
            .send()
            .await
            .context("geocoding request failed")?
            .json()
            .await
            .context("geocoding response was not valid json")?;
        let Some(place) = geo.first() else {
            return Ok(None);
        };

        let url = format!("{}/forecast", self.base_url);
        let forecast: ForecastResponse = self
            .http
            .get(&url)
            .query(&[
                ("lat", place.lat.to_string()),
                ("lon", place.lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
                ("lang", "zh_cn".to_string()),
            ])
            .send()
            .await
            .context("forecast request failed")?
            .json()
            .await
            .context("forecast response was not valid json")?;

        let wanted = format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            u8::from(date.month()),
            date.day()
        );
        for entry in forecast.list {
            if entry.dt_txt.get(..10) != Some(wanted.as_str()) {
                continue;
            }
            let Some(weather) = entry.weather.first() else {
                continue;
            };
            return Ok(Some(Forecast {
                condition: weather.description.clone(),
                temperature: format!(
                    "{}°-{}°",
                    entry.main.temp_min as i64, entry.main.temp_max as i64
                ),
                icon: Some(weather.icon.clone()),
                humidity: Some(format!("{}%", entry.main.humidity)),
                wind: entry.wind.map(|w| format!("{}m/s", w.speed)),
                precipitation: Some(format!("{}%", (entry.pop.unwrap_or(0.0) * 100.0) as i64)),
            }));
        }
        Ok(None)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn forecast(&self, city: &str, date: Date) -> Option<Forecast> {
        if self.api_key.is_empty() {
            return None;
        }
        match self.fetch(city, date).await {
            Ok(forecast) => forecast,
            Err(e) => {
                warn!(error = %e, city, "weather lookup failed");
                None
            }
        }
    }
}

/// Provider that never has a forecast; used when no API key is configured
/// and in tests that do not exercise the weather path.
pub struct NoopWeatherProvider;

#[async_trait]
impl WeatherProvider for NoopWeatherProvider {
    async fn forecast(&self, _city: &str, _date: Date) -> Option<Forecast> {
        None
    }
}
