//! Weather tool backed by OpenWeather

use crate::context::ToolContext;
use crate::error::{Error, Result};
use crate::registry::{Tool, ToolDefinition, ToolOutput};
use crate::schema::ParamSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Default OpenWeather endpoint
pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

const WEATHER_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Deserialize)]
struct OwmResponse {
    name: String,
    main: OwmMain,
    weather: Vec<OwmCondition>,
    wind: OwmWind,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

/// Weather tool
pub struct WeatherTool {
    definition: ToolDefinition,
    api_key: Option<String>,
    endpoint: String,
    client: reqwest::Client,
}

impl WeatherTool {
    /// Create a weather tool; without a key every call fails politely
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        let definition = ToolDefinition::new(
            "get_weather",
            "Get current weather for a city. Use this when the user asks about weather.",
        )
        .with_parameters(ParamSchema::object().required_property(
            "city",
            ParamSchema::string().describe("City name, e.g. 'Mumbai', 'Delhi', 'Bangalore'"),
        ));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(WEATHER_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            definition,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: DEFAULT_WEATHER_URL.to_string(),
            client,
        }
    }

    /// Override the endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait::async_trait]
impl Tool for WeatherTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<ToolOutput> {
        let city = args["city"].as_str().unwrap_or_default().trim();
        let Some(key) = &self.api_key else {
            return Err(Error::ExecutionFailed("weather service not configured".into()));
        };

        debug!(city = %city, "Fetching weather");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", city), ("appid", key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Weather request failed");
                Error::ExecutionFailed("weather service unreachable".into())
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::ExecutionFailed(format!("city '{city}' not found")));
        }
        if !response.status().is_success() {
            return Err(Error::ExecutionFailed(format!(
                "weather service returned {}",
                response.status()
            )));
        }

        let body: OwmResponse = response
            .json()
            .await
            .map_err(|e| Error::ExecutionFailed(format!("unexpected weather response: {e}")))?;
        Ok(summarize(&body))
    }
}

fn summarize(body: &OwmResponse) -> ToolOutput {
    let description = body
        .weather
        .first()
        .map_or("unknown conditions", |w| w.description.as_str());
    let temperature = body.main.temp.round() as i64;

    ToolOutput::new(
        format!("Weather in {}: {temperature}°C, {description}", body.name),
        json!({
            "city": body.name,
            "temperature": temperature,
            "feels_like": body.main.feels_like.round() as i64,
            "description": description,
            "humidity": body.main.humidity,
            "wind_speed": (body.wind.speed * 3.6).round() as i64,
        }),
    )
}
