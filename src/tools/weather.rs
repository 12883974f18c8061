//! Weather Tool
//!
//! Fixed-response tool with no collaborators.

use super::{CallContext, HandlerError, ToolContent, ToolHandler};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub const WEATHER_TOOL_NAME: &str = "get_weather";

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherInput {
    pub location: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GetWeatherTool;

#[async_trait]
impl ToolHandler for GetWeatherTool {
    type Input = WeatherInput;

    fn name(&self) -> &str {
        WEATHER_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Get the current weather for a given location."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city and state, e.g. San Francisco, CA"
                }
            },
            "required": ["location"]
        })
    }

    async fn handle(
        &self,
        _ctx: &CallContext,
        input: WeatherInput,
    ) -> Result<ToolContent, HandlerError> {
        Ok(ToolContent::text(format!(
            "Weather in {}: Sunny, 72°F",
            input.location
        )))
    }
}
