use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::route::{Coordinates, RouteDetail};
use crate::errors::{DispatchError, DispatchResult};

/// Error payload the agent reports inside an otherwise successful reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ErrorPayload")]
pub struct AgentErrorDetail {
    pub message: String,
}

// Some agent versions send `"error": "..."` instead of `"error": {"message": "..."}`
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorPayload {
    Detail { message: String },
    Bare(String),
}

impl From<ErrorPayload> for AgentErrorDetail {
    fn from(payload: ErrorPayload) -> Self {
        match payload {
            ErrorPayload::Detail { message } | ErrorPayload::Bare(message) => {
                AgentErrorDetail { message }
            }
        }
    }
}

/// Everything the agent may send back. Any combination of fields can be
/// present, including none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteDetail>,
    #[serde(default, alias = "embedMapHtml", skip_serializing_if = "Option::is_none")]
    pub map_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AgentErrorDetail>,
}

impl AgentResult {
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.coordinates = Some(Coordinates::new(lat, lng));
        self
    }

    pub fn with_route(mut self, route: RouteDetail) -> Self {
        self.route = Some(route);
        self
    }

    pub fn with_map_html<S: Into<String>>(mut self, html: S) -> Self {
        self.map_html = Some(html.into());
        self
    }

    pub fn with_error<S: Into<String>>(mut self, message: S) -> Self {
        self.error = Some(AgentErrorDetail {
            message: message.into(),
        });
        self
    }

    /// Parse a success body. Only a body that is not a JSON object is an error;
    /// individual fields with an unexpected shape are dropped.
    pub fn from_slice(body: &[u8]) -> DispatchResult<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| DispatchError::MalformedResponse(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> DispatchResult<Self> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(DispatchError::MalformedResponse(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let map_html = match take_field(&mut fields, "mapHtml") {
            Some(html) => Some(html),
            None => take_field(&mut fields, "embedMapHtml"),
        };

        Ok(AgentResult {
            text: take_field(&mut fields, "text"),
            coordinates: take_field(&mut fields, "coordinates"),
            route: take_field(&mut fields, "route"),
            map_html,
            error: take_field(&mut fields, "error"),
        })
    }
}

fn take_field<T: DeserializeOwned>(fields: &mut Map<String, Value>, key: &str) -> Option<T> {
    match fields.remove(key)? {
        Value::Null => None,
        value => match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(field = key, error = %e, "dropping malformed response field");
                None
            }
        },
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
