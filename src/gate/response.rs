//! Rejection bodies for requests stopped by the gate.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};

/// Substitution marker replaced by the flag name.
pub const FLAG_MARKER: &str = "{flag}";
pub const DEFAULT_TEMPLATE: &str = "Flag {flag} is not active";
pub const DEFAULT_KEY: &str = "error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorFormat {
    /// `{ "<key>": "<message>" }`
    Json { key: String },
    /// The message as `text/plain`.
    Plain,
}

impl Default for ErrorFormat {
    fn default() -> Self {
        ErrorFormat::Json { key: DEFAULT_KEY.to_string() }
    }
}

/// How a rejected request is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorOptions {
    pub status: StatusCode,
    pub template: String,
    pub format: ErrorFormat,
}

impl Default for ErrorOptions {
    fn default() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            template: DEFAULT_TEMPLATE.to_string(),
            format: ErrorFormat::default(),
        }
    }
}

impl ErrorOptions {
    pub fn json() -> Self {
        Self::default()
    }

    pub fn plain() -> Self {
        Self { format: ErrorFormat::Plain, ..Self::default() }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Key of the JSON body. Switches the format to JSON if it was plain.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.format = ErrorFormat::Json { key: key.into() };
        self
    }

    /// The template with its first `{flag}` replaced by `flag_name`.
    pub fn message(&self, flag_name: &str) -> String {
        self.template.replacen(FLAG_MARKER, flag_name, 1)
    }

    /// Full rejection response for `flag_name`.
    pub fn reject(&self, flag_name: &str) -> Response {
        (self.status, format(flag_name, Some(self))).into_response()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RejectionBody {
    Json(Value),
    Plain(String),
}

impl IntoResponse for RejectionBody {
    fn into_response(self) -> Response {
        match self {
            RejectionBody::Json(value) => Json(value).into_response(),
            RejectionBody::Plain(message) => message.into_response(),
        }
    }
}

/// Render the body rejecting `flag_name`. No options means the defaults.
pub fn format(flag_name: &str, options: Option<&ErrorOptions>) -> RejectionBody {
    let default = ErrorOptions::default();
    let options = options.unwrap_or(&default);
    let message = options.message(flag_name);

    match &options.format {
        ErrorFormat::Json { key } => {
            let mut body = Map::new();
            body.insert(key.clone(), Value::String(message));
            RejectionBody::Json(Value::Object(body))
        }
        ErrorFormat::Plain => RejectionBody::Plain(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::json;

    #[test]
    fn test_default_body() {
        assert_eq!(
            format("test", None),
            RejectionBody::Json(json!({ "error": "Flag test is not active" }))
        );
    }

    #[test]
    fn test_custom_key_and_template() {
        let options = ErrorOptions::json()
            .with_key("reason")
            .with_template("{flag} is off, and {flag} stays off");
        assert_eq!(
            format("beta", Some(&options)),
            RejectionBody::Json(json!({ "reason": "beta is off, and {flag} stays off" }))
        );
    }

    #[test]
    fn test_template_without_marker() {
        let options =
            ErrorOptions::json().with_template("You are not allowed to access this route.");
        assert_eq!(options.message("beta"), "You are not allowed to access this route.");
    }

    #[test]
    fn test_plain_body() {
        let options = ErrorOptions::plain();
        assert_eq!(
            format("beta", Some(&options)),
            RejectionBody::Plain("Flag beta is not active".to_string())
        );
    }

    #[tokio::test]
    async fn test_reject_uses_configured_status() {
        let response = ErrorOptions::plain()
            .with_status(StatusCode::NOT_FOUND)
            .reject("beta");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()["content-type"],
            "text/plain; charset=utf-8"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Flag beta is not active");
    }

    #[tokio::test]
    async fn test_reject_json_content_type() {
        let response = ErrorOptions::default().reject("beta");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()["content-type"], "application/json");
    }
}
