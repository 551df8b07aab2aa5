//! Structured error payload
//!
//! The document returned to callers whenever a run fails. Field order is the
//! declaration order below and is kept stable for logs and tests.

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::value::RawValue;
use tracing::error;

pub const DEFAULT_ERROR_NAME: &str = "exec_error";
pub const DEFAULT_ERROR_URL: &str = "http://docs.synq.fm/api/v1/errors/";
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occured while running your script";

const INDENT: &[u8] = b"    ";

/// Name, documentation link and message used to build a failure payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorTemplate {
    pub name: String,
    pub url: String,
    pub message: String,
}

impl Default for ErrorTemplate {
    fn default() -> Self {
        Self {
            name: DEFAULT_ERROR_NAME.to_string(),
            url: DEFAULT_ERROR_URL.to_string(),
            message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub name: String,
    pub url: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<RawValue>>,
}

impl ErrorPayload {
    pub fn from_template(template: &ErrorTemplate) -> Self {
        Self {
            name: template.name.clone(),
            url: template.url.clone(),
            message: template.message.clone(),
            details: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach the child's own stderr as `details`.
    ///
    /// Valid JSON is embedded as-is. Anything else (including empty output)
    /// is embedded as a JSON string so the payload still decodes.
    pub fn with_child_details(mut self, stderr: &[u8]) -> Self {
        let text = String::from_utf8_lossy(stderr).into_owned();
        let raw = match RawValue::from_string(text) {
            Ok(raw) => raw,
            Err(_) => {
                let quoted = serde_json::to_string(&String::from_utf8_lossy(stderr))
                    .unwrap_or_else(|_| "\"\"".to_string());
                match RawValue::from_string(quoted) {
                    Ok(raw) => raw,
                    Err(err) => {
                        error!("error embedding stderr in payload: {}", err);
                        return self;
                    }
                }
            }
        };
        self.details = Some(raw);
        self
    }

    pub fn details_json(&self) -> Option<&str> {
        self.details.as_deref().map(RawValue::get)
    }

    /// Serialize with four-space indentation.
    pub fn to_pretty_bytes(&self) -> Vec<u8> {
        let mut body = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut body, PrettyFormatter::with_indent(INDENT));
        if let Err(err) = self.serialize(&mut serializer) {
            error!("error marshaling data {}", err);
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_template_shape() {
        let payload = ErrorPayload::from_template(&ErrorTemplate::default());
        let body = String::from_utf8(payload.to_pretty_bytes()).unwrap();
        assert_eq!(
            body,
            "{\n    \"name\": \"exec_error\",\n    \"url\": \"http://docs.synq.fm/api/v1/errors/\",\n    \"message\": \"An error occured while running your script\"\n}"
        );
    }

    #[test]
    fn test_json_details_are_verbatim() {
        let payload = ErrorPayload::from_template(&ErrorTemplate::default())
            .with_child_details(b"{\"foo\":\"bar\"}\n");
        assert_eq!(payload.details_json(), Some("{\"foo\":\"bar\"}"));
        let body = String::from_utf8(payload.to_pretty_bytes()).unwrap();
        assert!(body.contains("\"details\": {\"foo\":\"bar\"}"));
    }

    #[test]
    fn test_non_json_details_become_string() {
        let payload = ErrorPayload::from_template(&ErrorTemplate::default())
            .with_child_details(b"Traceback: boom");
        assert_eq!(payload.details_json(), Some("\"Traceback: boom\""));

        let decoded: serde_json::Value =
            serde_json::from_slice(&payload.to_pretty_bytes()).unwrap();
        assert_eq!(decoded["details"], "Traceback: boom");
    }

    #[test]
    fn test_empty_details_still_decode() {
        let payload =
            ErrorPayload::from_template(&ErrorTemplate::default()).with_child_details(b"");
        let decoded: serde_json::Value =
            serde_json::from_slice(&payload.to_pretty_bytes()).unwrap();
        assert_eq!(decoded["details"], "");
    }
}
