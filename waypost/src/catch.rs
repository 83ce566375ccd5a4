//! Error-wrapping adapter. Handler failures of routes declared with
//! [catch_and_send_error](crate::metadata::RouteDeclaration::catch_and_send_error) are turned
//! into a JSON error reply instead of reaching the router's error path.

use crate::config::RoutingConfig;
use crate::error::ConfigurationError;
use crate::handler::{HandlerFuture, HandlerResult};
use crate::response::Response;
use http::StatusCode;
use serde_json::{json, Value};
use tracing::warn;

/// Reports handler errors to a response as `{"error": <message>}`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ErrorReporter {
    status: StatusCode,
    default_message: String,
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            default_message: crate::config::DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

impl TryFrom<&RoutingConfig> for ErrorReporter {
    type Error = ConfigurationError;

    fn try_from(value: &RoutingConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            status: StatusCode::from_u16(value.error_status)
                .map_err(|_| ConfigurationError::InvalidErrorStatus(value.error_status))?,
            default_message: value.default_error_message.clone(),
        })
    }
}

impl ErrorReporter {
    pub fn new(status: StatusCode, default_message: impl Into<String>) -> Self {
        Self {
            status,
            default_message: default_message.into(),
        }
    }

    /// Awaits the invocation and, if it fails, writes the error to `response`. Without a
    /// response, the error is returned unchanged for the router to handle.
    pub async fn catch_and_send_error(
        self,
        response: Option<Response>,
        invocation: HandlerFuture,
    ) -> HandlerResult {
        match (invocation.await, response) {
            (Err(error), Some(response)) => {
                let message = error.to_string();
                let message = if message.is_empty() {
                    self.default_message
                } else {
                    message
                };

                warn!(status = %self.status, "Reporting handler error: {}", message);

                response
                    .status(self.status)
                    .json(json!({ "error": message }));
                Ok(Value::Null)
            }
            (result, _) => result,
        }
    }
}
