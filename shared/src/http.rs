//! HTTP helpers for Lambda functions.

use lambda_http::{Body, Request, RequestExt, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use crate::{Error, Result};

/// Body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(data)?))
        .map_err(|e| Error::Internal(format!("Failed to build response: {}", e)))
}

/// Create a response carrying only a status code.
pub fn empty_response(status: u16) -> Result<Response<Body>> {
    Response::builder()
        .status(status)
        .body(Body::Empty)
        .map_err(|e| Error::Internal(format!("Failed to build response: {}", e)))
}

/// Create an error response for the given error.
pub fn error_response(err: &Error) -> Result<Response<Body>> {
    json_response(
        err.status_code(),
        &ErrorBody {
            error: err.public_message(),
        },
    )
}

/// Turn a handler outcome into the Lambda reply, logging failures.
///
/// Server-side failures are logged with their cause and answered with a generic 500.
pub fn into_lambda_response(
    outcome: Result<Response<Body>>,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    match outcome {
        Ok(response) => Ok(response),
        Err(err) => {
            if err.status_code() >= 500 {
                error!(error = %err, "Request failed");
            } else {
                warn!(status = err.status_code(), error = %err, "Request rejected");
            }
            Ok(error_response(&err)?)
        }
    }
}

/// Parse request body as JSON, mapping failures to a 400.
pub fn parse_json_body<T: DeserializeOwned>(body: &Body) -> Result<T> {
    serde_json::from_slice(body.as_ref())
        .map_err(|e| Error::BadRequest(format!("Invalid request body: {}", e)))
}

/// Required `{uuid}` path parameter.
pub fn path_uuid(event: &Request) -> Result<String> {
    event
        .path_parameters_ref()
        .and_then(|params| params.first("uuid"))
        .filter(|uuid| !uuid.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::BadRequest("Missing UUID in URL path".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_error_response_body() {
        let err = Error::NotFound("Open House does not exist".into());
        let response = error_response(&err).unwrap();
        assert_eq!(response.status(), 404);

        let body: serde_json::Value = serde_json::from_slice(response.body().as_ref()).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Open House does not exist"}));
    }

    #[test]
    fn test_store_failure_becomes_500() {
        let response = into_lambda_response(Err(Error::Aws("connection reset".into()))).unwrap();
        assert_eq!(response.status(), 500);

        let body: serde_json::Value = serde_json::from_slice(response.body().as_ref()).unwrap();
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn test_path_uuid() {
        let request = Request::default().with_path_parameters(HashMap::from([(
            "uuid".to_string(),
            "abc".to_string(),
        )]));
        assert_eq!(path_uuid(&request).unwrap(), "abc");

        let err = path_uuid(&Request::default()).unwrap_err();
        assert_eq!(err.public_message(), "Missing UUID in URL path");
    }

    #[test]
    fn test_parse_empty_body_is_bad_request() {
        let err = parse_json_body::<serde_json::Value>(&Body::Empty).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
