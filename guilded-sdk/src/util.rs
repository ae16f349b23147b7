use reqwest::Response;

use crate::errors::{Error, RequestError, Result};

/// Convert non-2xx responses into a structured error that includes the server body.
///
/// If the status is successful (2xx), the original response is returned.
/// If the status is an error (4xx or 5xx), the response body is consumed
/// to create an `Error::Request(RequestError::Server)` and returned as an `Err`.
pub(crate) async fn check_http_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let message = response.text().await.unwrap_or_else(|_| {
        status
            .canonical_reason()
            .unwrap_or("Unknown Error")
            .to_string()
    });

    Err(Error::from(RequestError::Server { status, message }))
}

/// Take `property` out of a JSON response object.
///
/// The REST API wraps every entity in a named field (`{"message": {...}}`).
pub(crate) fn take_property(
    mut body: serde_json::Value,
    property: &str,
) -> Result<serde_json::Value> {
    body.get_mut(property)
        .map(serde_json::Value::take)
        .ok_or_else(|| {
            Error::from(RequestError::DecodeJson {
                message: format!("response has no `{property}` property"),
            })
        })
}
