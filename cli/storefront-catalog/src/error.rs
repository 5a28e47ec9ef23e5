//! Error handling for catalog API operations.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Common error type for catalog API operations.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    #[error("invalid catalog url '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("catalog request failed")]
    Request(#[source] reqwest::Error),
    #[error("{status}: {detail}")]
    ErrorResponse { status: StatusCode, detail: String },
    #[error("{0}")]
    UnexpectedResponse(StatusCode),
    #[error("malformed {what} payload")]
    MalformedPayload {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("expected a sequence of {what}, found {found}")]
    NotASequence {
        what: &'static str,
        found: &'static str,
    },
    #[error("{0}")]
    Other(String),
}

/// The body the backend attaches to rejected requests.
#[derive(Debug, Deserialize)]
struct ErrorDetail {
    detail: String,
}

/// Turn a non-success response into a [CatalogClientError].
///
/// Responses carrying a `detail` field keep the message,
/// anything else (e.g. an HTML error page) is reduced to its status.
pub(crate) async fn parse_error_response(resp: reqwest::Response) -> CatalogClientError {
    let status = resp.status();
    let Ok(body) = resp.text().await else {
        return CatalogClientError::UnexpectedResponse(status);
    };
    match serde_json::from_str::<ErrorDetail>(&body) {
        Ok(ErrorDetail { detail }) => CatalogClientError::ErrorResponse { status, detail },
        Err(_) => CatalogClientError::UnexpectedResponse(status),
    }
}
