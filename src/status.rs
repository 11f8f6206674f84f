//! HTTP status codes as a typed enum.
//!
//! Use [`Status`] anywhere a status code is accepted: `Response::status()`,
//! `Response::builder().status()`, or as a bare handler return value.
//!
//! ```rust
//! use humans::{Response, Status};
//!
//! // status-only, no body
//! Response::status(Status::NotFound);
//!
//! // return Status directly from a handler
//! async fn gone(_req: humans::Request) -> Status {
//!     Status::NotFound
//! }
//! ```

use http::StatusCode;

/// The status codes this service answers with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                  // 200

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,          // 400
    NotFound,            // 404
    MethodNotAllowed,    // 405

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError, // 500
    ServiceUnavailable,  // 503
    GatewayTimeout,      // 504
}

impl From<Status> for StatusCode {
    fn from(s: Status) -> StatusCode {
        match s {
            Status::Ok                  => StatusCode::OK,
            Status::BadRequest          => StatusCode::BAD_REQUEST,
            Status::NotFound            => StatusCode::NOT_FOUND,
            Status::MethodNotAllowed    => StatusCode::METHOD_NOT_ALLOWED,
            Status::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Status::ServiceUnavailable  => StatusCode::SERVICE_UNAVAILABLE,
            Status::GatewayTimeout      => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}
