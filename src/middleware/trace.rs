use std::time::Instant;

use tracing::{Instrument, info, info_span};

use crate::request::Request;
use crate::response::Response;

use super::Next;

/// Wraps each request in a `request` span and logs status and latency once
/// the response is ready.
pub async fn trace(req: Request, next: Next) -> Response {
    let span = info_span!("request", method = %req.method(), path = %req.path());
    let start = Instant::now();

    let res = next.run(req).instrument(span.clone()).await;

    span.in_scope(|| {
        info!(
            status = res.status_code().as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "request completed"
        );
    });
    res
}
