//! Health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the database be reached? Failure → pulled from load-balancer. |

use tracing::warn;

use crate::api::SharedStore;
use crate::{Json, Request, Response, Status, IntoResponse};

/// Liveness probe. Always `200 OK` with body `"ok"`; no dependencies.
pub async fn liveness(_req: Request) -> Json<&'static str> {
    Json("ok")
}

/// Readiness probe. `200 OK` with `"ready"` once the store answers a ping,
/// `503` otherwise.
pub async fn readiness(store: SharedStore, _req: Request) -> Response {
    match store.ping().await {
        Ok(()) => Json("ready").into_response(),
        Err(e) => {
            warn!("readiness check failed: {e}");
            Response::status(Status::ServiceUnavailable)
        }
    }
}
