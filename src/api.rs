//! The `/humans` HTTP surface.
//!
//! | Method | Path | Success | Failure |
//! |---|---|---|---|
//! | GET | `/` | 200, usage lines | |
//! | GET | `/humans` | 200, array of humans | 500 |
//! | GET | `/humans/{id}` | 200, human | 404 |
//! | POST | `/humans` | 200, created human | 400, 500 |
//! | PUT | `/humans/{id}` | 200, request body echoed | 400, 500 |
//! | DELETE | `/humans/{id}` | 200, `"Humans deleted"` | 404, 500 |
//!
//! Every failure has an empty body; every response is `application/json`.
//! A storage deadline that expires answers 504.

use std::sync::Arc;

use tracing::{error, warn};

use crate::health;
use crate::middleware;
use crate::model::Human;
use crate::response::{IntoResponse, Json, Response};
use crate::store::{HumanStore, StoreError};
use crate::{Request, Router, Status};

/// The store every handler shares for the lifetime of the process.
pub type SharedStore = Arc<dyn HumanStore>;

pub const DELETED: &str = "Humans deleted";

const USAGE: [&str; 5] = [
    "Create               POST   : /humans",
    "Read all humans      GET    : /humans",
    "Read human by {id}   GET    : /humans/{id}",
    "Update               PUT    : /humans/{id}",
    "Delete               DELETE : /humans/{id}",
];

/// Builds the full application: routes, health probes and middleware.
pub fn app(store: SharedStore) -> Router {
    Router::new()
        .get("/", index)
        .get("/humans", {
            let store = Arc::clone(&store);
            move |req: Request| list_humans(Arc::clone(&store), req)
        })
        .get("/humans/{id}", {
            let store = Arc::clone(&store);
            move |req: Request| get_human(Arc::clone(&store), req)
        })
        .post("/humans", {
            let store = Arc::clone(&store);
            move |req: Request| create_human(Arc::clone(&store), req)
        })
        .put("/humans/{id}", {
            let store = Arc::clone(&store);
            move |req: Request| update_human(Arc::clone(&store), req)
        })
        .delete("/humans/{id}", {
            let store = Arc::clone(&store);
            move |req: Request| delete_human(Arc::clone(&store), req)
        })
        .get("/healthz", health::liveness)
        .get("/readyz", move |req: Request| health::readiness(Arc::clone(&store), req))
        .layer(middleware::trace)
        .layer(middleware::json_content_type)
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        match self {
            StoreError::NotFound => Response::status(Status::NotFound),
            StoreError::Timeout => {
                error!("storage deadline exceeded");
                Response::status(Status::GatewayTimeout)
            }
            StoreError::Database(e) => {
                error!("storage failure: {e}");
                Response::status(Status::InternalServerError)
            }
        }
    }
}

/// `GET /`
pub async fn index(_req: Request) -> Json<[&'static str; 5]> {
    Json(USAGE)
}

/// `GET /humans`
pub async fn list_humans(store: SharedStore, _req: Request) -> Response {
    store.list().await.map(Json).into_response()
}

/// `GET /humans/{id}`
pub async fn get_human(store: SharedStore, req: Request) -> Response {
    store.get(path_id(&req)).await.map(Json).into_response()
}

/// `POST /humans`. Any `id` in the body is ignored.
pub async fn create_human(store: SharedStore, req: Request) -> Response {
    let input = match decode(&req) {
        Ok(input) => input,
        Err(res) => return res,
    };
    store
        .create(&input.first_name, &input.last_name)
        .await
        .map(Json)
        .into_response()
}

/// `PUT /humans/{id}`. Answers with the decoded body whether or not a row
/// matched the id.
pub async fn update_human(store: SharedStore, req: Request) -> Response {
    let input = match decode(&req) {
        Ok(input) => input,
        Err(res) => return res,
    };
    match store.update(path_id(&req), &input.first_name, &input.last_name).await {
        Ok(()) => Json(input).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `DELETE /humans/{id}`
pub async fn delete_human(store: SharedStore, req: Request) -> Response {
    store.delete(path_id(&req)).await.map(|()| Json(DELETED)).into_response()
}

/// The `{id}` segment exactly as sent. The route guarantees it is present.
fn path_id(req: &Request) -> &str {
    req.param("id").unwrap_or_default()
}

fn decode(req: &Request) -> Result<Human, Response> {
    req.json::<Human>().map_err(|e| {
        warn!("rejecting malformed body: {e}");
        Response::status(Status::BadRequest)
    })
}
