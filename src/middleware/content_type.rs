use http::header::{CONTENT_TYPE, HeaderValue};

use crate::request::Request;
use crate::response::{APPLICATION_JSON, Response};

use super::Next;

/// Stamps `Content-Type: application/json` on every response, whatever the
/// handler set and whether or not a route matched.
pub async fn json_content_type(req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;
    res.set_header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    res
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{Method, Router, Status};

    #[tokio::test]
    async fn replaces_handler_content_type() {
        let router = Router::new()
            .get("/", |_req: Request| async {
                Response::builder().header("content-type", "text/plain").no_body()
            })
            .layer(json_content_type);

        let res = Arc::new(router).handle(Request::test(Method::Get, "/", "")).await;

        assert_eq!(res.headers().get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(res.headers()[CONTENT_TYPE], APPLICATION_JSON);
    }

    #[tokio::test]
    async fn applies_to_empty_error_responses() {
        let router = Router::new()
            .get("/", |_req: Request| async { Status::NotFound })
            .layer(json_content_type);

        let res = Arc::new(router).handle(Request::test(Method::Get, "/", "")).await;

        assert!(res.body().is_empty());
        assert_eq!(res.headers()[CONTENT_TYPE], APPLICATION_JSON);
    }
}
