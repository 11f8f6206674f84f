//! Middleware layer.
//!
//! A middleware sees every request before routing and every response after
//! it, including the 404/405 answers for requests no route matched. It is
//! any async function or closure of the shape
//!
//! ```text
//! Fn(Request, Next) -> impl Future<Output = Response>
//! ```
//!
//! and calls [`Next::run`] to hand the request to the rest of the chain.
//! Layers run in registration order: the first one added is the outermost.
//!
//! Built-in middleware:
//! - [`json_content_type`]: every response is `application/json`
//! - [`trace`]: per-request span with method, path, status, latency

use std::future::Future;
use std::sync::Arc;

mod content_type;
mod trace;

pub use content_type::json_content_type;
pub use trace::trace;

use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// Implemented for every valid middleware function.
pub trait Middleware: Send + Sync + 'static {
    #[doc(hidden)]
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin((self)(req, next))
    }
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The remainder of the middleware chain, ending in the router itself.
pub struct Next {
    router: Arc<Router>,
    index: usize,
}

impl Next {
    pub(crate) fn new(router: Arc<Router>) -> Self {
        Self { router, index: 0 }
    }

    /// Passes `req` to the next layer, or to route dispatch after the last one.
    pub async fn run(self, req: Request) -> Response {
        let Self { router, index } = self;
        let layer = router.layers.get(index).cloned();
        match layer {
            Some(layer) => layer.call(req, Self { router, index: index + 1 }).await,
            None => router.route(req).await,
        }
    }
}
