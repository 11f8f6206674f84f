//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. Middleware registered
//! with [`Router::layer`] wraps every request, matched or not.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Every registration returns `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    pub(crate) layers: Vec<BoxedMiddleware>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), layers: Vec::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use humans::{Method, Request, Router, Status};
    /// # async fn get_human(_: Request) -> Status { Status::Ok }
    /// # async fn create_human(_: Request) -> Status { Status::Ok }
    /// Router::new()
    ///     .on(Method::Get,  "/humans/{id}", get_human)
    ///     .on(Method::Post, "/humans",      create_human);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Routes are fixed at startup, so this is a
    /// programming error rather than a runtime condition.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Put, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Delete, path, handler)
    }

    /// Appends a middleware. The first layer added runs first.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Arc::new(middleware));
        self
    }

    /// Runs `req` through the middleware chain and the matched handler.
    pub async fn handle(self: &Arc<Self>, req: Request) -> Response {
        Next::new(Arc::clone(self)).run(req).await
    }

    /// Route dispatch proper, the innermost step of the chain.
    pub(crate) async fn route(&self, mut req: Request) -> Response {
        match self.lookup(req.method, &req.path) {
            Some((handler, params)) => {
                req.params = params;
                handler.call(req).await
            }
            None if self.allows_other_method(req.method, &req.path) => {
                Response::status(Status::MethodNotAllowed)
            }
            None => Response::status(Status::NotFound),
        }
    }

    fn lookup(&self, method: Method, path: &str) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    fn allows_other_method(&self, method: Method, path: &str) -> bool {
        Method::ALL.iter()
            .filter(|m| **m != method)
            .filter_map(|m| self.routes.get(m))
            .any(|tree| tree.at(path).is_ok())
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
