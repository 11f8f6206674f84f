//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Tells every open connection to finish: in-flight requests complete,
//!    idle keep-alive connections close at once.
//! 3. Waits at most the drain timeout for that, then aborts what is left.
//! 4. Returns from [`Server::serve`], so `main` can close the database pool
//!    and exit cleanly.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::response::{APPLICATION_JSON, Response};
use crate::router::Router;
use crate::status::Status;

pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    drain_timeout: Duration,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr, drain_timeout: DEFAULT_DRAIN_TIMEOUT }
    }

    /// Upper bound on how long shutdown waits for open connections.
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after shutdown (SIGTERM or Ctrl-C) and the connection
    /// drain that follows it.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops accepting when `signal` resolves.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        self.run(listener, router, signal).await
    }

    pub(crate) async fn run(
        self,
        listener: TcpListener,
        router: Router,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let router = Arc::new(router);
        let builder = ConnBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();

        info!(addr = %listener.local_addr()?, "humans listening");

        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting even if
                // more connections are queued.
                biased;

                () = &mut signal => {
                    info!(open = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    // Called once per request on the connection.
                    let svc = service_fn(move |req| {
                        let router = Arc::clone(&router);
                        async move { dispatch(router, req).await }
                    });

                    let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), svc);
                    let conn = graceful.watch(conn.into_owned());

                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            debug!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);

        let drain = async {
            graceful.shutdown().await;
            while tasks.join_next().await.is_some() {}
        };
        if tokio::time::timeout(self.drain_timeout, drain).await.is_err() {
            warn!(
                timeout_ms = self.drain_timeout.as_millis() as u64,
                "drain timed out, aborting remaining connections"
            );
            tasks.shutdown().await;
        }

        info!("humans stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Collects the body, then hands the request to the router.
///
/// Every failure becomes a response, so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let Some(method) = Method::from_http(req.method()) else {
        warn!(method = %req.method(), path = req.uri().path(), "rejecting unroutable method");
        return Ok(reject(Status::MethodNotAllowed));
    };

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(method = %method, path = parts.uri.path(), "failed to read request body: {e}");
            return Ok(reject(Status::BadRequest));
        }
    };

    let req = Request::new(method, parts.uri.path(), parts.headers, body);
    Ok(router.handle(req).await.into_inner())
}

/// Answer for requests that never reach the middleware chain. Still JSON,
/// like everything else the service sends.
fn reject(status: Status) -> http::Response<Full<Bytes>> {
    let mut res = Response::status(status);
    res.set_header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    res.into_inner()
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT. A handler that cannot be
/// installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;

    use super::*;

    async fn start() -> (SocketAddr, oneshot::Sender<()>, JoinHandle<Result<(), Error>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let router = Router::new().get("/healthz", crate::health::liveness);
        let server = tokio::spawn(
            Server::bind(addr)
                .drain_timeout(Duration::from_secs(5))
                .run(listener, router, async move {
                    let _ = stopped.await;
                }),
        );
        (addr, stop, server)
    }

    /// Reads one response head from a connection that stays open.
    async fn read_head(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before a response arrived");
            buf.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8_lossy(&buf).to_lowercase()
    }

    #[tokio::test]
    async fn shutdown_closes_idle_keep_alive_connections() {
        let (addr, stop, server) = start().await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"GET /healthz HTTP/1.1\r\nhost: localhost\r\n\r\n").await.unwrap();
        let head = read_head(&mut stream).await;
        assert!(head.starts_with("http/1.1 200"), "{head}");

        stop.send(()).unwrap();

        let finished = tokio::time::timeout(Duration::from_secs(3), server).await;
        assert!(matches!(finished, Ok(Ok(Ok(())))), "serve did not return after shutdown");
    }

    #[tokio::test]
    async fn unroutable_method_is_json_405() {
        let (addr, stop, server) = start().await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"TRACE /humans HTTP/1.1\r\nhost: localhost\r\n\r\n").await.unwrap();
        let head = read_head(&mut stream).await;

        assert!(head.starts_with("http/1.1 405"), "{head}");
        assert!(head.contains("content-type: application/json"), "{head}");

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[test]
    fn early_rejections_are_json() {
        let res = reject(Status::BadRequest);
        assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
        assert_eq!(res.headers()[CONTENT_TYPE], APPLICATION_JSON);
    }
}
