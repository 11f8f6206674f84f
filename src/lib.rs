//! # humans
//!
//! A small JSON CRUD service over a single PostgreSQL table of people.
//!
//! Each request is routed to one handler, which decodes its input, runs one
//! parameter-bound statement through a shared [`HumanStore`], and answers
//! with JSON:
//!
//! - `GET /` lists the endpoints
//! - `GET /humans`, `GET /humans/{id}` read
//! - `POST /humans` creates, `PUT /humans/{id}` overwrites
//! - `DELETE /humans/{id}` removes
//!
//! The HTTP plumbing is deliberately small: a radix-tree [`Router`] per
//! method, async handlers that are plain functions or closures, a
//! [`middleware`] chain, and a hyper-based [`Server`] with graceful
//! shutdown.
//!
//! ## Wiring it up
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use humans::{Config, PgHumanStore, Server, api};
//!
//! # async fn run() -> Result<(), humans::Error> {
//! let config = Config::from_env()?;
//! let store = PgHumanStore::connect(&config.database_url, config.store).await?;
//! store.bootstrap().await?;
//!
//! Server::bind(config.bind_addr).serve(api::app(Arc::new(store))).await
//! # }
//! ```

mod error;
mod handler;
mod method;
mod model;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod api;
pub mod config;
pub mod health;
pub mod middleware;
pub mod store;

pub use config::Config;
pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use model::Human;
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
pub use store::{HumanStore, MemoryHumanStore, PgHumanStore, PgStoreOptions, StoreError};
