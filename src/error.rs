//! Unified error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

/// The error type returned by the service's fallible startup and serving
/// operations.
///
/// Per-request failures (404, 500, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// the failures that stop the process: bad configuration, an unreachable
/// database, or a listener that cannot bind.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
