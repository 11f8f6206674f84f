use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use super::{HumanStore, Result, StoreError};
use crate::model::Human;

const CREATE_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS humans (id SERIAL PRIMARY KEY, F_name TEXT, L_name TEXT)";
const SELECT_ALL: &str = "SELECT id, F_name, L_name FROM humans";
const SELECT_ONE: &str = "SELECT id, F_name, L_name FROM humans WHERE id = $1::integer";
const INSERT: &str = "INSERT INTO humans (F_name, L_name) VALUES ($1, $2) RETURNING id, F_name, L_name";
const UPDATE: &str = "UPDATE humans SET F_name = $1, L_name = $2 WHERE id = $3::integer";
const DELETE: &str = "DELETE FROM humans WHERE id = $1::integer";

/// Pool sizing and deadlines for [`PgHumanStore`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PgStoreOptions {
    pub max_connections: u32,
    pub connect_timeout: Duration,
    /// Upper bound on every individual statement, including pool checkout.
    pub query_timeout: Duration,
}

impl Default for PgStoreOptions {
    fn default() -> Self {
        Self {
            max_connections: 8,
            connect_timeout: Duration::from_secs(2),
            query_timeout: Duration::from_secs(5),
        }
    }
}

/// PostgreSQL-backed store over a shared connection pool.
///
/// Each statement runs in autocommit mode; nothing spans more than one
/// statement, so the lookup and the delete in [`HumanStore::delete`] are not
/// atomic with respect to a concurrent delete of the same id.
pub struct PgHumanStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgHumanStore {
    pub async fn connect(db_url: &str, options: PgStoreOptions) -> Result<Self> {
        let pool = tokio::time::timeout(
            options.connect_timeout,
            PgPoolOptions::new()
                .max_connections(options.max_connections)
                .acquire_timeout(options.query_timeout)
                .connect(db_url),
        )
        .await
        .map_err(|_| StoreError::Timeout)??;

        info!(max_connections = options.max_connections, "database pool ready");
        Ok(Self::from_pool(pool, options.query_timeout))
    }

    /// Wraps an existing pool, for callers that manage connections themselves.
    pub fn from_pool(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }

    /// Creates the `humans` table if it does not exist yet.
    pub async fn bootstrap(&self) -> Result<()> {
        self.bounded(sqlx::query(CREATE_TABLE).execute(&self.pool)).await?;
        Ok(())
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = std::result::Result<T, sqlx::Error>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(res) => res.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout),
        }
    }
}

#[async_trait]
impl HumanStore for PgHumanStore {
    async fn list(&self) -> Result<Vec<Human>> {
        let rows = self.bounded(sqlx::query(SELECT_ALL).fetch_all(&self.pool)).await?;
        Ok(rows.iter().map(human_from_row).collect::<std::result::Result<Vec<_>, sqlx::Error>>()?)
    }

    async fn get(&self, id: &str) -> Result<Human> {
        let row = self
            .bounded(sqlx::query(SELECT_ONE).bind(id).fetch_optional(&self.pool))
            .await;
        match row {
            Ok(Some(row)) => Ok(human_from_row(&row)?),
            Ok(None) => Err(StoreError::NotFound),
            Err(e) if matches_no_row(&e) => Err(StoreError::NotFound),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, first_name: &str, last_name: &str) -> Result<Human> {
        let row = self
            .bounded(
                sqlx::query(INSERT)
                    .bind(first_name)
                    .bind(last_name)
                    .fetch_one(&self.pool),
            )
            .await?;
        Ok(human_from_row(&row)?)
    }

    async fn update(&self, id: &str, first_name: &str, last_name: &str) -> Result<()> {
        let res = self
            .bounded(
                sqlx::query(UPDATE)
                    .bind(first_name)
                    .bind(last_name)
                    .bind(id)
                    .execute(&self.pool),
            )
            .await;
        match res {
            Ok(done) => {
                if done.rows_affected() == 0 {
                    debug!(id, "update matched no row");
                }
                Ok(())
            }
            Err(e) if matches_no_row(&e) => {
                debug!(id, "update id is not an integer, nothing to change");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.get(id).await?;

        let done = self
            .bounded(sqlx::query(DELETE).bind(id).execute(&self.pool))
            .await?;
        if done.rows_affected() == 0 {
            debug!(id, "row vanished between lookup and delete");
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.bounded(sqlx::query("SELECT 1").execute(&self.pool)).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("database pool closed");
    }
}

/// NULL names read as empty strings.
fn human_from_row(row: &PgRow) -> std::result::Result<Human, sqlx::Error> {
    Ok(Human {
        id: row.try_get(0)?,
        first_name: row.try_get::<Option<String>, _>(1)?.unwrap_or_default(),
        last_name: row.try_get::<Option<String>, _>(2)?.unwrap_or_default(),
    })
}

/// True when the database rejected the id itself: not an integer
/// (`22P02`) or outside the `integer` range (`22003`). Such an id cannot
/// match any row.
fn matches_no_row(err: &StoreError) -> bool {
    let StoreError::Database(sqlx::Error::Database(db)) = err else {
        return false;
    };
    matches!(db.code().as_deref(), Some("22P02" | "22003"))
}
