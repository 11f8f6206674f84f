use std::time::{Duration, SystemTime, UNIX_EPOCH};

use humans::{HumanStore, PgHumanStore, StoreError};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

fn test_db_url() -> Option<String> {
    std::env::var("HUMANS_TEST_DB_URL")
        .ok()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// A store bound to a fresh schema, so runs never see each other's rows.
struct Fixture {
    store: PgHumanStore,
    pool: PgPool,
    schema: String,
}

impl Fixture {
    async fn new() -> Option<Self> {
        let Some(db_url) = test_db_url() else {
            eprintln!("skipping postgres store test; set HUMANS_TEST_DB_URL to enable");
            return None;
        };

        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let schema = format!("humans_test_{}_{nanos}", std::process::id());

        // One connection, so the search_path below applies to every statement.
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&db_url)
            .await
            .expect("DB connect should succeed");
        sqlx::query(&format!("CREATE SCHEMA {schema}"))
            .execute(&pool)
            .await
            .expect("create schema should succeed");
        sqlx::query(&format!("SET search_path TO {schema}"))
            .execute(&pool)
            .await
            .expect("set search_path should succeed");

        let store = PgHumanStore::from_pool(pool.clone(), Duration::from_secs(5));
        store.bootstrap().await.expect("bootstrap should succeed");
        store.bootstrap().await.expect("bootstrap should be idempotent");

        Some(Self { store, pool, schema })
    }

    async fn teardown(self) {
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.pool)
            .await
            .expect("drop schema should succeed");
        self.store.close().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn created_human_reads_back() {
    let Some(fx) = Fixture::new().await else { return };

    let created = fx.store.create("John", "Doe").await.unwrap();
    let fetched = fx.store.get(&created.id.to_string()).await.unwrap();

    assert!(created.id >= 0);
    assert_eq!(fetched, created);
    assert_eq!((fetched.first_name.as_str(), fetched.last_name.as_str()), ("John", "Doe"));

    fx.teardown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn list_tracks_creates_and_deletes() {
    let Some(fx) = Fixture::new().await else { return };

    assert!(fx.store.list().await.unwrap().is_empty());

    let mut ids = Vec::new();
    for name in ["Ada", "Alan", "Grace", "Edsger"] {
        ids.push(fx.store.create(name, "").await.unwrap().id);
    }
    fx.store.delete(&ids[1].to_string()).await.unwrap();

    let listed = fx.store.list().await.unwrap();
    assert_eq!(listed.len(), 3);
    assert!(listed.iter().any(|h| h.first_name == "Edsger"));
    assert!(listed.iter().all(|h| h.id != ids[1]));

    fx.teardown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn deleted_human_stays_gone() {
    let Some(fx) = Fixture::new().await else { return };

    let id = fx.store.create("John", "Doe").await.unwrap().id.to_string();
    fx.store.delete(&id).await.unwrap();

    assert!(matches!(fx.store.get(&id).await, Err(StoreError::NotFound)));
    assert!(matches!(fx.store.delete(&id).await, Err(StoreError::NotFound)));

    fx.teardown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn update_replaces_both_names() {
    let Some(fx) = Fixture::new().await else { return };

    let id = fx.store.create("John", "Doe").await.unwrap().id.to_string();
    fx.store.update(&id, "Jane", "").await.unwrap();

    let h = fx.store.get(&id).await.unwrap();
    assert_eq!((h.first_name.as_str(), h.last_name.as_str()), ("Jane", ""));

    // No row, no error.
    fx.store.update("999999", "Ghost", "Ghost").await.unwrap();
    assert_eq!(fx.store.list().await.unwrap().len(), 1);

    fx.teardown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sql_metacharacters_are_plain_values() {
    let Some(fx) = Fixture::new().await else { return };

    let bystander = fx.store.create("Keep", "Me").await.unwrap();
    let hostile = "Robert'); DROP TABLE humans;--";
    let created = fx.store.create(hostile, "x' OR '1'='1").await.unwrap();

    for id in ["1; DROP TABLE humans", "1 OR 1=1", "abc", "99999999999"] {
        assert!(matches!(fx.store.get(id).await, Err(StoreError::NotFound)), "get {id}");
        assert!(matches!(fx.store.delete(id).await, Err(StoreError::NotFound)), "delete {id}");
        fx.store.update(id, "Mallory", "Mallory").await.unwrap();
    }

    let listed = fx.store.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.contains(&bystander));
    assert_eq!(fx.store.get(&created.id.to_string()).await.unwrap().first_name, hostile);

    fx.teardown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn null_names_read_as_empty() {
    let Some(fx) = Fixture::new().await else { return };

    let id: i32 = sqlx::query_scalar("INSERT INTO humans (F_name, L_name) VALUES (NULL, NULL) RETURNING id")
        .fetch_one(&fx.pool)
        .await
        .unwrap();

    let h = fx.store.get(&id.to_string()).await.unwrap();
    assert_eq!((h.first_name.as_str(), h.last_name.as_str()), ("", ""));

    fx.teardown().await;
}
