//! Optional tests against a live PostgreSQL server.
//!
//! Skipped unless `SQLGATE_TEST_POSTGRES` points at a reachable server, in
//! `host:port/database:user:password` form, e.g.
//! `SQLGATE_TEST_POSTGRES=localhost:5432/sqlgate_test:postgres:postgres`.

use serde_json::{Value as JsonValue, json};
use sqlgate::{ConnectionLifecycle, CrudEngine, DbHandle, DriverConfig, Predicate, Record};

fn live_config() -> Option<DriverConfig> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let target = std::env::var("SQLGATE_TEST_POSTGRES").ok()?;
    let (endpoint, credentials) = target.split_once('/')?;
    let (host, port) = endpoint.split_once(':')?;
    let mut parts = credentials.split(':');
    let database = parts.next()?;
    let user = parts.next()?;
    let password = parts.next().unwrap_or("");
    Some(
        DriverConfig::postgres(database)
            .with_host(host)
            .with_port(port.parse().ok()?)
            .with_credentials(user, password),
    )
}

fn record(value: JsonValue) -> Record {
    match value {
        JsonValue::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

fn pg_pool(handle: &DbHandle) -> &sqlx::PgPool {
    match handle {
        DbHandle::Postgres(pool) => pool,
        _ => panic!("expected a PostgreSQL handle"),
    }
}

#[tokio::test]
async fn postgres_round_trip() {
    let Some(config) = live_config() else {
        eprintln!("SQLGATE_TEST_POSTGRES not set, skipping");
        return;
    };

    let mut lifecycle = ConnectionLifecycle::new(config);
    let handle = lifecycle.handle().await.unwrap();

    sqlx::query("DROP TABLE IF EXISTS sqlgate_live_users")
        .execute(pg_pool(&handle))
        .await
        .unwrap();
    sqlx::query(
        "CREATE TABLE sqlgate_live_users (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            age BIGINT
        )",
    )
    .execute(pg_pool(&handle))
    .await
    .unwrap();

    // the session timezone was applied during connect
    let tz: String = sqlx::query_scalar("SHOW TIMEZONE")
        .fetch_one(pg_pool(&handle))
        .await
        .unwrap();
    assert!(!tz.is_empty());

    let engine = CrudEngine::new(handle.clone());
    let key = engine
        .insert_one(
            "sqlgate_live_users",
            &record(json!({"id": null, "name": "Ann", "age": 30})),
        )
        .await
        .unwrap();
    assert_eq!(key, json!(1));

    let matched = Predicate::new("age = :age").bind("age", &json!(30));
    let affected = engine
        .update("sqlgate_live_users", &record(json!({"age": 31})), &matched)
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let gone = Predicate::new("age = :age").bind("age", &json!(31));
    assert_eq!(engine.delete("sqlgate_live_users", &gone).await.unwrap(), 1);

    assert!(lifecycle.ping().await);
    let health = lifecycle.ping_detail().await;
    assert!(health.status);

    sqlx::query("DROP TABLE sqlgate_live_users")
        .execute(pg_pool(&handle))
        .await
        .unwrap();
    lifecycle.disconnect().await;
}
