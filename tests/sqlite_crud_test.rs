//! End-to-end lifecycle and CRUD tests against real SQLite databases.

use serde_json::{Value as JsonValue, json};
use sqlgate::{
    ConnectionLifecycle, CrudEngine, DbHandle, DriverConfig, Predicate, Record, SqlGateError,
};
use tempfile::NamedTempFile;

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

fn temp_db_path() -> String {
    init_tracing();
    let temp_file = NamedTempFile::new().unwrap();
    // Keep the temp file alive - prevent deletion when this function returns
    temp_file
        .into_temp_path()
        .keep()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

fn record(value: JsonValue) -> Record {
    match value {
        JsonValue::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

fn sqlite_pool(handle: &DbHandle) -> &sqlx::SqlitePool {
    match handle {
        DbHandle::Sqlite(pool) => pool,
        _ => panic!("expected a SQLite handle"),
    }
}

async fn setup_users_table() -> (ConnectionLifecycle, DbHandle) {
    let mut lifecycle = ConnectionLifecycle::new(DriverConfig::sqlite(temp_db_path()));
    let handle = lifecycle.handle().await.unwrap();

    sqlx::query(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT,
            age INTEGER,
            profile TEXT
        )",
    )
    .execute(sqlite_pool(&handle))
    .await
    .unwrap();

    (lifecycle, handle)
}

#[tokio::test]
async fn connect_is_idempotent() {
    let mut lifecycle = ConnectionLifecycle::new(DriverConfig::sqlite(temp_db_path()));
    assert!(!lifecycle.is_connected());

    lifecycle.connect().await.unwrap();
    assert!(lifecycle.is_connected());
    let first = lifecycle.handle().await.unwrap();

    // second connect does nothing; the handle still points at the same pool
    lifecycle.connect().await.unwrap();
    let second = lifecycle.handle().await.unwrap();
    assert!(!sqlite_pool(&first).is_closed());
    assert!(!sqlite_pool(&second).is_closed());
    lifecycle.disconnect().await;
    assert!(sqlite_pool(&first).is_closed());
    assert!(sqlite_pool(&second).is_closed());
}

#[tokio::test]
async fn disconnect_then_reconnect() {
    let mut lifecycle = ConnectionLifecycle::new(DriverConfig::sqlite(temp_db_path()));
    lifecycle.connect().await.unwrap();
    lifecycle.disconnect().await;
    assert!(!lifecycle.is_connected());

    lifecycle.reconnect().await.unwrap();
    assert!(lifecycle.is_connected());
    assert!(lifecycle.ping().await);
}

#[tokio::test]
async fn ping_connects_lazily() {
    let mut lifecycle = ConnectionLifecycle::new(DriverConfig::sqlite(temp_db_path()));
    assert!(!lifecycle.is_connected());
    assert!(lifecycle.ping().await);
    assert!(lifecycle.is_connected());
}

#[tokio::test]
async fn ping_detail_reports_latency_on_success() {
    let mut lifecycle = ConnectionLifecycle::new(DriverConfig::sqlite(temp_db_path()));
    let health = lifecycle.ping_detail().await;
    assert!(health.status);
    assert!(health.latency_ms.unwrap() >= 0.0);
    assert!(health.error.is_none());
}

#[tokio::test]
async fn insert_one_returns_generated_key() {
    let (_lifecycle, handle) = setup_users_table().await;
    let engine = CrudEngine::new(handle);

    // null age is omitted from the statement entirely
    let key = engine
        .insert_one(
            "users",
            &record(json!({"id": null, "name": "Ann", "age": null})),
        )
        .await
        .unwrap();
    assert_eq!(key, json!(1));

    let key = engine
        .insert_one("users", &record(json!({"id": null, "name": "Bob"})))
        .await
        .unwrap();
    assert_eq!(key, json!(2));
}

#[tokio::test]
async fn insert_one_null_key_is_a_write_error() {
    let (_lifecycle, handle) = setup_users_table().await;
    let engine = CrudEngine::new(handle);

    // first declared column is email, which stays NULL in the row
    let result = engine
        .insert_one("users", &record(json!({"email": null, "name": "Ann"})))
        .await;
    assert!(matches!(result, Err(SqlGateError::Write { .. })));
}

#[tokio::test]
async fn insert_one_driver_failure_is_a_write_error() {
    let (_lifecycle, handle) = setup_users_table().await;
    let engine = CrudEngine::new(handle);

    let result = engine
        .insert_one("no_such_table", &record(json!({"name": "Ann"})))
        .await;
    assert!(matches!(result, Err(SqlGateError::Write { .. })));
}

#[tokio::test]
async fn insert_many_writes_all_rows_in_one_statement() {
    let (_lifecycle, handle) = setup_users_table().await;
    let engine = CrudEngine::new(handle.clone());

    engine
        .insert_many(
            "users",
            &[
                record(json!({"name": "Ann", "age": 30})),
                record(json!({"name": "Bob", "age": 25})),
                record(json!({"name": "Cid", "age": 41})),
            ],
        )
        .await
        .unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(sqlite_pool(&handle))
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn insert_many_rejects_divergent_records() {
    let (_lifecycle, handle) = setup_users_table().await;
    let engine = CrudEngine::new(handle.clone());

    let result = engine
        .insert_many(
            "users",
            &[
                record(json!({"name": "Ann", "age": 30})),
                record(json!({"name": "Bob", "email": "bob@example.com"})),
            ],
        )
        .await;
    assert!(matches!(result, Err(SqlGateError::InvalidInput { .. })));

    // nothing was written
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(sqlite_pool(&handle))
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn update_returns_affected_row_count() {
    let (_lifecycle, handle) = setup_users_table().await;
    let engine = CrudEngine::new(handle.clone());

    engine
        .insert_many(
            "users",
            &[
                record(json!({"name": "Ann", "age": 30})),
                record(json!({"name": "Bob", "age": 30})),
                record(json!({"name": "Cid", "age": 41})),
            ],
        )
        .await
        .unwrap();

    let matched = Predicate::new("age = :age").bind("age", &json!(30));
    let affected = engine
        .update("users", &record(json!({"age": 31})), &matched)
        .await
        .unwrap();
    assert_eq!(affected, 2);

    let updated: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE age = 31")
        .fetch_one(sqlite_pool(&handle))
        .await
        .unwrap();
    assert_eq!(updated, 2);
}

#[tokio::test]
async fn update_can_set_null() {
    let (_lifecycle, handle) = setup_users_table().await;
    let engine = CrudEngine::new(handle.clone());

    engine
        .insert_one("users", &record(json!({"id": null, "name": "Ann", "age": 30})))
        .await
        .unwrap();

    let matched = Predicate::new("name = :name").bind("name", &json!("Ann"));
    let affected = engine
        .update("users", &record(json!({"age": null})), &matched)
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let age: Option<i64> = sqlx::query_scalar("SELECT age FROM users WHERE name = 'Ann'")
        .fetch_one(sqlite_pool(&handle))
        .await
        .unwrap();
    assert_eq!(age, None);
}

#[tokio::test]
async fn delete_with_no_match_returns_zero() {
    let (_lifecycle, handle) = setup_users_table().await;
    let engine = CrudEngine::new(handle);

    let matched = Predicate::new("id = :id").bind("id", &json!(7));
    let deleted = engine.delete("users", &matched).await.unwrap();
    assert_eq!(deleted, 0);
}

#[tokio::test]
async fn delete_returns_deleted_count() {
    let (_lifecycle, handle) = setup_users_table().await;
    let engine = CrudEngine::new(handle);

    engine
        .insert_many(
            "users",
            &[
                record(json!({"name": "Ann", "age": 30})),
                record(json!({"name": "Bob", "age": 30})),
            ],
        )
        .await
        .unwrap();

    let matched = Predicate::new("age = :age").bind("age", &json!(30));
    assert_eq!(engine.delete("users", &matched).await.unwrap(), 2);
}

#[tokio::test]
async fn structured_values_are_stored_as_json_text() {
    let (_lifecycle, handle) = setup_users_table().await;
    let engine = CrudEngine::new(handle.clone());

    engine
        .insert_one(
            "users",
            &record(json!({
                "id": null,
                "name": "Ann",
                "profile": {"tags": ["admin"], "level": 3}
            })),
        )
        .await
        .unwrap();

    let stored: String = sqlx::query_scalar("SELECT profile FROM users WHERE name = 'Ann'")
        .fetch_one(sqlite_pool(&handle))
        .await
        .unwrap();
    let parsed: JsonValue = serde_json::from_str(&stored).unwrap();
    assert_eq!(parsed, json!({"tags": ["admin"], "level": 3}));
}

#[tokio::test]
async fn registry_shares_one_connection_per_name() {
    let registry = sqlgate::ConnectionRegistry::new();
    registry
        .register("main", DriverConfig::sqlite(temp_db_path()))
        .await
        .unwrap();

    let first = registry.for_config("main").await.unwrap();
    sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)")
        .execute(sqlite_pool(&first))
        .await
        .unwrap();

    // a second checkout sees the table created through the first
    let second = registry.for_config("main").await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t")
        .fetch_one(sqlite_pool(&second))
        .await
        .unwrap();
    assert_eq!(count, 0);

    assert!(registry.ping("main").await.unwrap());
    registry.disconnect_all().await;
    assert!(registry.is_empty().await);
}
