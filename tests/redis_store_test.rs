//! Redis session store against a real server
//!
//! Needs Docker; run with `cargo test -- --ignored`.

mod helpers;

use chrono::Utc;
use helpers::*;
use minibot::config::RedisConfig;
use minibot::models::{UserProfile, UserSession};
use minibot::state::{RedisSessionStore, SessionStore};
use minibot::MiniBotError;
use serde_json::json;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::redis::Redis;

fn session(user_id: &str) -> UserSession {
    let profile = UserProfile {
        username: Some("ivan".to_string()),
        chat_id: Some(42),
        ..UserProfile::default()
    };
    UserSession::new(user_id, Utc::now().fixed_offset(), profile)
}

#[tokio::test]
#[ignore]
async fn test_redis_store_round_trip() {
    init_test_env();
    let container = Redis::default().start().await.expect("redis container");
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(6379).await.unwrap();

    let store = RedisSessionStore::new(RedisConfig {
        url: format!("redis://{}:{}", host, port),
        prefix: "minibot_test:".to_string(),
    })
    .unwrap();

    assert!(!store.exists("42").await.unwrap());

    let mut record = session("42");
    let mut data = serde_json::Map::new();
    data.insert("chat_id".to_string(), json!(42));
    record.start_process("feedback", data, Utc::now().fixed_offset());
    store.save(&record).await.unwrap();

    assert!(store.exists("42").await.unwrap());
    assert_eq!(store.load("42").await.unwrap(), Some(record));

    assert!(store.delete("42").await.unwrap());
    assert!(!store.delete("42").await.unwrap());
    assert_eq!(store.load("42").await.unwrap(), None);
}

#[tokio::test]
#[ignore]
async fn test_redis_update_rewrites_record() {
    init_test_env();
    let container = Redis::default().start().await.expect("redis container");
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(6379).await.unwrap();

    let store = RedisSessionStore::new(RedisConfig {
        url: format!("redis://{}:{}", host, port),
        prefix: "minibot_test:".to_string(),
    })
    .unwrap();

    let untouched = store
        .update("42", Box::new(|_: Option<UserSession>| -> Option<UserSession> { None }))
        .await
        .unwrap();
    assert!(!untouched.written);
    assert!(!store.exists("42").await.unwrap());

    store.save(&session("42")).await.unwrap();
    let change = store
        .update(
            "42",
            Box::new(|current: Option<UserSession>| {
                let mut record = current?;
                record.start_process("feedback", serde_json::Map::new(), Utc::now().fixed_offset());
                Some(record)
            }),
        )
        .await
        .unwrap();

    assert!(change.written);
    assert!(change.before.unwrap().is_idle());
    assert_eq!(store.load("42").await.unwrap(), change.after);
}

#[tokio::test]
async fn test_unreachable_redis_is_store_unavailable() {
    init_test_env();
    let store = RedisSessionStore::new(RedisConfig {
        url: "redis://127.0.0.1:1".to_string(),
        prefix: "minibot_test:".to_string(),
    })
    .unwrap();

    let err = store.exists("42").await.unwrap_err();
    assert!(matches!(err, MiniBotError::StoreUnavailable(_)), "got {err:?}");
}
