//! Contract tests run against both backends through the facade
//!
//! Each behaviour is exercised on the SQLCipher driver (on disk, in a temp
//! directory) and on the flat-store driver (file-backed), so the two stay
//! interchangeable from the caller's point of view.

use std::sync::Arc;

use keyval_common::storage::StorageConfig;
use keyval_common::testing::{random_key, sample_floats, sample_values};
use keyval_core::{FlatStore, KeyValueDriver, StorageService};
use keyval_domain::{Backend, KeyValError, StoredValue};
use keyval_infra::{
    FileFlatStore, FlatStoreDriver, MemoryFlatStore, SqlCipherDriver, StaticCapability,
};
use serde_json::json;
use tempfile::TempDir;

const SECRET: &str = "secret";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A facade over one backend plus the temp directory that owns its files
struct Harness {
    service: StorageService,
    _dir: TempDir,
}

fn relational(dir: TempDir) -> Harness {
    let driver = SqlCipherDriver::new(&StorageConfig::new(dir.path().join("_ionicstorage")));
    Harness { service: StorageService::with_driver(Box::new(driver)), _dir: dir }
}

fn simple(dir: TempDir) -> Harness {
    let store = FileFlatStore::open(dir.path().join("flat.json")).expect("open flat store");
    let driver = FlatStoreDriver::new(Arc::new(store));
    Harness { service: StorageService::with_driver(Box::new(driver)), _dir: dir }
}

fn both() -> Vec<Harness> {
    init_tracing();
    vec![relational(TempDir::new().unwrap()), simple(TempDir::new().unwrap())]
}

/// Validates every accessor fails before `create`.
///
/// Assertions:
/// - Ensures each accessor returns `UninitializedStore` on both backends.
#[tokio::test(flavor = "multi_thread")]
async fn test_operations_require_create() {
    for Harness { service, .. } in both() {
        let uninit = Err::<(), _>(KeyValError::UninitializedStore);

        assert_eq!(service.set("k", "v").await, uninit);
        assert_eq!(service.get("k").await.map(|_| ()), uninit);
        assert_eq!(service.remove("k").await, uninit);
        assert_eq!(service.clear().await, uninit);
        assert_eq!(service.length().await.map(|_| ()), uninit);
        assert_eq!(service.keys().await.map(|_| ()), uninit);
        assert_eq!(service.for_each(|_, _, _| {}).await, uninit);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_is_idempotent() {
    for Harness { service, .. } in both() {
        service.create(SECRET).await.unwrap();
        service.set("kept", "yes").await.unwrap();

        service.create(SECRET).await.unwrap();
        service.create("a different key").await.unwrap();

        assert_eq!(service.get("kept").await.unwrap(), Some(StoredValue::from("yes")));
    }
}

/// Validates a second `create` reuses the open handle.
///
/// Assertions:
/// - Confirms the database file is opened exactly once across three
///   `create` calls, one of them with a different key.
/// - Confirms data written before the repeat calls is still readable.
#[tokio::test(flavor = "multi_thread")]
async fn test_repeat_create_keeps_handle() {
    let dir = TempDir::new().unwrap();
    let driver = SqlCipherDriver::new(&StorageConfig::new(dir.path().join("_ionicstorage")));

    driver.create(SECRET).await.unwrap();
    driver.set("kept", StoredValue::from("yes")).await.unwrap();
    driver.create(SECRET).await.unwrap();
    driver.create("a different key").await.unwrap();

    let metrics = driver.metrics();
    assert_eq!(metrics.opens, 1);
    assert_eq!(metrics.open_failures, 0);
    assert_eq!(driver.get("kept").await.unwrap(), Some(StoredValue::from("yes")));
}

/// Validates the create/set/get scenario.
///
/// Assertions:
/// - Confirms `get("blar")` returns `"test"` on both backends.
#[tokio::test(flavor = "multi_thread")]
async fn test_set_then_get_scenario() {
    for Harness { service, .. } in both() {
        service.create(SECRET).await.unwrap();
        service.set("blar", "test").await.unwrap();
        assert_eq!(service.get("blar").await.unwrap(), Some(StoredValue::from("test")));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_values_round_trip() {
    for Harness { service, .. } in both() {
        service.create(SECRET).await.unwrap();

        for (i, value) in sample_values().into_iter().enumerate() {
            let key = format!("value-{i}");
            service.set(&key, value.clone()).await.unwrap();
            assert_eq!(
                service.get(&key).await.unwrap(),
                Some(StoredValue::from(value)),
                "{:?} backend",
                service.backend()
            );
        }
    }
}

/// Validates floats come back as the exact same `f64`.
///
/// Assertions:
/// - Confirms every sampled float reads back with identical bits on both
///   backends, including ones whose shortest text form needs 17 digits.
#[tokio::test(flavor = "multi_thread")]
async fn test_floats_round_trip_exactly() {
    for Harness { service, .. } in both() {
        service.create(SECRET).await.unwrap();

        for (i, x) in sample_floats(200, 0x5eed).into_iter().enumerate() {
            let key = format!("float-{i}");
            service.set(&key, x).await.unwrap();

            let back = service.get(&key).await.unwrap().and_then(|v| v.as_json().as_f64());
            assert_eq!(
                back.map(f64::to_bits),
                Some(x.to_bits()),
                "{x:e} on {:?} backend",
                service.backend()
            );
        }
    }
}

/// Validates absence and the stored-null distinction.
///
/// Assertions:
/// - Confirms a missing key is `None`.
/// - Confirms a stored null is `Some(null)`.
#[tokio::test(flavor = "multi_thread")]
async fn test_missing_key_is_absent() {
    for Harness { service, .. } in both() {
        service.create(SECRET).await.unwrap();

        assert_eq!(service.get("missing").await.unwrap(), None);

        service.set("nothing", StoredValue::null()).await.unwrap();
        assert_eq!(service.get("nothing").await.unwrap(), Some(StoredValue::null()));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_overwrite_keeps_single_entry() {
    for Harness { service, .. } in both() {
        service.create(SECRET).await.unwrap();
        service.set("k", 1_i64).await.unwrap();
        service.set("k", json!({"v": 2})).await.unwrap();

        assert_eq!(service.get("k").await.unwrap(), Some(StoredValue::from(json!({"v": 2}))));
        assert_eq!(service.keys().await.unwrap(), vec!["k".to_string()]);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_remove_is_idempotent() {
    for Harness { service, .. } in both() {
        service.create(SECRET).await.unwrap();
        service.set("k", "v").await.unwrap();

        service.remove("k").await.unwrap();
        service.remove("k").await.unwrap();
        service.remove("never-existed").await.unwrap();

        assert_eq!(service.get("k").await.unwrap(), None);
    }
}

/// Validates `clear` on both backends.
///
/// Assertions:
/// - Confirms `length()` is 0 after clearing.
/// - Confirms `keys()` is empty after clearing.
#[tokio::test(flavor = "multi_thread")]
async fn test_clear_empties_store() {
    for Harness { service, .. } in both() {
        service.create(SECRET).await.unwrap();
        for key in ["a", "b", "c"] {
            service.set(key, key).await.unwrap();
        }

        service.clear().await.unwrap();

        assert_eq!(service.length().await.unwrap(), 0);
        assert!(service.keys().await.unwrap().is_empty());
    }
}

/// Validates the three-key iteration scenario.
///
/// Assertions:
/// - Confirms the visitor runs three times with indices 1, 2, 3.
/// - Confirms visited keys equal `keys()` as a set.
#[tokio::test(flavor = "multi_thread")]
async fn test_for_each_matches_keys() {
    for Harness { service, .. } in both() {
        service.create(SECRET).await.unwrap();
        for key in ["a", "b", "c"] {
            service.set(key, format!("value of {key}")).await.unwrap();
        }

        let mut visited = Vec::new();
        service
            .for_each(|key, value, index| {
                assert_eq!(value.as_str(), Some(format!("value of {key}").as_str()));
                visited.push((key.to_string(), index));
            })
            .await
            .unwrap();

        let indices: Vec<usize> = visited.iter().map(|(_, i)| *i).collect();
        assert_eq!(indices, vec![1, 2, 3]);

        let mut visited_keys: Vec<String> = visited.into_iter().map(|(k, _)| k).collect();
        let mut keys = service.keys().await.unwrap();
        visited_keys.sort();
        keys.sort();
        assert_eq!(visited_keys, keys);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_relational_length_counts_entries() {
    let harness = relational(TempDir::new().unwrap());
    let service = &harness.service;
    service.create(SECRET).await.unwrap();

    service.set("a", 1_i64).await.unwrap();
    service.set("b", 2_i64).await.unwrap();
    service.set("a", 3_i64).await.unwrap();

    assert_eq!(service.length().await.unwrap(), 2);
}

/// Validates the relational store survives a new facade on the same file.
///
/// Assertions:
/// - Confirms a value written by one facade is read by the next.
/// - Confirms the raw file doesn't contain the plaintext value.
#[tokio::test(flavor = "multi_thread")]
async fn test_relational_data_is_durable_and_encrypted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("_ionicstorage");
    let key = random_key();

    {
        let service = StorageService::with_driver(Box::new(SqlCipherDriver::new(
            &StorageConfig::new(path.clone()).without_wal(),
        )));
        service.create(key.expose()).await.unwrap();
        service.set("token", "plaintext-marker").await.unwrap();
    }

    let service =
        StorageService::with_driver(Box::new(SqlCipherDriver::new(&StorageConfig::new(path.clone()))));
    service.create(key.expose()).await.unwrap();
    assert_eq!(service.get("token").await.unwrap(), Some(StoredValue::from("plaintext-marker")));

    let bytes = std::fs::read(&path).unwrap();
    let needle = b"plaintext-marker";
    assert!(!bytes.windows(needle.len()).any(|w| w == needle));
}

/// Validates the wrong-secret path.
///
/// Assertions:
/// - Ensures `create` with another key fails with `DatabaseInit`.
/// - Ensures later accessors fail with `UninitializedStore`.
#[tokio::test(flavor = "multi_thread")]
async fn test_wrong_secret_fails_create() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = StorageConfig::new(dir.path().join("_ionicstorage"));

    {
        let service = StorageService::with_driver(Box::new(SqlCipherDriver::new(&config)));
        service.create("right").await.unwrap();
        service.set("k", "v").await.unwrap();
    }

    let driver = SqlCipherDriver::new(&config);
    let service = StorageService::with_driver(Box::new(driver));

    let err = service.create("wrong").await.unwrap_err();
    assert!(matches!(err, KeyValError::DatabaseInit(_)), "got {err:?}");
    assert!(err.to_string().starts_with("Unable to initialize database: "));

    assert_eq!(service.get("k").await, Err(KeyValError::UninitializedStore));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_simple_backend_shares_host_store() {
    let store = Arc::new(MemoryFlatStore::new());
    store.set_item("theme", "dark").unwrap();

    let service = StorageService::new(
        &StaticCapability(false),
        Box::new(SqlCipherDriver::new(&StorageConfig::default())),
        Box::new(FlatStoreDriver::new(store.clone())),
    );
    assert_eq!(service.backend(), Backend::Simple);
    service.create(SECRET).await.unwrap();

    service.set("blar", "test").await.unwrap();

    // Foreign keys count toward length but never show up as logical keys
    assert_eq!(service.length().await.unwrap(), 2);
    assert_eq!(service.keys().await.unwrap(), vec!["blar".to_string()]);
    assert!(store.get_item("_ionickv__blar").unwrap().is_some());

    service.clear().await.unwrap();
    assert_eq!(store.len().unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_simple_backend_persists_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flat.json");

    {
        let driver = FlatStoreDriver::new(Arc::new(FileFlatStore::open(&path).unwrap()));
        let service = StorageService::with_driver(Box::new(driver));
        service.create(SECRET).await.unwrap();
        service.set_serialized("prefs", &json!({"lang": "en"})).await.unwrap();
    }

    let driver = FlatStoreDriver::new(Arc::new(FileFlatStore::open(&path).unwrap()));
    let service = StorageService::with_driver(Box::new(driver));
    service.create(SECRET).await.unwrap();

    let prefs: Option<serde_json::Value> = service.get_deserialized("prefs").await.unwrap();
    assert_eq!(prefs, Some(json!({"lang": "en"})));
}
