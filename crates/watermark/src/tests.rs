//! Unit tests for the watermark crate.

use chrono::NaiveDateTime;
use rds_sync_storage::{MemoryStore, StorageErrorKind};

use crate::{watermark_key, ObjectWatermarkStore, Watermark, WatermarkRead, WatermarkStore};

const BUCKET: &str = "extract-bucket";

fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").unwrap()
}

// ============================================================================
// Text format
// ============================================================================

#[test]
fn test_epoch_default() {
    assert_eq!(Watermark::epoch().to_string(), "1970-01-01 00:00:00");
    assert_eq!(Watermark::default(), Watermark::epoch());
}

#[test]
fn test_whole_second_format() {
    let w = Watermark::new(dt("2024-06-01 12:30:45"));
    assert_eq!(w.to_string(), "2024-06-01 12:30:45");
    assert_eq!("2024-06-01 12:30:45".parse::<Watermark>().unwrap(), w);
}

#[test]
fn test_sub_second_precision_is_kept() {
    let w = Watermark::new(dt("2024-06-01 12:30:45.123456"));
    assert_eq!(w.to_string(), "2024-06-01 12:30:45.123456");
    assert_eq!(w.to_string().parse::<Watermark>().unwrap(), w);
}

#[test]
fn test_parse_tolerates_whitespace_and_iso_separator() {
    assert_eq!(
        "2024-06-01 12:30:45\n".parse::<Watermark>().unwrap(),
        Watermark::new(dt("2024-06-01 12:30:45"))
    );
    assert_eq!(
        "2024-06-01T12:30:45".parse::<Watermark>().unwrap(),
        Watermark::new(dt("2024-06-01 12:30:45"))
    );
}

#[test]
fn test_parse_rejects_garbage() {
    let err = "not a time".parse::<Watermark>().unwrap_err();
    assert_eq!(err.0, "not a time");
}

#[test]
fn test_ordering_follows_time() {
    assert!(Watermark::new(dt("2024-01-01 00:00:01")) > Watermark::new(dt("2024-01-01 00:00:00")));
    assert!(Watermark::epoch() < Watermark::new(dt("2000-01-01 00:00:00")));
}

#[test]
fn test_watermark_key() {
    assert_eq!(watermark_key("location"), "location/csv/last_extract.txt");
}

// ============================================================================
// ObjectWatermarkStore
// ============================================================================

#[tokio::test]
async fn test_put_then_get() {
    let memory = MemoryStore::with_bucket(BUCKET);
    let store = ObjectWatermarkStore::new(memory.clone(), BUCKET);
    let w = Watermark::new(dt("2024-02-03 04:05:06"));

    store.put("customer", &w).await.unwrap();

    assert_eq!(
        memory
            .object_string(BUCKET, "customer/csv/last_extract.txt")
            .as_deref(),
        Some("2024-02-03 04:05:06")
    );
    assert_eq!(store.read("customer").await, WatermarkRead::Found(w));
    assert_eq!(store.get("customer").await, w);
}

#[tokio::test]
async fn test_missing_watermark_defaults_to_epoch() {
    let store = ObjectWatermarkStore::new(MemoryStore::with_bucket(BUCKET), BUCKET);
    assert_eq!(store.read("location").await, WatermarkRead::Missing);
    assert_eq!(store.get("location").await, Watermark::epoch());
}

#[tokio::test]
async fn test_missing_bucket_defaults_to_epoch() {
    let store = ObjectWatermarkStore::new(MemoryStore::new(), BUCKET);
    assert_eq!(store.read("location").await, WatermarkRead::BucketMissing);
    assert_eq!(store.get("location").await, Watermark::epoch());
}

#[tokio::test]
async fn test_unreachable_store_defaults_to_epoch() {
    let memory = MemoryStore::with_bucket(BUCKET);
    memory.insert(BUCKET, &watermark_key("location"), "2024-01-01 00:00:00");
    memory.fail_gets(StorageErrorKind::Transient);
    let store = ObjectWatermarkStore::new(memory, BUCKET);

    assert!(matches!(
        store.read("location").await,
        WatermarkRead::Unavailable(_)
    ));
    assert_eq!(store.get("location").await, Watermark::epoch());
}

#[tokio::test]
async fn test_corrupt_blob_defaults_to_epoch() {
    let memory = MemoryStore::with_bucket(BUCKET);
    memory.insert(BUCKET, &watermark_key("location"), "yesterday-ish\n");
    let store = ObjectWatermarkStore::new(memory, BUCKET);

    assert_eq!(
        store.read("location").await,
        WatermarkRead::Corrupt("yesterday-ish".to_string())
    );
    assert_eq!(store.get("location").await, Watermark::epoch());
}

#[tokio::test]
async fn test_write_failure_is_reported() {
    let memory = MemoryStore::with_bucket(BUCKET);
    memory.fail_puts(StorageErrorKind::AccessDenied);
    let store = ObjectWatermarkStore::new(memory.clone(), BUCKET);

    let err = store
        .put("location", &Watermark::new(dt("2024-01-01 00:00:00")))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("access denied"));
    assert_eq!(memory.object(BUCKET, &watermark_key("location")), None);
}

#[tokio::test]
async fn test_tables_are_independent() {
    let memory = MemoryStore::with_bucket(BUCKET);
    let store = ObjectWatermarkStore::new(memory, BUCKET);
    let w = Watermark::new(dt("2024-05-05 05:05:05"));

    store.put("location", &w).await.unwrap();

    assert_eq!(store.get("location").await, w);
    assert_eq!(store.get("customer").await, Watermark::epoch());
}
