//! Integration tests for selecting changed rows from a real MySQL server.
//!
//! These start a Docker container and are ignored by default:
//! `cargo test -p rds-sync-mysql-source -- --ignored`

use anyhow::Result;
use chrono::NaiveDateTime;
use rds_sync_mysql_source::testing::MySQLContainer;
use rds_sync_mysql_source::MySQLChangeSource;
use std::time::Duration;
use sync_core::{CellValue, ChangeFilter, ChangeSource, RetryPolicy, TableDescriptor};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Test port that doesn't conflict with standard MySQL port
const TEST_PORT: u16 = 13310;

fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn ids(batch: &sync_core::Batch) -> Vec<CellValue> {
    batch.rows().iter().map(|row| row[0].clone()).collect()
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_select_changes_after_watermark() -> Result<()> {
    init_logging();

    let container = MySQLContainer::new("rds-sync-select-changes", TEST_PORT);
    container.start()?;
    container.wait_until_ready(Duration::from_secs(90)).await?;

    container
        .execute(&[
            "CREATE TABLE location (
                id INT PRIMARY KEY,
                name VARCHAR(64),
                createdDate DATETIME NOT NULL,
                modifiedDate DATETIME NULL
            )",
            "INSERT INTO location VALUES
                (1, 'old',             '2024-01-01 00:00:00', NULL),
                (2, 'created later',   '2024-01-03 00:00:00', NULL),
                (3, 'modified later',  '2023-06-01 00:00:00', '2024-01-04 00:00:00'),
                (4, 'modified earlier','2024-01-05 00:00:00', '2024-01-01 12:00:00'),
                (5, 'at watermark',    '2024-01-02 00:00:00', NULL)",
        ])
        .await?;

    let mut source =
        MySQLChangeSource::connect(&container.connection_opts(), RetryPolicy::default()).await?;
    let table = TableDescriptor::new("location");

    let batch = source
        .select_changes(&table, &ChangeFilter::after(dt("2024-01-02 00:00:00")))
        .await?;
    // strictly after, ordered by effective change time
    assert_eq!(ids(&batch), vec![CellValue::Int(2), CellValue::Int(3)]);
    assert_eq!(
        batch.columns(),
        ["id", "name", "createdDate", "modifiedDate"]
    );
    assert_eq!(
        batch.max_effective_change_time(&table)?,
        Some(dt("2024-01-04 00:00:00"))
    );

    let everything = source
        .select_changes(&table, &ChangeFilter::after(dt("1970-01-01 00:00:00")))
        .await?;
    assert_eq!(everything.len(), 5);

    let nothing = source
        .select_changes(&table, &ChangeFilter::after(dt("2030-01-01 00:00:00")))
        .await?;
    assert!(nothing.is_empty());

    source.close().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_wrong_password_is_access_denied() -> Result<()> {
    init_logging();

    let container = MySQLContainer::new("rds-sync-access-denied", TEST_PORT + 1);
    container.start()?;
    container.wait_until_ready(Duration::from_secs(90)).await?;

    let mut opts = container.connection_opts();
    opts.password = "wrong".to_string();

    let result = MySQLChangeSource::connect(&opts, RetryPolicy::default()).await;
    assert!(matches!(
        result,
        Err(rds_sync_mysql_source::SourceError::AccessDenied { .. })
    ));
    Ok(())
}
