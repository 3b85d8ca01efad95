//! MySQL change source
//!
//! One connection is taken from the pool when the source is created and
//! reused for every table of the run. A transient failure drops that
//! connection, and the next attempt takes a fresh one from the pool.

use crate::client::{new_mysql_pool, ConnectionOpts};
use crate::error::SourceError;
use crate::reverse::cell_from_mysql;
use crate::selector::{build_select, SelectStatement};
use anyhow::Result;
use async_trait::async_trait;
use mysql_async::{prelude::*, Conn, Pool, Row, Value};
use sync_core::{
    retry_with_backoff, Batch, ChangeFilter, ChangeSource, RetryPolicy, Retryable,
    TableDescriptor,
};
use tracing::{debug, info, warn};

/// Change source reading from a MySQL database.
pub struct MySQLChangeSource {
    pool: Pool,
    conn: Option<Conn>,
    target: String,
    retry: RetryPolicy,
}

impl MySQLChangeSource {
    /// Create a pool and acquire the connection used for the whole run.
    ///
    /// Transient connection failures are retried; rejected credentials and
    /// unknown databases fail immediately.
    pub async fn connect(opts: &ConnectionOpts, retry: RetryPolicy) -> Result<Self, SourceError> {
        let pool = new_mysql_pool(opts);
        let target = opts.describe();

        let pool_ref = &pool;
        let target_ref = target.as_str();
        let conn = retry_with_backoff(
            &retry,
            "MySQL connect",
            move || async move {
                pool_ref
                    .get_conn()
                    .await
                    .map_err(|e| SourceError::connect(target_ref, e))
            },
            SourceError::Timeout,
        )
        .await;

        let conn = match conn {
            Ok(conn) => conn,
            Err(e) => {
                // release whatever the pool opened before reporting
                if let Err(disconnect_err) = pool.disconnect().await {
                    debug!("Failed to disconnect pool after connect error: {disconnect_err}");
                }
                return Err(e);
            }
        };

        info!("Connected to {target}");
        Ok(Self {
            pool,
            conn: Some(conn),
            target,
            retry,
        })
    }

    /// Build a source from an already-configured pool.
    pub fn from_pool(pool: Pool, target: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            pool,
            conn: None,
            target: target.into(),
            retry,
        }
    }

    /// Release the connection and shut the pool down.
    pub async fn close(mut self) -> Result<()> {
        drop(self.conn.take());
        self.pool.disconnect().await?;
        debug!("Disconnected from {}", self.target);
        Ok(())
    }

    async fn try_select(
        &mut self,
        table: &TableDescriptor,
        stmt: &SelectStatement,
    ) -> Result<Batch, SourceError> {
        let mut conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                match tokio::time::timeout(self.retry.operation_timeout, self.pool.get_conn())
                    .await
                {
                    Ok(conn) => conn.map_err(|e| SourceError::connect(&self.target, e))?,
                    Err(_) => return Err(SourceError::Timeout(self.retry.operation_timeout)),
                }
            }
        };

        let rows: Vec<Row> = match tokio::time::timeout(
            self.retry.operation_timeout,
            conn.exec(stmt.sql.as_str(), stmt.params.clone()),
        )
        .await
        {
            Ok(Ok(rows)) => rows,
            // the connection is dropped along with the failed call
            Ok(Err(e)) => return Err(SourceError::query(&table.name, e)),
            Err(_) => return Err(SourceError::Timeout(self.retry.operation_timeout)),
        };
        self.conn = Some(conn);

        rows_to_batch(table, rows)
    }
}

#[async_trait]
impl ChangeSource for MySQLChangeSource {
    fn source_type(&self) -> &'static str {
        "mysql"
    }

    async fn select_changes(
        &mut self,
        table: &TableDescriptor,
        filter: &ChangeFilter,
    ) -> Result<Batch> {
        let stmt = build_select(table, filter.watermark())?;
        debug!("Selecting changes from '{}': {}", table.name, stmt.sql);

        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.try_select(table, &stmt).await {
                Ok(batch) => {
                    info!(
                        "Selected {} changed rows from '{}' after {}",
                        batch.len(),
                        table.name,
                        filter.watermark()
                    );
                    return Ok(batch);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        "Selecting from '{}' failed (attempt {attempt}/{max_attempts}): {e}. Retrying in {delay:?}...",
                        table.name
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Convert result rows into a batch, keeping the server's column order.
fn rows_to_batch(table: &TableDescriptor, rows: Vec<Row>) -> Result<Batch, SourceError> {
    let Some(first) = rows.first() else {
        return Ok(Batch::default());
    };

    let columns = first.columns_ref();
    let names: Vec<String> = columns.iter().map(|c| c.name_str().into_owned()).collect();
    let types: Vec<_> = columns
        .iter()
        .map(|c| (c.column_type(), c.flags()))
        .collect();

    let mut batch = Batch::new(names.clone());
    for mut row in rows {
        let mut cells = Vec::with_capacity(types.len());
        for (i, (column_type, flags)) in types.iter().enumerate() {
            let value: Value = row.take(i).unwrap_or(Value::NULL);
            let cell = cell_from_mysql(value, *column_type, *flags).map_err(|source| {
                SourceError::Conversion {
                    table: table.name.clone(),
                    column: names[i].clone(),
                    source,
                }
            })?;
            cells.push(cell);
        }
        batch.push_row(cells)?;
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_reconnect_is_bounded_by_operation_timeout() {
        // accepts connections but never sends the server greeting
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let opts = ConnectionOpts {
            host: "127.0.0.1".to_string(),
            port,
            database: "food_test_db".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
        };
        let retry = RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::from_millis(1),
            operation_timeout: Duration::from_millis(200),
        };
        let mut source = MySQLChangeSource::from_pool(new_mysql_pool(&opts), opts.describe(), retry);

        let started = std::time::Instant::now();
        let err = source
            .select_changes(
                &TableDescriptor::new("location"),
                &ChangeFilter::after(chrono::NaiveDateTime::default()),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::Timeout(_))
        ));
        assert!(started.elapsed() < Duration::from_secs(10));

        server.abort();
    }
}
