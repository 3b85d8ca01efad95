//! Lambda runtime adapters.
//!
//! The handler context is built once per cold start and shared by every
//! invocation the runtime delivers.

use crate::extract::Extractor;
use crate::logs::LogSummaryWriter;
use crate::response::InvocationResponse;
use chrono::Utc;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use rds_sync_storage::ObjectStore;
use std::sync::Arc;
use tracing::info;

/// Serve extraction invocations. The event payload is ignored.
pub async fn run_extract<S>(extractor: Extractor<S>) -> Result<(), Error>
where
    S: ObjectStore + Clone + 'static,
{
    let extractor = Arc::new(extractor);
    run(service_fn(move |event: LambdaEvent<serde_json::Value>| {
        let extractor = Arc::clone(&extractor);
        async move {
            info!("Extraction invoked (request {})", event.context.request_id);
            let response: InvocationResponse = extractor.invoke(Utc::now().naive_utc()).await;
            Ok::<_, Error>(response)
        }
    }))
    .await
}

/// Serve CloudWatch Logs subscription invocations.
pub async fn run_parse_logs<S>(writer: LogSummaryWriter<S>) -> Result<(), Error>
where
    S: ObjectStore + 'static,
{
    let writer = Arc::new(writer);
    run(service_fn(move |event: LambdaEvent<serde_json::Value>| {
        let writer = Arc::clone(&writer);
        async move {
            info!("Log summary invoked (request {})", event.context.request_id);
            let response = writer.handle_raw_event(event.payload, Utc::now()).await;
            Ok::<_, Error>(response)
        }
    }))
    .await
}
