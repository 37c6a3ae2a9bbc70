#![deny(missing_docs)]
//! <fullname>Webhook ingest</fullname>
//!
//! Lambda function that receives webhooks from API Gateway,
//! flattens alert payloads for the warehouse and stores them in S3
//! for the COPY job. The same function transforms the records
//! Firehose delivers to the warehouse.
use chrono::Utc;
use lambda_runtime::LambdaEvent;

mod config;
pub use config::Config;

mod envelope;
pub use envelope::{CopyJobRow, Source, WebhookEnvelope};

mod error;
pub use error::RuntimeError;

mod event;
pub use event::*;

/// `firehose` forwards envelopes to a delivery stream
pub mod firehose;

mod normalize;
pub use normalize::{ColumnValue, FlattenedAlertRecord, Normalized, Normalizer, Notice};

/// `s3` writes raw archives and COPY job files
pub mod s3;

/// `schema` declares how alert payloads map to warehouse columns
pub mod schema;

/// `sns` delivers notices to the alerting topic
pub mod sns;

mod transform;
pub use transform::transform_records;

mod webhook;
pub use webhook::WebhookProcessor;

#[cfg(test)]
mod test_util;

/// `handle_event` is the Lambda function entry point.
/// Firehose batches are transformed, anything else is
/// processed as an API Gateway webhook.
#[tracing::instrument(skip(processor, event))]
pub async fn handle_event(
    processor: &WebhookProcessor,
    event: LambdaEvent<IncomingEvent>,
) -> Result<OutgoingResponse, RuntimeError> {
    let request_id = match event.context.request_id.as_str() {
        "" => uuid::Uuid::new_v4().to_string(),
        id => id.to_string(),
    };

    let response = match event.payload {
        IncomingEvent::Firehose(batch) => OutgoingResponse::Firehose(transform_records(&batch)),
        IncomingEvent::ApiGateway(request) => {
            OutgoingResponse::ApiGateway(processor.process(&request_id, &request, Utc::now()).await)
        }
    };

    Ok(response)
}
