use crate::{
    config::Config,
    envelope::{CopyJobRow, Source, WebhookEnvelope},
    error::RuntimeError,
    event::{ApiGatewayEvent, ApiGatewayResponse},
    firehose::FirehoseClient,
    normalize::{pretty_raw, Normalized, Normalizer, Notice},
    s3::S3Client,
    sns::Notifier,
};
use chrono::{DateTime, Utc};
use serde_json::{json, value::RawValue, Value};

/// `WebhookProcessor` ingests webhooks received through API Gateway.
///
/// The clients are created once per cold start and shared by every invocation.
pub struct WebhookProcessor {
    source: Source,
    environment: String,
    normalizer: Normalizer,
    archive: S3Client,
    firehose: Option<FirehoseClient>,
    notifier: Notifier,
}

impl WebhookProcessor {
    /// Build the processor and its AWS clients.
    pub fn new(sdk_config: &aws_types::SdkConfig, config: &Config) -> WebhookProcessor {
        WebhookProcessor {
            source: config.source.clone(),
            environment: config.environment.clone(),
            normalizer: Normalizer::default(),
            archive: S3Client::new(sdk_config, &config.raw_bucket),
            firehose: config
                .firehose_stream
                .as_deref()
                .map(|stream| FirehoseClient::new(sdk_config, stream)),
            notifier: Notifier::new(sdk_config, config.alert_topic_arn.as_deref()),
        }
    }

    /// Process one webhook and build the HTTP answer.
    /// Failures are reported to the caller as a 500, never as a Lambda error.
    #[tracing::instrument(skip(self, event))]
    pub async fn process(
        &self,
        request_id: &str,
        event: &ApiGatewayEvent,
        received_at: DateTime<Utc>,
    ) -> ApiGatewayResponse {
        match self.ingest(request_id, event, received_at).await {
            Ok(()) => ApiGatewayResponse::json(
                200,
                &json!({
                    "status": "success",
                    "message": "Webhook received and processed",
                    "request_id": request_id,
                }),
            ),
            Err(err) => {
                tracing::error!(error = %err, "failed to process webhook");
                ApiGatewayResponse::json(
                    500,
                    &json!({
                        "status": "error",
                        "message": err.to_string(),
                    }),
                )
            }
        }
    }

    async fn ingest(
        &self,
        request_id: &str,
        event: &ApiGatewayEvent,
        received_at: DateTime<Utc>,
    ) -> Result<(), RuntimeError> {
        let body = event.body_text()?;
        let payload: Box<RawValue> = serde_json::from_str(&body)?;
        let envelope = WebhookEnvelope::new(
            received_at,
            &self.source,
            request_id,
            &self.environment,
            payload,
        );

        if self.source.is_flattened() {
            self.load_flattened(&envelope, received_at).await?;
        } else {
            self.archive_raw(&envelope, received_at).await;
            let payload = serde_json::from_str::<Value>(envelope.payload().get()).ok();
            let action = payload
                .as_ref()
                .and_then(|p| p.get("action"))
                .and_then(Value::as_str);
            tracing::info!(source = %self.source, action = action.unwrap_or_default(), "webhook received");
        }

        if let Some(firehose) = &self.firehose {
            if let Err(err) = firehose.put_envelope(&envelope).await {
                tracing::error!(error = %err, "failed to forward webhook to firehose");
            }
        }

        Ok(())
    }

    async fn load_flattened(
        &self,
        envelope: &WebhookEnvelope,
        received_at: DateTime<Utc>,
    ) -> Result<(), RuntimeError> {
        let Normalized { record, notices } = self.normalizer.normalize_raw(envelope.payload());
        self.notifier.deliver(&notices).await;

        let s3_raw_location = self.archive_raw(envelope, received_at).await;
        let row = CopyJobRow {
            envelope,
            record: &record,
            s3_raw_location,
        };

        if let Err(err) = self
            .archive
            .put_copy_job_row(received_at, envelope.request_id(), &row)
            .await
        {
            let notice = Notice::ProcessingError {
                source: self.source.display_name().to_string(),
                error: err.to_string(),
                payload: pretty_raw(envelope.payload()),
            };
            self.notifier.deliver(&[notice]).await;
            return Err(err);
        }

        tracing::info!(
            alert_type = ?record.get("alert_type"),
            device = ?record.get("device_name"),
            "webhook loaded"
        );
        Ok(())
    }

    /// Archive the raw payload. A failed archive doesn't stop the ingestion.
    async fn archive_raw(
        &self,
        envelope: &WebhookEnvelope,
        received_at: DateTime<Utc>,
    ) -> Option<String> {
        match self
            .archive
            .put_raw_payload(received_at, envelope.request_id(), envelope.payload())
            .await
        {
            Ok(location) => Some(location),
            Err(err) => {
                tracing::error!(error = %err, bucket = self.archive.bucket(), "failed to archive raw payload");
                None
            }
        }
    }
}
