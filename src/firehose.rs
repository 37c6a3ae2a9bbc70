use crate::{envelope::WebhookEnvelope, error::RuntimeError};
use aws_sdk_firehose::{model::Record, types::Blob, Client, Error};

/// Firehose client forwarding envelopes to a delivery stream.
pub struct FirehoseClient {
    inner: Client,
    stream: String,
}

impl FirehoseClient {
    /// Initialize the Firehose client.
    #[tracing::instrument(skip(config))]
    pub fn new(config: &aws_types::SdkConfig, stream: &str) -> FirehoseClient {
        tracing::info!("Initializing Firehose client");
        FirehoseClient {
            inner: Client::new(config),
            stream: stream.into(),
        }
    }

    /// Send the envelope to the stream as a single JSON line.
    #[tracing::instrument(skip(self, envelope), fields(stream = %self.stream))]
    pub async fn put_envelope(&self, envelope: &WebhookEnvelope) -> Result<(), RuntimeError> {
        let mut line = serde_json::to_string(envelope)?;
        line.push('\n');

        let record = Record::builder().data(Blob::new(line.into_bytes())).build();
        self.inner
            .put_record()
            .delivery_stream_name(&self.stream)
            .record(record)
            .send()
            .await
            .map_err(Error::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{envelope::Source, test_util::*};
    use aws_sdk_firehose::{Client, Config};
    use aws_smithy_client::{erase::DynConnector, test_connection::TestConnection};
    use aws_smithy_http::body::SdkBody;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, value::RawValue};

    #[tokio::test]
    async fn test_put_envelope() -> Result<(), RuntimeError> {
        let payload = r#"{"zeta": "ping", "alpha": 123456789012345678901234567890}"#;
        let envelope = WebhookEnvelope::new(
            Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap(),
            &Source::Greenhouse,
            "request-1",
            "production",
            RawValue::from_string(payload.into()).unwrap(),
        );
        let line = format!("{}\n", serde_json::to_string(&envelope).unwrap());
        assert!(line.ends_with(&format!("\"payload\":{payload}}}\n")));
        let expected = json!({
            "DeliveryStreamName": "webhooks",
            "Record": {"Data": base64::encode(line)}
        });

        let conn = TestConnection::new(vec![(
            get_request_builder("firehose")
                .header("content-type", "application/x-amz-json-1.1")
                .header("x-amz-target", "Firehose_20150804.PutRecord")
                .body(SdkBody::from(expected.to_string()))
                .unwrap(),
            http::Response::builder()
                .status(200)
                .body(SdkBody::from(r#"{"RecordId": "record-1", "Encrypted": false}"#))
                .unwrap(),
        )]);
        let config = Config::new(&get_mock_config().await);
        let inner = Client::from_conf_conn(config, DynConnector::new(conn.clone()));

        let client = FirehoseClient {
            inner,
            stream: "webhooks".into(),
        };

        client.put_envelope(&envelope).await?;
        conn.assert_requests_match(&vec![]);

        Ok(())
    }
}
