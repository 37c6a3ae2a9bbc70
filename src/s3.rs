use crate::{envelope::CopyJobRow, error::RuntimeError};
use aws_sdk_s3::{types::ByteStream, Client, Error};
use chrono::{DateTime, Utc};
use serde_json::value::RawValue;

/// S3 client writing raw archives and COPY job files to a single bucket.
pub struct S3Client {
    inner: Client,
    bucket: String,
}

impl S3Client {
    /// Initialize the S3 client.
    #[tracing::instrument(skip(config))]
    pub fn new(config: &aws_types::SdkConfig, bucket: &str) -> S3Client {
        tracing::info!("Initializing S3 client");
        S3Client {
            inner: Client::new(config),
            bucket: bucket.into(),
        }
    }

    /// Wrap an existing client.
    pub fn from_client(inner: Client, bucket: &str) -> S3Client {
        S3Client {
            inner,
            bucket: bucket.into(),
        }
    }

    /// Bucket objects are written to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Archive the payload exactly as received.
    /// Returns the `s3://` location of the archive.
    #[tracing::instrument(skip(self, payload))]
    pub async fn put_raw_payload(
        &self,
        received_at: DateTime<Utc>,
        request_id: &str,
        payload: &RawValue,
    ) -> Result<String, RuntimeError> {
        let key = raw_key(received_at, request_id);
        self.put_json(&key, payload.get().as_bytes().to_vec()).await
    }

    /// Write the COPY job line under its hourly partition.
    /// Returns the `s3://` location of the file.
    #[tracing::instrument(skip(self, row))]
    pub async fn put_copy_job_row(
        &self,
        received_at: DateTime<Utc>,
        request_id: &str,
        row: &CopyJobRow<'_>,
    ) -> Result<String, RuntimeError> {
        let key = copy_job_key(received_at, request_id);
        let body = row.to_line()?;
        self.put_json(&key, body.into_bytes()).await
    }

    async fn put_json(&self, key: &str, body: Vec<u8>) -> Result<String, RuntimeError> {
        self.inner
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type("application/json")
            .send()
            .await
            .map_err(Error::from)?;

        let location = format!("s3://{}/{}", self.bucket, key);
        tracing::info!(%location, "object written");
        Ok(location)
    }
}

/// Key of the raw archive of a webhook.
pub fn raw_key(received_at: DateTime<Utc>, request_id: &str) -> String {
    format!(
        "raw/{}-{}.json",
        received_at.format("%Y-%m-%d-%H-%M-%S"),
        request_id
    )
}

/// Key of the COPY job file of a webhook, partitioned by date and hour.
pub fn copy_job_key(received_at: DateTime<Utc>, request_id: &str) -> String {
    format!(
        "copy-job/{}/{}.json",
        received_at.format("%Y/%m/%d/%H"),
        request_id
    )
}
