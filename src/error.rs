use thiserror::Error as ThisError;

/// Different errors that the application can raise
#[derive(Debug, ThisError)]
pub enum RuntimeError {
    /// Error returned when the webhook body is not valid JSON
    #[error("invalid webhook body: {0}")]
    InvalidBody(#[from] serde_json::Error),
    /// Error returned when base64 data cannot be decoded
    #[error("invalid base64 data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    /// Error returned when decoded bytes are not valid UTF-8
    #[error("invalid utf-8 data")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// Error returned by the S3 API
    #[error("unexpected s3 error")]
    S3(#[from] aws_sdk_s3::Error),
    /// Error returned by the SNS API
    #[error("unexpected sns error")]
    Sns(#[from] aws_sdk_sns::Error),
    /// Error returned by the Firehose API
    #[error("unexpected firehose error")]
    Firehose(#[from] aws_sdk_firehose::Error),
}
