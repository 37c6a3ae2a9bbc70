use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// `IncomingEvent` is any event the function can be invoked with.
/// Firehose transformation events carry `records`, anything else
/// is treated as an API Gateway proxy request.
#[derive(Clone, Debug, PartialEq)]
pub enum IncomingEvent {
    /// Kinesis Firehose data transformation
    Firehose(FirehoseEvent),
    /// API Gateway proxy integration
    ApiGateway(ApiGatewayEvent),
}

impl<'de> Deserialize<'de> for IncomingEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;

        // a malformed batch is an error, never a webhook
        if value.get("records").is_some() {
            return FirehoseEvent::deserialize(value)
                .map(IncomingEvent::Firehose)
                .map_err(|err| D::Error::custom(format!("invalid firehose event: {err}")));
        }

        ApiGatewayEvent::deserialize(value)
            .map(IncomingEvent::ApiGateway)
            .map_err(D::Error::custom)
    }
}

/// `ApiGatewayEvent` is the subset of the proxy request the function reads
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayEvent {
    /// Raw request body, absent for empty requests
    #[serde(default)]
    pub body: Option<String>,
    /// Whether `body` is base64 encoded
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ApiGatewayEvent {
    /// Request body as text. Missing or empty bodies read as `{}`.
    pub fn body_text(&self) -> Result<String, crate::RuntimeError> {
        let body = match self.body.as_deref() {
            None | Some("") => return Ok("{}".to_string()),
            Some(body) => body,
        };

        if self.is_base64_encoded {
            let bytes = base64::decode(body)?;
            return Ok(String::from_utf8(bytes)?);
        }
        Ok(body.to_string())
    }
}

/// `ApiGatewayResponse` is the proxy integration response
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayResponse {
    /// HTTP status code
    pub status_code: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// JSON encoded body
    pub body: String,
}

impl ApiGatewayResponse {
    /// JSON response with the given status.
    pub fn json(status_code: u16, body: &serde_json::Value) -> ApiGatewayResponse {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        ApiGatewayResponse {
            status_code,
            headers,
            body: body.to_string(),
        }
    }
}

/// `FirehoseEvent` is a batch of records to transform
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FirehoseEvent {
    /// Records in delivery order
    pub records: Vec<FirehoseRecord>,
}

/// `FirehoseRecord` is a single record of a transformation batch
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FirehoseRecord {
    /// Record id, echoed back in the response
    pub record_id: String,
    /// Base64 encoded record data
    #[serde(default)]
    pub data: String,
}

/// `FirehoseResponse` is the transformed batch returned to Firehose
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FirehoseResponse {
    /// One entry per input record, same order
    pub records: Vec<TransformedRecord>,
}

/// `TransformedRecord` is the outcome for one record
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedRecord {
    /// Id of the input record
    pub record_id: String,
    /// Transformation result
    pub result: TransformResult,
    /// Base64 encoded output data (the input data unless `Ok`)
    pub data: String,
}

/// Result values understood by Firehose
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TransformResult {
    /// Record was transformed
    Ok,
    /// Record is intentionally discarded
    Dropped,
    /// Record could not be transformed and is routed to the error output
    ProcessingFailed,
}

/// `OutgoingResponse` is whatever the function answers with
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutgoingResponse {
    /// Answer to a Firehose transformation
    Firehose(FirehoseResponse),
    /// Answer to an API Gateway request
    ApiGateway(ApiGatewayResponse),
}

/// Decode Firehose record data: base64, then gzip when the bytes
/// are compressed, falling back to UTF-8 and finally Latin-1.
pub fn decode_record_data(data: &str) -> Result<String, base64::DecodeError> {
    let bytes = base64::decode(data)?;
    Ok(decompress(&bytes))
}

fn decompress(bytes: &[u8]) -> String {
    use std::io::Read;

    let mut text = String::new();
    if flate2::read::GzDecoder::new(bytes)
        .read_to_string(&mut text)
        .is_ok()
    {
        return text;
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
