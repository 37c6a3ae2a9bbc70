use crate::event::{
    decode_record_data, FirehoseEvent, FirehoseRecord, FirehoseResponse, TransformResult,
    TransformedRecord,
};
use crate::RuntimeError;

/// Transform a Firehose batch for the warehouse COPY.
///
/// Each record is re-emitted as a single JSON line. Blank records are
/// dropped and records that fail to decode are returned untouched as
/// `ProcessingFailed`, so Firehose can route them to its error output.
#[tracing::instrument(skip(event), fields(records = event.records.len()))]
pub fn transform_records(event: &FirehoseEvent) -> FirehoseResponse {
    tracing::info!("transforming firehose records");

    let records = event.records.iter().map(transform_record).collect::<Vec<_>>();

    let failed = records
        .iter()
        .filter(|r| r.result == TransformResult::ProcessingFailed)
        .count();
    tracing::info!(processed = records.len(), failed, "firehose batch done");

    FirehoseResponse { records }
}

fn transform_record(record: &FirehoseRecord) -> TransformedRecord {
    match reencode(&record.data) {
        Ok(Some(data)) => TransformedRecord {
            record_id: record.record_id.clone(),
            result: TransformResult::Ok,
            data,
        },
        Ok(None) => {
            tracing::info!(record_id = %record.record_id, "empty record, dropping it");
            TransformedRecord {
                record_id: record.record_id.clone(),
                result: TransformResult::Dropped,
                data: record.data.clone(),
            }
        }
        Err(err) => {
            tracing::error!(record_id = %record.record_id, error = %err, "failed to transform record");
            TransformedRecord {
                record_id: record.record_id.clone(),
                result: TransformResult::ProcessingFailed,
                data: record.data.clone(),
            }
        }
    }
}

/// Decode, validate and encode a record again on a single line.
/// Key order and number literals are kept as received.
/// `None` means the record carries no data.
fn reencode(data: &str) -> Result<Option<String>, RuntimeError> {
    let text = decode_record_data(data)?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_str(text)?;
    let mut line = serde_json::to_string(&value)?;
    line.push('\n');

    Ok(Some(base64::encode(line)))
}
