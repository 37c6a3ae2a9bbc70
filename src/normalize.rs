use crate::schema::{AlertSchema, ColumnKind, FieldPath, PAYLOAD_COLUMN};
use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::{value::RawValue, Map, Value};

/// Scalar value of a populated column.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    /// Text column, also used for JSON-encoded tag lists
    Text(String),
    /// Integer column
    Integer(i64),
    /// Floating point column
    Float(f64),
    /// Boolean column
    Boolean(bool),
}

/// `FlattenedAlertRecord` is the relational projection of one alert payload.
///
/// Every declared column is present, in schema order, and may be null.
/// The passthrough column is never null.
#[derive(Clone, Debug, PartialEq)]
pub struct FlattenedAlertRecord {
    columns: Vec<(&'static str, Option<ColumnValue>)>,
    payload_json: String,
}

impl FlattenedAlertRecord {
    /// Value of a column, `None` when null or not declared.
    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .and_then(|(_, value)| value.as_ref())
    }

    /// Declared columns and their values, in schema order.
    pub fn columns(&self) -> impl Iterator<Item = (&'static str, Option<&ColumnValue>)> + '_ {
        self.columns.iter().map(|(name, value)| (*name, value.as_ref()))
    }

    /// The whole inbound payload as a JSON string.
    pub fn payload_json(&self) -> &str {
        &self.payload_json
    }

    pub(crate) fn serialize_entries<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry(PAYLOAD_COLUMN, &self.payload_json)
    }
}

impl Serialize for FlattenedAlertRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len() + 1))?;
        self.serialize_entries(&mut map)?;
        map.end()
    }
}

/// Diagnostic raised while ingesting a webhook, delivered out of band.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    /// The payload matches none of the recognized shapes
    UnknownSchema {
        /// Pretty-printed payload
        payload: String,
    },
    /// The webhook could not be processed
    ProcessingError {
        /// Display name of the failing webhook's source
        source: String,
        /// Error description
        error: String,
        /// Pretty-printed payload
        payload: String,
    },
}

impl Notice {
    /// Short subject line for the alerting channel.
    pub fn subject(&self) -> String {
        match self {
            Notice::UnknownSchema { .. } => "Meraki Webhook: Unknown Schema Detected".into(),
            Notice::ProcessingError { source, .. } => format!("{source}: Processing Error"),
        }
    }

    /// Free-text body, including the offending payload.
    pub fn message(&self) -> String {
        match self {
            Notice::UnknownSchema { payload } => {
                format!("Unknown schema detected:\n\n{payload}")
            }
            Notice::ProcessingError { error, payload, .. } => {
                format!("Error: {error}\n\nPayload: {payload}")
            }
        }
    }
}

/// Output of a normalization: the record and any diagnostics it raised.
#[derive(Clone, Debug, PartialEq)]
pub struct Normalized {
    /// Flattened projection of the payload
    pub record: FlattenedAlertRecord,
    /// Zero or more notices for the caller to deliver
    pub notices: Vec<Notice>,
}

/// `Normalizer` flattens alert webhook payloads following an `AlertSchema`.
#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    schema: AlertSchema,
}

impl Normalizer {
    /// Create a normalizer for the given schema.
    pub fn new(schema: AlertSchema) -> Normalizer {
        Normalizer { schema }
    }

    /// Schema used by this normalizer.
    pub fn schema(&self) -> &AlertSchema {
        &self.schema
    }

    /// Flatten a payload. This never fails: missing or mistyped
    /// fields become null, and an unrecognized payload adds an
    /// `UnknownSchema` notice.
    pub fn normalize(&self, payload: &Value) -> Normalized {
        self.flatten(payload, payload.to_string())
    }

    /// Flatten a payload received as JSON text. The text is kept
    /// unchanged in the passthrough column.
    pub fn normalize_raw(&self, payload: &RawValue) -> Normalized {
        // raw values are valid JSON, this only fails past the nesting limit
        let value = serde_json::from_str(payload.get()).unwrap_or(Value::Null);
        self.flatten(&value, payload.get().to_string())
    }

    fn flatten(&self, payload: &Value, payload_json: String) -> Normalized {
        let mut notices = Vec::new();
        if !self.is_recognized(payload) {
            notices.push(Notice::UnknownSchema {
                payload: pretty(payload),
            });
        }

        let scopes = Scopes::walk(payload);
        let columns = self
            .schema
            .fields()
            .iter()
            .map(|f| {
                let value = scopes.lookup(f.path).and_then(|v| coerce(v, f.kind));
                (f.column, value)
            })
            .collect();

        let record = FlattenedAlertRecord {
            columns,
            payload_json,
        };

        Normalized { record, notices }
    }

    /// Whether the payload has one of the known shapes.
    pub fn is_recognized(&self, payload: &Value) -> bool {
        let object = match payload.as_object() {
            Some(object) => object,
            None => return false,
        };

        if let Some(version) = self.schema.version() {
            if object.get("version").and_then(Value::as_str) == Some(version) {
                return true;
            }
        }

        self.schema.required().iter().all(|k| object.contains_key(*k))
    }
}

/// Objects found along the known nesting paths of a payload.
struct Scopes<'a> {
    root: Option<&'a Map<String, Value>>,
    alert_data: Option<&'a Map<String, Value>>,
    trigger_entry: Option<&'a Map<String, Value>>,
    trigger: Option<&'a Map<String, Value>>,
}

impl<'a> Scopes<'a> {
    fn walk(payload: &'a Value) -> Scopes<'a> {
        let root = payload.as_object();
        let alert_data = root
            .and_then(|o| o.get("alertData"))
            .and_then(Value::as_object);
        // only the first trigger is kept, the others are dropped
        let trigger_entry = alert_data
            .and_then(|o| o.get("triggerData"))
            .and_then(Value::as_array)
            .and_then(|list| list.first())
            .and_then(Value::as_object);
        let trigger = trigger_entry
            .and_then(|o| o.get("trigger"))
            .and_then(Value::as_object);

        Scopes {
            root,
            alert_data,
            trigger_entry,
            trigger,
        }
    }

    fn lookup(&self, path: FieldPath) -> Option<&'a Value> {
        let scope = match path {
            FieldPath::Root(_) => self.root,
            FieldPath::AlertData(_) => self.alert_data,
            FieldPath::TriggerEntry(_) => self.trigger_entry,
            FieldPath::Trigger(_) => self.trigger,
        };
        scope.and_then(|o| o.get(path.key()))
    }
}

fn coerce(value: &Value, kind: ColumnKind) -> Option<ColumnValue> {
    match kind {
        ColumnKind::Text => match value {
            Value::String(s) => Some(ColumnValue::Text(s.clone())),
            Value::Number(n) => Some(ColumnValue::Text(n.to_string())),
            Value::Bool(b) => Some(ColumnValue::Text(b.to_string())),
            _ => None,
        },
        ColumnKind::Integer => match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                        .map(|f| f as i64)
                })
                .map(ColumnValue::Integer),
            Value::String(s) => s.trim().parse().ok().map(ColumnValue::Integer),
            _ => None,
        },
        ColumnKind::Float => match value {
            Value::Number(n) => n.as_f64().map(ColumnValue::Float),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(ColumnValue::Float),
            _ => None,
        },
        ColumnKind::Boolean => match value {
            Value::Bool(b) => Some(ColumnValue::Boolean(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(ColumnValue::Boolean(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => {
                Some(ColumnValue::Boolean(false))
            }
            _ => None,
        },
        ColumnKind::Json => match value {
            Value::Null => None,
            other => Some(ColumnValue::Text(other.to_string())),
        },
    }
}

pub(crate) fn pretty(payload: &Value) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
}

pub(crate) fn pretty_raw(payload: &RawValue) -> String {
    match serde_json::from_str(payload.get()) {
        Ok(value) => pretty(&value),
        Err(_) => payload.get().to_string(),
    }
}
