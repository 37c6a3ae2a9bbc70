/// Type a flattened column is stored as in the warehouse table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// `VARCHAR`
    Text,
    /// `BIGINT`
    Integer,
    /// `DOUBLE PRECISION`
    Float,
    /// `BOOLEAN`
    Boolean,
    /// `VARCHAR` holding the value re-encoded as JSON (tag lists)
    Json,
}

/// Where a column's value lives in the inbound payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldPath {
    /// A key of the top-level object
    Root(&'static str),
    /// A key of the `alertData` object
    AlertData(&'static str),
    /// A key of the first `alertData.triggerData` entry
    TriggerEntry(&'static str),
    /// A key of the first entry's `trigger` object
    Trigger(&'static str),
}

impl FieldPath {
    /// The external key looked up at the end of the path.
    pub fn key(&self) -> &'static str {
        match self {
            FieldPath::Root(k)
            | FieldPath::AlertData(k)
            | FieldPath::TriggerEntry(k)
            | FieldPath::Trigger(k) => k,
        }
    }
}

/// One row of the rename table: external path to internal column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldMapping {
    /// Output column name
    pub column: &'static str,
    /// Input location
    pub path: FieldPath,
    /// Output type
    pub kind: ColumnKind,
}

const fn field(column: &'static str, path: FieldPath, kind: ColumnKind) -> FieldMapping {
    FieldMapping { column, path, kind }
}

use ColumnKind::*;
use FieldPath::*;

const ALERT_FIELDS: &[FieldMapping] = &[
    field("version", Root("version"), Text),
    field("shared_secret", Root("sharedSecret"), Text),
    field("sent_at", Root("sentAt"), Text),
    field("organization_id", Root("organizationId"), Text),
    field("organization_name", Root("organizationName"), Text),
    field("organization_url", Root("organizationUrl"), Text),
    field("network_id", Root("networkId"), Text),
    field("network_name", Root("networkName"), Text),
    field("network_url", Root("networkUrl"), Text),
    field("network_tags", Root("networkTags"), Json),
    field("device_serial", Root("deviceSerial"), Text),
    field("device_mac", Root("deviceMac"), Text),
    field("device_name", Root("deviceName"), Text),
    field("device_url", Root("deviceUrl"), Text),
    field("device_tags", Root("deviceTags"), Json),
    field("device_model", Root("deviceModel"), Text),
    field("alert_id", Root("alertId"), Text),
    field("alert_type", Root("alertType"), Text),
    field("alert_type_id", Root("alertTypeId"), Text),
    field("alert_level", Root("alertLevel"), Text),
    field("occurred_at", Root("occurredAt"), Text),
    field("alert_config_id", AlertData("alertConfigId"), Integer),
    field("alert_config_name", AlertData("alertConfigName"), Text),
    field("started_alerting", AlertData("startedAlerting"), Boolean),
    field("condition_id", TriggerEntry("conditionId"), Integer),
    field("trigger_ts", Trigger("ts"), Float),
    field("trigger_type", Trigger("type"), Text),
    field("trigger_node_id", Trigger("nodeId"), Integer),
    field("trigger_sensor_value", Trigger("sensorValue"), Float),
];

const ALERT_REQUIRED: &[&str] = &["organizationId", "networkId", "deviceSerial", "alertType"];

/// Column holding the whole inbound payload as a JSON string.
pub const PAYLOAD_COLUMN: &str = "payload_json";

/// `AlertSchema` is the declared shape of an alert webhook:
/// the rename table plus the rules used to recognize the payload.
#[derive(Clone, Debug, PartialEq)]
pub struct AlertSchema {
    fields: Vec<FieldMapping>,
    required: Vec<&'static str>,
    version: Option<&'static str>,
}

impl AlertSchema {
    /// Build a schema from an explicit table.
    ///
    /// A payload is recognized when its `version` equals `version`,
    /// or when every key in `required` is present at the top level.
    pub fn new(
        fields: Vec<FieldMapping>,
        required: Vec<&'static str>,
        version: Option<&'static str>,
    ) -> AlertSchema {
        AlertSchema {
            fields,
            required,
            version,
        }
    }

    /// Schema of Meraki alert webhooks (payload version 0.1).
    pub fn meraki() -> AlertSchema {
        AlertSchema::new(ALERT_FIELDS.to_vec(), ALERT_REQUIRED.to_vec(), Some("0.1"))
    }

    /// The rename table, in output column order.
    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    /// Output column names, in order. Does not include the passthrough column.
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.column)
    }

    /// Top-level keys that identify a recognized payload.
    pub fn required(&self) -> &[&'static str] {
        &self.required
    }

    /// Payload version accepted without checking the required keys.
    pub fn version(&self) -> Option<&'static str> {
        self.version
    }
}

impl Default for AlertSchema {
    fn default() -> Self {
        AlertSchema::meraki()
    }
}
