//! Record shapes and their wire contract.
//!
//! Records are remote-owned: identifiers are assigned by the server and
//! uniqueness is the server's guarantee, not ours. The client holds no state
//! beyond the currently rendered snapshot, so these types exist only between
//! one fetch and the next render.
//!
//! Wire field names are the API's (French) names; the Rust field names are
//! ours. Attribute values are deserialized tolerantly: the server stores
//! free-form input, so a field documented as text may arrive as a number,
//! and an empty string counts as absent (it renders as the `N/A` fallback).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Record contract
// ---------------------------------------------------------------------------

/// One creation-form field: wire key, prompt label, required flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
}

/// A remote-owned record kind, as the table and form controllers see it.
///
/// Everything that varied between the per-kind copies of the original
/// synchronization cycle is an associated item here: the endpoint, the column
/// list, the identity extractor, the confirmation text and the creation
/// fields.
pub trait Record: DeserializeOwned + Serialize {
    /// Singular noun for notices ("sensor").
    const NOUN: &'static str;
    /// Plural noun ("sensors").
    const NOUN_PLURAL: &'static str;
    /// Collection endpoint path, e.g. `/api/capteurs`.
    const ENDPOINT: &'static str;
    /// Column headers, one per entry of [`Record::cells`].
    const COLUMNS: &'static [&'static str];
    /// Question asked before a DELETE is issued.
    const DELETE_PROMPT: &'static str;
    /// Creation form fields, in prompt order.
    const FORM_FIELDS: &'static [FieldSpec];

    /// Server-assigned identity, as used in `DELETE {endpoint}/{id}`.
    fn id(&self) -> String;

    /// Cell values in column order; `None` renders as the missing-value
    /// fallback.
    fn cells(&self) -> Vec<Option<String>>;
}

// ---------------------------------------------------------------------------
// Sensor
// ---------------------------------------------------------------------------

/// A sensor or actuator attached to a room of a housing unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    pub id: i64,
    #[serde(rename = "type", default, deserialize_with = "scalar_field")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "scalar_field")]
    pub port_communication: Option<String>,
    #[serde(default, deserialize_with = "scalar_field")]
    pub reference_commerciale: Option<String>,
    #[serde(default, deserialize_with = "scalar_field")]
    pub id_piece: Option<String>,
}

impl Record for Sensor {
    const NOUN: &'static str = "sensor";
    const NOUN_PLURAL: &'static str = "sensors";
    const ENDPOINT: &'static str = "/api/capteurs";
    const COLUMNS: &'static [&'static str] = &["ID", "Type", "Port", "Reference", "Room"];
    const DELETE_PROMPT: &'static str = "Are you sure you want to delete this sensor?";
    const FORM_FIELDS: &'static [FieldSpec] = &[
        FieldSpec { key: "type", label: "Type", required: true },
        FieldSpec { key: "port_communication", label: "Communication port", required: true },
        FieldSpec { key: "reference_commerciale", label: "Commercial reference", required: true },
        FieldSpec { key: "id_piece", label: "Room id", required: true },
    ];

    fn id(&self) -> String {
        self.id.to_string()
    }

    fn cells(&self) -> Vec<Option<String>> {
        vec![
            Some(self.id.to_string()),
            self.kind.clone(),
            self.port_communication.clone(),
            self.reference_commerciale.clone(),
            self.id_piece.clone(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Housing
// ---------------------------------------------------------------------------

/// A housing unit. The wire identity field is `id_logement`, unlike the
/// sensor's plain `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Housing {
    #[serde(rename = "id_logement")]
    pub id: i64,
    #[serde(rename = "adresse", default, deserialize_with = "scalar_field")]
    pub address: Option<String>,
    #[serde(rename = "numero_telephone", default, deserialize_with = "scalar_field")]
    pub phone_number: Option<String>,
    #[serde(rename = "adresse_ip", default, deserialize_with = "scalar_field")]
    pub ip_address: Option<String>,
    /// Assigned by the server at insertion; never part of a creation draft.
    #[serde(rename = "date_insertion", default, deserialize_with = "scalar_field")]
    pub insertion_date: Option<String>,
}

impl Record for Housing {
    const NOUN: &'static str = "housing unit";
    const NOUN_PLURAL: &'static str = "housing units";
    const ENDPOINT: &'static str = "/api/logements";
    const COLUMNS: &'static [&'static str] = &["ID", "Address", "Phone", "IP address", "Inserted"];
    const DELETE_PROMPT: &'static str = "Are you sure you want to delete this housing unit?";
    const FORM_FIELDS: &'static [FieldSpec] = &[
        FieldSpec { key: "adresse", label: "Address", required: true },
        FieldSpec { key: "numero_telephone", label: "Phone number", required: true },
        FieldSpec { key: "adresse_ip", label: "IP address", required: true },
    ];

    fn id(&self) -> String {
        self.id.to_string()
    }

    fn cells(&self) -> Vec<Option<String>> {
        vec![
            Some(self.id.to_string()),
            self.address.clone(),
            self.phone_number.clone(),
            self.ip_address.clone(),
            self.insertion_date.clone(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Aggregate rows (reporting endpoints)
// ---------------------------------------------------------------------------

/// One category/value pair from a reporting endpoint. Category labels are not
/// guaranteed unique or stable in order; both value fields are optional on
/// the wire (see the chart adapter for the resolution rules).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    #[serde(rename = "type")]
    pub category: String,
    #[serde(default)]
    pub economie: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
}

/// Time scale for the savings comparison. The wire values are the API's
/// French labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Monthly,
    Annual,
}

impl Scale {
    pub fn from_str_opt(s: Option<&str>) -> Option<Self> {
        match s.map(str::to_ascii_lowercase).as_deref() {
            Some("monthly") | Some("mensuel") => Some(Self::Monthly),
            Some("annual") | Some("yearly") | Some("annuel") => Some(Self::Annual),
            _ => None,
        }
    }

    /// Value sent as the `scale` query parameter.
    pub fn wire_value(self) -> &'static str {
        match self {
            Self::Monthly => "Mensuel",
            Self::Annual => "Annuel",
        }
    }
}

impl std::fmt::Display for Scale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Annual => write!(f, "annual"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tolerant scalar deserialization
// ---------------------------------------------------------------------------

/// Accept any JSON scalar as an optional display string.
///
/// `null` and whitespace-only strings become `None` — the same values the
/// rendered table replaces with its `N/A` fallback. Numbers and booleans are
/// stringified, so a server that stores `id_piece` as an integer and one that
/// stores it as text both render identically.
fn scalar_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_deserializes_wire_names() {
        let json = r#"{
            "id": 7,
            "type": "DHT11",
            "port_communication": "COM3",
            "reference_commerciale": "AM2302",
            "id_piece": 2
        }"#;
        let sensor: Sensor = serde_json::from_str(json).unwrap();
        assert_eq!(sensor.id(), "7");
        assert_eq!(sensor.kind.as_deref(), Some("DHT11"));
        assert_eq!(sensor.id_piece.as_deref(), Some("2"));
    }

    #[test]
    fn empty_and_null_fields_count_as_absent() {
        let json = r#"{"id": 1, "type": "", "port_communication": null}"#;
        let sensor: Sensor = serde_json::from_str(json).unwrap();
        assert_eq!(sensor.kind, None);
        assert_eq!(sensor.port_communication, None);
        assert_eq!(sensor.reference_commerciale, None);
    }

    #[test]
    fn housing_identity_is_id_logement() {
        let json = r#"{
            "id_logement": 3,
            "adresse": "12 rue des Lilas",
            "numero_telephone": "0102030405",
            "adresse_ip": "192.168.1.10",
            "date_insertion": "2024-11-02 10:15:00"
        }"#;
        let housing: Housing = serde_json::from_str(json).unwrap();
        assert_eq!(housing.id(), "3");
        assert_eq!(housing.cells().len(), Housing::COLUMNS.len());
    }

    #[test]
    fn cells_match_columns_for_both_kinds() {
        let sensor = Sensor {
            id: 1,
            kind: None,
            port_communication: None,
            reference_commerciale: None,
            id_piece: None,
        };
        assert_eq!(sensor.cells().len(), Sensor::COLUMNS.len());
    }

    #[test]
    fn aggregate_row_tolerates_missing_value_fields() {
        let rows: Vec<AggregateRow> =
            serde_json::from_str(r#"[{"type":"Eau","total":60.78},{"type":"Gaz"}]"#).unwrap();
        assert_eq!(rows[0].total, Some(60.78));
        assert_eq!(rows[1].economie, None);
        assert_eq!(rows[1].total, None);
    }

    #[test]
    fn scale_parsing_and_wire_values() {
        assert_eq!(Scale::from_str_opt(Some("monthly")), Some(Scale::Monthly));
        assert_eq!(Scale::from_str_opt(Some("Annual")), Some(Scale::Annual));
        assert_eq!(Scale::from_str_opt(Some("annuel")), Some(Scale::Annual));
        assert_eq!(Scale::from_str_opt(Some("weekly")), None);
        assert_eq!(Scale::from_str_opt(None), None);
        assert_eq!(Scale::Monthly.wire_value(), "Mensuel");
        assert_eq!(Scale::Annual.wire_value(), "Annuel");
        assert_eq!(Scale::Monthly.to_string(), "monthly");
    }
}
