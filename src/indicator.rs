use crate::data::RawTable;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Descriptive metadata of an indicator (`metadata.json`).
///
/// Only the keys the pipeline reads are typed; everything else is kept in
/// `extra` and echoed back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Indicator display name
    #[serde(default, rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Visualization-type tag, e.g. "simples", "multipla", "mapa"
    #[serde(default, rename = "viz", skip_serializing_if = "Option::is_none")]
    pub viz: Option<String>,
    /// Source path of the published data
    #[serde(default, rename = "data", skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_filters: Vec<PostFilter>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    pub fn viz_lower(&self) -> String {
        self.viz.as_deref().unwrap_or_default().to_lowercase()
    }
}

/// An indicator-specific filter applied after the request filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostFilter {
    pub column: String,
    pub values: Vec<String>,
}

/// Explicit column hints carried by a chart template under `field_map`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldHints {
    #[serde(default)]
    pub axis: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// The chart-description document (`data_example.json`).
///
/// Kept as a JSON document because it is merged and returned as a whole; the
/// accessors below expose the parts the pipeline reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartTemplate(Value);

pub const OPTION_KEY: &str = "option_echarts";

impl ChartTemplate {
    /// Wrap a template document. Non-object documents are replaced by an empty object.
    pub fn new(value: Value) -> Self {
        match value {
            Value::Object(_) => Self(value),
            _ => Self(Value::Object(Map::new())),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn option(&self) -> Option<&Map<String, Value>> {
        self.0.get(OPTION_KEY).and_then(Value::as_object)
    }

    pub fn has_visual_map(&self) -> bool {
        self.option().map_or(false, |o| o.contains_key("visualMap"))
    }

    /// The first template series entry, used as the styling source.
    pub fn first_series(&self) -> Option<&Map<String, Value>> {
        self.option()
            .and_then(|o| o.get("series"))
            .and_then(Value::as_array)
            .and_then(|s| s.first())
            .and_then(Value::as_object)
    }

    pub fn field_hints(&self) -> FieldHints {
        self.0
            .get("field_map")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }
}

/// All three artifacts of one indicator, read fresh per request.
#[derive(Debug, Clone)]
pub struct Indicator {
    pub id: u64,
    pub metadata: Metadata,
    pub template: ChartTemplate,
    pub table: RawTable,
}
