// Merge aggregated series into the chart template document

use crate::data::number_to_json;
use crate::filter::AppliedFilter;
use crate::indicator::{ChartTemplate, Metadata, OPTION_KEY};
use crate::series::{CategorySeries, ChartSeries, MapEntry, Point};
use chrono::Local;
use serde_json::{json, Map, Value};

pub const APPLIED_FILTERS_KEY: &str = "applyed_filters";
pub const CREATED_AT_KEY: &str = "data_criacao";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const SINGLE_SERIES_NAME: &str = "Valor Único";

/// Current local time in the document's timestamp format.
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Styling copied from the template's first series entry.
#[derive(Debug, Clone, Default)]
struct SeriesStyle {
    id: Option<Value>,
    chart_type: Option<Value>,
    line_style: Option<Value>,
    item_style: Option<Value>,
}

impl SeriesStyle {
    fn from_template(template: &ChartTemplate) -> Self {
        match template.first_series() {
            Some(first) => Self {
                id: first.get("id").cloned(),
                chart_type: first.get("type").cloned(),
                line_style: first.get("lineStyle").cloned(),
                item_style: first.get("itemStyle").cloned(),
            },
            None => Self::default(),
        }
    }

    fn entry(&self, default_id: String, name: &str, data: Value) -> Value {
        json!({
            "id": self.id.clone().unwrap_or(Value::String(default_id)),
            "type": self.chart_type.clone().unwrap_or_else(|| json!("line")),
            "name": name,
            "data": data,
            "lineStyle": self.line_style.clone().unwrap_or_else(|| json!({})),
            "itemStyle": self.item_style.clone().unwrap_or_else(|| json!({})),
        })
    }
}

fn points_json(points: &[Point]) -> Value {
    serde_json::to_value(points).unwrap_or_else(|_| json!([]))
}

fn axis_json(axis: &[f64]) -> Value {
    Value::Array(axis.iter().map(|x| number_to_json(*x)).collect())
}

fn ensure_object<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = map.entry(key.to_string()).or_insert_with(|| json!({}));
    if !slot.is_object() {
        *slot = json!({});
    }
    match slot {
        Value::Object(obj) => obj,
        _ => unreachable!("slot was just replaced by an object"),
    }
}

/// Produce the response document: the template with axis data, series,
/// applied-filter audit and creation timestamp filled in.
pub fn render(
    template: &ChartTemplate,
    metadata: &Metadata,
    series: &ChartSeries,
    applied: &[AppliedFilter],
    created_at: &str,
) -> Value {
    let style = SeriesStyle::from_template(template);
    let mut doc = match template.clone().into_value() {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    doc.insert(
        APPLIED_FILTERS_KEY.to_string(),
        serde_json::to_value(applied).unwrap_or_else(|_| json!([])),
    );

    let option = ensure_object(&mut doc, OPTION_KEY);
    match series {
        ChartSeries::Empty => {
            option.insert("xAxis".to_string(), json!({ "data": [] }));
            option.insert("series".to_string(), json!([]));
        }
        ChartSeries::Single { axis, points } => {
            ensure_object(option, "xAxis").insert("data".to_string(), axis_json(axis));
            let name = metadata.name.as_deref().unwrap_or(SINGLE_SERIES_NAME);
            let entry = style.entry("1".to_string(), name, points_json(points));
            option.insert("series".to_string(), Value::Array(vec![entry]));
        }
        ChartSeries::Multi { axis, categories } => {
            ensure_object(option, "xAxis").insert("data".to_string(), axis_json(axis));
            option.insert("series".to_string(), multi_entries(&style, categories));
        }
        ChartSeries::Map { entries } => {
            option.insert("series".to_string(), map_entries(template, &style, metadata, entries));
            if let Some((min, max)) = series.value_range() {
                let visual_map = ensure_object(option, "visualMap");
                visual_map.insert("min".to_string(), number_to_json(min));
                visual_map.insert("max".to_string(), number_to_json(max));
            }
        }
    }

    doc.insert(CREATED_AT_KEY.to_string(), Value::String(created_at.to_string()));
    Value::Object(doc)
}

fn multi_entries(style: &SeriesStyle, categories: &[CategorySeries]) -> Value {
    Value::Array(
        categories
            .iter()
            .enumerate()
            .map(|(i, cat)| style.entry((i + 1).to_string(), &cat.name, points_json(&cat.points)))
            .collect(),
    )
}

fn map_entries(
    template: &ChartTemplate,
    style: &SeriesStyle,
    metadata: &Metadata,
    entries: &[MapEntry],
) -> Value {
    let data = serde_json::to_value(entries).unwrap_or_else(|_| json!([]));
    // Map series keep every template attribute (map name, label, ...) and only swap the data
    let entry = match template.first_series() {
        Some(first) => {
            let mut entry = first.clone();
            entry.insert("data".to_string(), data);
            Value::Object(entry)
        }
        None => {
            let name = metadata.name.as_deref().unwrap_or(SINGLE_SERIES_NAME);
            style.entry("1".to_string(), name, data)
        }
    };
    Value::Array(vec![entry])
}
