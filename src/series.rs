use crate::data::RawTable;
use crate::resolve::ResolvedFields;
use serde::Serialize;
use std::cmp::Ordering;

/// One chart point: `[index into the shared x-axis, aggregated value]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point(pub usize, pub f64);

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySeries {
    pub name: String,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapEntry {
    pub name: String,
    pub value: f64,
}

/// Aggregated chart data, one variant per output shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartSeries {
    /// No rows survived filtering, or the fields could not be resolved
    Empty,
    Single {
        axis: Vec<f64>,
        points: Vec<Point>,
    },
    Multi {
        axis: Vec<f64>,
        categories: Vec<CategorySeries>,
    },
    Map {
        entries: Vec<MapEntry>,
    },
}

impl ChartSeries {
    /// Min/max over map values, for the visual-range legend.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        match self {
            ChartSeries::Map { entries } if !entries.is_empty() => {
                let min = entries.iter().map(|e| e.value).fold(f64::INFINITY, f64::min);
                let max = entries.iter().map(|e| e.value).fold(f64::NEG_INFINITY, f64::max);
                Some((min, max))
            }
            _ => None,
        }
    }
}

fn cmp_f64(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Numeric (axis, value) pairs of `table`; rows where either coerces to null are dropped.
fn numeric_pairs(table: &RawTable, axis_idx: usize, value_idx: usize) -> Vec<(f64, f64)> {
    table
        .rows
        .iter()
        .filter_map(|row| Some((row[axis_idx].as_number()?, row[value_idx].as_number()?)))
        .collect()
}

/// Sum values by axis, ascending by axis value.
pub fn build_single(table: &RawTable, fields: &ResolvedFields) -> ChartSeries {
    let (Some(axis_idx), Some(value_idx)) = (
        fields.axis_field.as_deref().and_then(|f| table.column_index(f)),
        table.column_index(&fields.value_field),
    ) else {
        return ChartSeries::Empty;
    };

    let mut pairs = numeric_pairs(table, axis_idx, value_idx);
    pairs.sort_by(|a, b| cmp_f64(&a.0, &b.0));

    let mut axis: Vec<f64> = Vec::new();
    let mut sums: Vec<f64> = Vec::new();
    for (x, y) in pairs {
        match axis.last() {
            Some(last) if *last == x => {
                if let Some(sum) = sums.last_mut() {
                    *sum += y;
                }
            }
            _ => {
                axis.push(x);
                sums.push(y);
            }
        }
    }

    let points = sums
        .into_iter()
        .enumerate()
        .map(|(i, sum)| Point(i, sum))
        .collect();

    ChartSeries::Single { axis, points }
}

/// Sum values by (axis, category); one series per category over a shared x-axis.
pub fn build_multi(table: &RawTable, fields: &ResolvedFields) -> ChartSeries {
    let Some(category_idx) = fields
        .category_field
        .as_deref()
        .and_then(|f| table.column_index(f))
    else {
        // Without a category column a multi-series indicator plots as one series
        return build_single(table, fields);
    };
    let (Some(axis_idx), Some(value_idx)) = (
        fields.axis_field.as_deref().and_then(|f| table.column_index(f)),
        table.column_index(&fields.value_field),
    ) else {
        return ChartSeries::Empty;
    };

    let mut rows: Vec<(f64, String, f64)> = table
        .rows
        .iter()
        .filter_map(|row| {
            Some((
                row[axis_idx].as_number()?,
                row[category_idx].as_text()?,
                row[value_idx].as_number()?,
            ))
        })
        .collect();
    rows.sort_by(|a, b| cmp_f64(&a.0, &b.0).then_with(|| a.1.cmp(&b.1)));

    // Collapse equal (axis, category) keys; rows are sorted so duplicates are adjacent
    let mut grouped: Vec<(f64, String, f64)> = Vec::new();
    for (x, cat, y) in rows {
        match grouped.last_mut() {
            Some(last) if last.0 == x && last.1 == cat => last.2 += y,
            _ => grouped.push((x, cat, y)),
        }
    }

    let mut axis: Vec<f64> = Vec::new();
    for (x, _, _) in &grouped {
        if axis.last() != Some(x) {
            axis.push(*x);
        }
    }

    let mut categories: Vec<CategorySeries> = Vec::new();
    for (x, cat, y) in grouped {
        let x_index = axis.iter().position(|a| *a == x).unwrap_or_default();
        match categories.iter_mut().find(|c| c.name == cat) {
            Some(series) => series.points.push(Point(x_index, y)),
            None => categories.push(CategorySeries {
                name: cat,
                points: vec![Point(x_index, y)],
            }),
        }
    }

    ChartSeries::Multi { axis, categories }
}

/// Sum values by entity name, ordered by name.
pub fn build_map(table: &RawTable, fields: &ResolvedFields) -> ChartSeries {
    let (Some(name_idx), Some(value_idx)) = (
        fields.name_field.as_deref().and_then(|f| table.column_index(f)),
        table.column_index(&fields.value_field),
    ) else {
        return ChartSeries::Empty;
    };

    let mut rows: Vec<(String, f64)> = table
        .rows
        .iter()
        .filter_map(|row| Some((row[name_idx].as_text()?, row[value_idx].as_number()?)))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    let mut entries: Vec<MapEntry> = Vec::new();
    for (name, value) in rows {
        match entries.last_mut() {
            Some(last) if last.name == name => last.value += value,
            _ => entries.push(MapEntry { name, value }),
        }
    }

    ChartSeries::Map { entries }
}
