// Field resolution: explicit hints first, then ordered heuristic rules

use crate::classify::{classify, IndicatorKind};
use crate::data::RawTable;
use crate::indicator::{ChartTemplate, FieldHints, Metadata};
use thiserror::Error;

/// Filter slot that carries the year in published indicators.
pub const AXIS_SLOT: &str = "nome_option_f7";
/// Filter slot that carries the municipality name ("first option").
pub const MAP_NAME_SLOT: &str = "nome_option_f1";

const AXIS_KEYWORDS: &[&str] = &["ano", "year"];
const CATEGORY_KEYWORDS: &[&str] = &["cat", "faixa"];
const VALUE_KEYWORDS: &[&str] = &["val", "quant", "qtd", "tx", "prop"];
const NAME_KEYWORDS: &[&str] = &["mun", "nome"];

/// Columns chosen for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFields {
    pub axis_field: Option<String>,
    pub category_field: Option<String>,
    pub value_field: String,
    /// Only set for map indicators
    pub name_field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct InsufficientFields(pub String);

#[derive(Debug, Clone, Copy)]
enum Position {
    First,
    Second,
    Last,
}

/// One resolution rule; a role's rules are tried top to bottom, first match wins.
enum Rule<'a> {
    /// Explicit mapping from the template, honoured only if the column exists
    Hint(Option<&'a str>),
    /// First column whose name satisfies the predicate
    Matches(fn(&str) -> bool),
    /// Fixed positional fallback
    Position(Position),
}

fn select(rules: &[Rule], table: &RawTable, claimed: &[&str]) -> Option<String> {
    let available = |c: &&String| !claimed.contains(&c.as_str());
    for rule in rules {
        let found = match rule {
            Rule::Hint(hint) => hint.filter(|h| table.has_column(h)).map(str::to_string),
            Rule::Matches(pred) => table
                .headers
                .iter()
                .filter(available)
                .find(|c| pred(c.as_str()))
                .cloned(),
            Rule::Position(pos) => {
                let candidate = match pos {
                    Position::First => table.headers.first(),
                    Position::Second => table.headers.get(1),
                    Position::Last => table.headers.last(),
                };
                candidate.filter(available).cloned()
            }
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

fn contains_keyword(column: &str, keywords: &[&str]) -> bool {
    let lower = column.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

fn is_axis_column(column: &str) -> bool {
    column == AXIS_SLOT || contains_keyword(column, AXIS_KEYWORDS)
}

fn is_category_column(column: &str) -> bool {
    contains_keyword(column, CATEGORY_KEYWORDS)
}

fn is_value_column(column: &str) -> bool {
    contains_keyword(column, VALUE_KEYWORDS)
}

fn is_name_column(column: &str) -> bool {
    contains_keyword(column, NAME_KEYWORDS)
}

/// Resolve axis, category and value columns for a chart indicator.
pub fn resolve_chart(table: &RawTable, hints: &FieldHints) -> Result<ResolvedFields, InsufficientFields> {
    let axis = select(
        &[
            Rule::Hint(hints.axis.as_deref()),
            Rule::Matches(is_axis_column),
            Rule::Position(Position::First),
        ],
        table,
        &[],
    )
    .ok_or_else(|| InsufficientFields("no axis column".to_string()))?;

    let value = select(
        &[
            Rule::Hint(hints.value.as_deref()),
            Rule::Matches(is_value_column),
            Rule::Position(Position::Last),
        ],
        table,
        &[],
    )
    .ok_or_else(|| InsufficientFields("no value column".to_string()))?;

    if axis == value {
        return Err(InsufficientFields(format!(
            "axis and value both resolved to '{}'",
            axis
        )));
    }

    // Heuristic category candidates never reuse the axis or value column
    let category = select(
        &[
            Rule::Hint(hints.category.as_deref()),
            Rule::Matches(is_category_column),
            Rule::Position(Position::Second),
        ],
        table,
        &[axis.as_str(), value.as_str()],
    );

    Ok(ResolvedFields {
        axis_field: Some(axis),
        category_field: category,
        value_field: value,
        name_field: None,
    })
}

/// Resolve entity-name and value columns for a map indicator.
pub fn resolve_map(table: &RawTable, hints: &FieldHints) -> Result<ResolvedFields, InsufficientFields> {
    let name = select(
        &[
            Rule::Hint(hints.name.as_deref()),
            Rule::Hint(Some(MAP_NAME_SLOT)),
            Rule::Matches(is_name_column),
            Rule::Position(Position::First),
        ],
        table,
        &[],
    )
    .ok_or_else(|| InsufficientFields("no name column".to_string()))?;

    let value = select(
        &[
            Rule::Hint(hints.value.as_deref()),
            Rule::Matches(is_value_column),
            Rule::Position(Position::Last),
        ],
        table,
        &[],
    )
    .ok_or_else(|| InsufficientFields("no value column".to_string()))?;

    if name == value {
        return Err(InsufficientFields(format!(
            "name and value both resolved to '{}'",
            name
        )));
    }

    Ok(ResolvedFields {
        axis_field: None,
        category_field: None,
        value_field: value,
        name_field: Some(name),
    })
}

/// Resolve the fields for whatever shape the indicator classifies as.
pub fn resolve(
    table: &RawTable,
    template: &ChartTemplate,
    metadata: &Metadata,
) -> Result<ResolvedFields, InsufficientFields> {
    let hints = template.field_hints();
    match classify(metadata, template) {
        IndicatorKind::Map => resolve_map(table, &hints),
        IndicatorKind::Single | IndicatorKind::Multi => resolve_chart(table, &hints),
    }
}
