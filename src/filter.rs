// Filter engine: request filter values -> row predicate + audit trail

use crate::data::RawTable;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::indicator::PostFilter;
use nom::{
    bytes::complete::tag,
    character::complete::digit1,
    combinator::{all_consuming, map_res},
    sequence::preceded,
    IResult,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Query parameters addressing a filter column start with this prefix.
pub const FILTER_PREFIX: &str = "nome_option_f";

/// Audit record of a filter that matched a column and was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedFilter {
    #[serde(rename = "id_filtro")]
    pub filter_id: u32,
    #[serde(rename = "id_option")]
    pub options: Vec<String>,
}

/// Requested filter values grouped by parameter name, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRequest {
    params: Vec<(String, Vec<String>)>,
}

impl FilterRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a request from raw query pairs. Keys without the filter prefix
    /// are not filters and are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut request = Self::new();
        for (key, value) in pairs {
            if key.as_ref().trim().starts_with(FILTER_PREFIX) {
                request.push(key.as_ref(), value.as_ref());
            }
        }
        request
    }

    /// Add a raw value for `key`. Repeated keys accumulate (OR semantics) and a
    /// single value may carry several comma-separated options.
    pub fn push(&mut self, key: &str, raw_value: &str) {
        let key = key.trim();
        let values = raw_value
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => existing.extend(values),
            None => self.params.push((key.to_string(), values.collect())),
        }
    }

    pub fn params(&self) -> &[(String, Vec<String>)] {
        &self.params
    }
}

fn filter_key(input: &str) -> IResult<&str, u32> {
    all_consuming(preceded(tag(FILTER_PREFIX), map_res(digit1, str::parse::<u32>)))(input)
}

/// Extract the numeric filter id from a parameter name like `nome_option_f7`.
pub fn parse_filter_id(key: &str) -> Option<u32> {
    filter_key(key).ok().map(|(_, id)| id)
}

/// Result of applying a filter request. `table` is a new table; the input is untouched.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub table: RawTable,
    pub applied: Vec<AppliedFilter>,
    pub diagnostics: Diagnostics,
}

/// Apply every filter parameter to `table`: distinct parameters are AND-ed,
/// values of one parameter are OR-ed.
pub fn apply(table: &RawTable, request: &FilterRequest) -> FilterOutcome {
    let mut current = table.clone();
    let mut applied = Vec::new();
    let mut diagnostics = Diagnostics::new();

    for (key, values) in request.params() {
        let Some(filter_id) = parse_filter_id(key) else {
            diagnostics.push(Diagnostic::MalformedFilterKey { key: key.clone() });
            continue;
        };
        let Some(col_idx) = current.column_index(key) else {
            diagnostics.push(Diagnostic::UnknownFilterColumn { key: key.clone() });
            continue;
        };
        if values.is_empty() {
            diagnostics.push(Diagnostic::EmptyFilterValues { key: key.clone() });
            continue;
        }

        let matcher = Matcher::build(values);
        current = matcher.filter(&current, col_idx);
        debug!(filter = %key, rows = current.len(), "filter applied");

        // Recorded even when the filter leaves no rows
        applied.push(AppliedFilter {
            filter_id,
            options: values.clone(),
        });
    }

    FilterOutcome {
        table: current,
        applied,
        diagnostics,
    }
}

/// Apply indicator-level post-filters with the same value semantics as request filters.
pub fn apply_post_filters(
    table: &RawTable,
    filters: &[PostFilter],
    diagnostics: &mut Diagnostics,
) -> RawTable {
    let mut current = table.clone();
    for filter in filters {
        let Some(col_idx) = current.column_index(filter.column.trim()) else {
            diagnostics.push(Diagnostic::UnknownPostFilterColumn {
                column: filter.column.clone(),
            });
            continue;
        };
        let matcher = Matcher::build(&filter.values);
        current = matcher.filter(&current, col_idx);
        diagnostics.push(Diagnostic::PostFilterApplied {
            column: filter.column.clone(),
            values: filter.values.clone(),
        });
    }
    current
}

/// True if `value`, with at most one decimal point removed, is only ASCII digits.
pub fn looks_numeric(value: &str) -> bool {
    let stripped = value.replacen('.', "", 1);
    !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit())
}

enum Matcher {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl Matcher {
    /// Numeric comparison only when every value looks numeric; otherwise string equality.
    fn build(values: &[String]) -> Self {
        let numbers: Option<Vec<f64>> = values
            .iter()
            .map(|v| looks_numeric(v).then(|| v.parse::<f64>().ok()).flatten())
            .collect();
        match numbers {
            Some(numbers) => Matcher::Numeric(numbers),
            None => Matcher::Text(values.to_vec()),
        }
    }

    fn filter(&self, table: &RawTable, col_idx: usize) -> RawTable {
        match self {
            Matcher::Numeric(numbers) => table.filter_rows(|row| {
                row[col_idx]
                    .as_number()
                    .map_or(false, |n| numbers.iter().any(|wanted| *wanted == n))
            }),
            Matcher::Text(texts) => table.filter_rows(|row| {
                row[col_idx]
                    .as_text()
                    .map_or(false, |s| texts.iter().any(|wanted| *wanted == s))
            }),
        }
    }
}
