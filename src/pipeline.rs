// Request pipeline: load -> filter -> classify -> resolve -> build -> merge

use crate::classify::{classify, IndicatorKind};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::document;
use crate::error::{Result, ServiceError};
use crate::filter::{self, AppliedFilter, FilterRequest};
use crate::indicator::{Indicator, Metadata};
use crate::loader::IndicatorStore;
use crate::resolve::resolve;
use crate::series::{self, ChartSeries};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Body returned for an indicator: metadata plus the (filled) chart document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorResponse {
    pub metadata: Metadata,
    pub data_example: Value,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub response: IndicatorResponse,
    pub kind: IndicatorKind,
    pub applied: Vec<AppliedFilter>,
    pub diagnostics: Diagnostics,
}

/// Unfiltered template for an indicator.
pub fn describe(store: &IndicatorStore, id: u64) -> Result<IndicatorResponse> {
    let (metadata, template) = store.load_descriptor(id)?;
    Ok(IndicatorResponse {
        metadata,
        data_example: template.into_value(),
    })
}

/// Load an indicator and run it through the full pipeline.
pub fn run(store: &IndicatorStore, id: u64, request: &FilterRequest) -> Result<PipelineOutput> {
    let indicator = store.load(id)?;
    process(&indicator, request, &document::timestamp())
}

/// Run an already loaded indicator through filtering and series construction.
pub fn process(indicator: &Indicator, request: &FilterRequest, created_at: &str) -> Result<PipelineOutput> {
    let metadata = &indicator.metadata;
    let template = &indicator.template;

    // 1. Filter
    let outcome = filter::apply(&indicator.table, request);
    let mut diagnostics = outcome.diagnostics;
    let table = filter::apply_post_filters(&outcome.table, &metadata.post_filters, &mut diagnostics);
    debug!(indicator_id = indicator.id, rows = table.len(), applied = outcome.applied.len(), "filtered");

    // 2. Classify
    let kind = classify(metadata, template);

    // 3. Resolve + build
    let series = if table.is_empty() {
        diagnostics.push(Diagnostic::EmptyResult);
        ChartSeries::Empty
    } else {
        match (resolve(&table, template, metadata), kind) {
            (Ok(fields), IndicatorKind::Map) => series::build_map(&table, &fields),
            (Ok(fields), IndicatorKind::Multi) => series::build_multi(&table, &fields),
            (Ok(fields), IndicatorKind::Single) => series::build_single(&table, &fields),
            (Err(e), IndicatorKind::Map) => return Err(ServiceError::InsufficientFields(e.to_string())),
            (Err(e), IndicatorKind::Single | IndicatorKind::Multi) => {
                diagnostics.push(Diagnostic::InsufficientFields { reason: e.to_string() });
                ChartSeries::Empty
            }
        }
    };
    debug!(indicator_id = indicator.id, ?kind, "series built");

    // 4. Merge into the template
    let data_example = document::render(template, metadata, &series, &outcome.applied, created_at);

    Ok(PipelineOutput {
        response: IndicatorResponse {
            metadata: metadata.clone(),
            data_example,
        },
        kind,
        applied: outcome.applied,
        diagnostics,
    })
}
