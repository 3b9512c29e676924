use crate::indicator::{ChartTemplate, Metadata};

/// Output shape an indicator is rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    Map,
    Single,
    Multi,
}

const MAP_TAGS: &[&str] = &["map", "mapa"];
const MULTI_TAGS: &[&str] = &["multi", "multipla", "múltipla"];

/// A template with a `visualMap` block OR a "map"/"mapa" viz tag makes a map indicator.
pub fn is_map(metadata: &Metadata, template: &ChartTemplate) -> bool {
    template.has_visual_map() || contains_any(&metadata.viz_lower(), MAP_TAGS)
}

pub fn is_multi_series(metadata: &Metadata) -> bool {
    contains_any(&metadata.viz_lower(), MULTI_TAGS)
}

/// Map-ness is decided first; a map indicator never reaches series-shape logic.
pub fn classify(metadata: &Metadata, template: &ChartTemplate) -> IndicatorKind {
    if is_map(metadata, template) {
        IndicatorKind::Map
    } else if is_multi_series(metadata) {
        IndicatorKind::Multi
    } else {
        IndicatorKind::Single
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
