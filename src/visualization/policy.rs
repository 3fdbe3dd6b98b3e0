//! Per-visualization reconciliation policies

use crate::data::{DataError, SeriesData, TableData};
use crate::engine::RawResult;
use crate::query::{is_query_equal, Grouping, Selections};
use crate::result_spec::ResultSpec;

use super::kind::VisualizationType;

/// Capability bundle the reconciler is parameterized with
///
/// Predicates always see the caller's untransformed inputs;
/// [`prepare_selections`](Self::prepare_selections) only shapes what is sent
/// to the query engine, so it can never cause an invalidation loop.
pub trait VisualizationPolicy: Send + Sync + 'static {
    type Data: Send + Sync + 'static;

    fn visualization(&self) -> VisualizationType;

    /// True on the first run or when the query itself changed
    fn should_run_new_query(
        &self,
        selections: &Selections,
        result_spec: &ResultSpec,
        prev: Option<(&Selections, &ResultSpec)>,
    ) -> bool {
        let _ = result_spec;
        query_inputs_changed(selections, prev.map(|(s, _)| s))
    }

    /// True on the first run or when a display input of this type changed
    fn should_rebuild_query_result(
        &self,
        result_spec: &ResultSpec,
        prev: Option<&ResultSpec>,
    ) -> bool {
        display_inputs_changed(self.visualization(), result_spec, prev)
    }

    /// Deterministic adjustment of the selections before querying
    fn prepare_selections(&self, selections: &Selections, result_spec: &ResultSpec) -> Selections {
        let _ = result_spec;
        selections.clone()
    }

    fn deserialize(&self, raw: &RawResult, result_spec: &ResultSpec)
    -> Result<Self::Data, DataError>;
}

/// First run, or selections that are not query-equal
pub fn query_inputs_changed(selections: &Selections, prev: Option<&Selections>) -> bool {
    prev.is_none_or(|prev| !is_query_equal(selections, prev))
}

/// First run, or a change to custom fields, display filters or this type's null display
pub fn display_inputs_changed(
    viz: VisualizationType,
    result_spec: &ResultSpec,
    prev: Option<&ResultSpec>,
) -> bool {
    prev.is_none_or(|prev| {
        result_spec.custom_fields_or_data_filters_changed(prev)
            || result_spec.null_value_display_changed(prev, viz)
    })
}

/// Policy for tabular visualizations: bar graphs, box plots, bubble charts,
/// expando trees, heat tiles, histograms, number trends and tables
#[derive(Debug, Clone, Copy)]
pub struct StandardPolicy {
    viz: VisualizationType,
}

impl StandardPolicy {
    pub fn new(viz: VisualizationType) -> Self {
        Self { viz }
    }
}

impl VisualizationPolicy for StandardPolicy {
    type Data = TableData;

    fn visualization(&self) -> VisualizationType {
        self.viz
    }

    fn deserialize(
        &self,
        raw: &RawResult,
        result_spec: &ResultSpec,
    ) -> Result<TableData, DataError> {
        TableData::from_raw(raw, result_spec, self.viz)
    }
}

/// Line graphs requery when their time bucket changes, since the bucket is
/// applied to every time-based grouping of the query
#[derive(Debug, Clone, Copy, Default)]
pub struct LineGraphPolicy;

impl VisualizationPolicy for LineGraphPolicy {
    type Data = SeriesData;

    fn visualization(&self) -> VisualizationType {
        VisualizationType::LineGraph
    }

    fn should_run_new_query(
        &self,
        selections: &Selections,
        result_spec: &ResultSpec,
        prev: Option<(&Selections, &ResultSpec)>,
    ) -> bool {
        match prev {
            None => true,
            Some((prev_selections, prev_spec)) => {
                !is_query_equal(selections, prev_selections)
                    || result_spec.bucket_type_changed(prev_spec, VisualizationType::LineGraph)
            }
        }
    }

    fn prepare_selections(&self, selections: &Selections, result_spec: &ResultSpec) -> Selections {
        let Some(bucket) = result_spec.bucket_type(VisualizationType::LineGraph) else {
            return selections.clone();
        };
        let groups = selections
            .groups
            .iter()
            .map(|g| match g.granularity {
                Some(_) => Grouping::time(g.attribute.clone(), bucket),
                None => g.clone(),
            })
            .collect();
        selections.with_groups(groups)
    }

    fn deserialize(
        &self,
        raw: &RawResult,
        result_spec: &ResultSpec,
    ) -> Result<SeriesData, DataError> {
        SeriesData::from_raw(raw, result_spec, VisualizationType::LineGraph)
    }
}

/// Bump charts rank series over a single time axis: at most one time-based
/// grouping is sent, the first one
#[derive(Debug, Clone, Copy, Default)]
pub struct BumpChartPolicy;

impl VisualizationPolicy for BumpChartPolicy {
    type Data = SeriesData;

    fn visualization(&self) -> VisualizationType {
        VisualizationType::BumpChart
    }

    fn prepare_selections(&self, selections: &Selections, _result_spec: &ResultSpec) -> Selections {
        let mut seen_time = false;
        let groups = selections
            .groups
            .iter()
            .filter(|g| {
                if !g.is_time_based() {
                    return true;
                }
                !std::mem::replace(&mut seen_time, true)
            })
            .cloned()
            .collect();
        selections.with_groups(groups)
    }

    fn deserialize(
        &self,
        raw: &RawResult,
        result_spec: &ResultSpec,
    ) -> Result<SeriesData, DataError> {
        SeriesData::from_raw(raw, result_spec, VisualizationType::BumpChart)
    }
}
