//! Integration tests for line graph and bump chart reconciliation

mod common;

use common::{load_result_spec, load_selections, update_and_load, ScriptedEngine};
use vizrecon::{
    BumpChartPolicy, LineGraphPolicy, NullValueDisplay, Reconciler, Reconciliation, SeriesSettings,
    TimeGranularity, VisualizationType,
};

#[tokio::test]
async fn test_line_graph_bucket_change_requeries_with_new_granularity() {
    let engine = ScriptedEngine::new();
    let reconciler = Reconciler::new(LineGraphPolicy, engine.clone());
    let selections = load_selections("monthly_revenue.yaml");
    let spec = load_result_spec("line_graph_spec.yaml");

    let snapshot = update_and_load(&reconciler, &engine, selections.clone(), spec.clone()).await;
    let data = snapshot.data.unwrap();
    assert_eq!(data.time_dimension(), "dates.date");
    assert_eq!(data.series().len(), 2);

    // The result spec's weekly bucket is applied to the time grouping sent to the backend
    assert_eq!(engine.selections(0).groups[0].granularity, Some(TimeGranularity::Week));
    // ...while the caller's selections are untouched
    assert_eq!(selections.groups[0].granularity, Some(TimeGranularity::Month));

    let yearly = spec.with_bucket_type(VisualizationType::LineGraph, Some(TimeGranularity::Year));
    let requery = reconciler.update(selections.clone(), yearly.clone());
    assert!(requery.is_query());
    assert_eq!(engine.call_count(), 2);
    assert_eq!(engine.selections(1).groups[0].granularity, Some(TimeGranularity::Year));

    // Re-sending the same inputs does not loop on the transformed selections
    assert!(reconciler.update(selections, yearly).is_unchanged());
    assert_eq!(engine.call_count(), 2);
}

#[tokio::test]
async fn test_line_graph_series_styling_is_render_only() {
    let engine = ScriptedEngine::new();
    let reconciler = Reconciler::new(LineGraphPolicy, engine.clone());
    let selections = load_selections("monthly_revenue.yaml");
    let spec = load_result_spec("line_graph_spec.yaml");
    let loaded = update_and_load(&reconciler, &engine, selections.clone(), spec.clone()).await;

    let styled = spec.with_series_settings(
        VisualizationType::LineGraph,
        "revenue|East",
        SeriesSettings { color: Some("#00aa00".into()), visible: false, ..Default::default() },
    );
    let Reconciliation::Unchanged(snapshot) = reconciler.update(selections, styled) else {
        panic!("series styling must not rebuild or requery");
    };
    assert!(loaded.same_data(&snapshot));
    assert_eq!(engine.call_count(), 1);
}

#[tokio::test]
async fn test_line_graph_null_display_rebuilds_points() {
    let engine = ScriptedEngine::new();
    let reconciler = Reconciler::new(LineGraphPolicy, engine.clone());
    let selections = load_selections("monthly_revenue.yaml").with_fields(["sparse"]);
    let spec = load_result_spec("line_graph_spec.yaml");
    let loaded = update_and_load(&reconciler, &engine, selections.clone(), spec.clone()).await;
    let before: usize = loaded.data.unwrap().series().iter().map(|s| s.points.len()).sum();
    assert_eq!(before, 4);

    let hidden = spec.with_null_value_display(VisualizationType::LineGraph, NullValueDisplay::Hide);
    let Reconciliation::Rebuilt(snapshot) = reconciler.update(selections, hidden) else {
        panic!("null display change should rebuild");
    };
    let after: usize = snapshot.data.unwrap().series().iter().map(|s| s.points.len()).sum();
    assert_eq!(after, 2);
    assert_eq!(engine.call_count(), 1);
}

#[tokio::test]
async fn test_bump_chart_queries_single_time_axis() {
    let engine = ScriptedEngine::new();
    let reconciler = Reconciler::new(BumpChartPolicy, engine.clone());
    let selections = load_selections("two_time_groupings.yaml");
    assert_eq!(selections.time_groups().count(), 2);

    let snapshot =
        update_and_load(&reconciler, &engine, selections.clone(), Default::default()).await;
    assert_eq!(engine.selections(0).time_groups().count(), 1);

    let data = snapshot.data.unwrap();
    let ranks = data.rankings("revenue");
    assert_eq!(ranks.len(), 2);
    // West rows come later in the fake backend and carry larger values
    assert_eq!(ranks[0].ranks[0], ("revenue|West".to_string(), 1));

    assert!(reconciler.update(selections, Default::default()).is_unchanged());
    assert_eq!(engine.call_count(), 1);
}
