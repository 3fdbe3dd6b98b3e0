//! Shared test utilities for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use vizrecon::{
    parser, QueryEngine, QueryError, RawResult, Reconciliation, ResultSpec, Selections,
    Snapshot, VisualizationPolicy,
};

/// Load a test fixture from the tests/test_data directory
pub fn fixture_path(name: &str) -> String {
    format!("tests/test_data/{}", name)
}

pub fn load_selections(name: &str) -> Selections {
    parser::parse_selections_file(fixture_path(name))
        .unwrap_or_else(|e| panic!("Failed to load selections {}: {}", name, e))
}

pub fn load_result_spec(name: &str) -> ResultSpec {
    parser::parse_result_spec_file(fixture_path(name))
        .unwrap_or_else(|e| panic!("Failed to load result spec {}: {}", name, e))
}

// =============================================================================
// Fake backend
// =============================================================================

const REGIONS: [&str; 2] = ["East", "West"];
const MONTHS: [&str; 2] = ["2024-01", "2024-02"];

/// Synthesize the raw result a backend would return for these selections.
///
/// Non-time groupings take the values East/West, the time grouping takes two
/// months. Metric `i` on row `r` is `(i + 1) * 10 + r`, except fields named
/// `sparse` which are null on odd rows.
pub fn synth_raw(selections: &Selections) -> RawResult {
    let dimensions: Vec<String> = selections.groups.iter().map(|g| g.attribute.clone()).collect();
    let time_dimension = selections.time_groups().next().map(|g| g.attribute.clone());

    let mut combos: Vec<Map<String, Value>> = vec![Map::new()];
    for group in &selections.groups {
        let labels: &[&str] = if group.is_time_based() { &MONTHS } else { &REGIONS };
        combos = combos
            .into_iter()
            .flat_map(|combo| {
                labels.iter().map(move |label| {
                    let mut next = combo.clone();
                    next.insert(group.attribute.clone(), json!(label));
                    next
                })
            })
            .collect();
    }

    let rows = combos
        .into_iter()
        .enumerate()
        .map(|(r, mut row)| {
            for (i, field) in selections.fields.iter().enumerate() {
                let value = if field == "sparse" && r % 2 == 1 {
                    Value::Null
                } else {
                    json!(((i + 1) * 10 + r) as f64)
                };
                row.insert(field.clone(), value);
            }
            row
        })
        .collect();

    RawResult {
        dimensions,
        metrics: selections.fields.clone(),
        time_dimension,
        rows,
    }
}

/// One recorded call to [`ScriptedEngine`]
pub struct Call {
    pub selections: Selections,
    pub result_spec: Option<ResultSpec>,
    pub cancel: CancellationToken,
    responder: Option<oneshot::Sender<Result<RawResult, QueryError>>>,
}

/// Query engine whose responses are released by the test, in any order
#[derive(Default)]
pub struct ScriptedEngine {
    calls: Mutex<Vec<Call>>,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn selections(&self, index: usize) -> Selections {
        self.calls.lock()[index].selections.clone()
    }

    pub fn was_cancelled(&self, index: usize) -> bool {
        self.calls.lock()[index].cancel.is_cancelled()
    }

    pub fn respond(&self, index: usize, result: Result<RawResult, QueryError>) {
        let responder = self.calls.lock()[index]
            .responder
            .take()
            .unwrap_or_else(|| panic!("call {} already answered", index));
        // The task may already be gone if it was superseded
        let _ = responder.send(result);
    }

    /// Answer a call with the synthesized result for its selections
    pub fn respond_synth(&self, index: usize) {
        let raw = synth_raw(&self.selections(index));
        self.respond(index, Ok(raw));
    }
}

impl QueryEngine for ScriptedEngine {
    fn run(
        &self,
        selections: &Selections,
        result_spec: Option<&ResultSpec>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<RawResult, QueryError>> {
        let (tx, rx) = oneshot::channel();
        self.calls.lock().push(Call {
            selections: selections.clone(),
            result_spec: result_spec.cloned(),
            cancel,
            responder: Some(tx),
        });
        async move { rx.await.unwrap_or(Err(QueryError::Cancelled)) }.boxed()
    }
}

/// Issue an update and answer its query with synthesized data
pub async fn update_and_load<P: VisualizationPolicy>(
    reconciler: &vizrecon::Reconciler<P>,
    engine: &ScriptedEngine,
    selections: Selections,
    result_spec: ResultSpec,
) -> Snapshot<P::Data> {
    match reconciler.update(selections, result_spec) {
        Reconciliation::Query(task) => {
            engine.respond_synth(engine.call_count() - 1);
            match task.run().await {
                vizrecon::QueryOutcome::Applied(snapshot) => snapshot,
                _ => panic!("query should have been applied"),
            }
        }
        _ => panic!("expected a new query"),
    }
}
