//! Requery / rebuild / no-op decisions

use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::error::ReconcileError;
use super::state::{Pending, QueryStatus, Snapshot, State};
use crate::engine::{QueryEngine, QueryError, RawResult};
use crate::query::Selections;
use crate::result_spec::ResultSpec;
use crate::visualization::VisualizationPolicy;

/// Decision taken by [`Reconciler::update`]
pub enum Reconciliation<P: VisualizationPolicy> {
    /// Nothing relevant changed; the result data is the same `Arc` as before
    Unchanged(Snapshot<P::Data>),
    /// Result data was recomputed locally from the stored raw result
    Rebuilt(Snapshot<P::Data>),
    /// A new query was issued; drive the task to apply its result
    Query(QueryTask<P>),
}

impl<P: VisualizationPolicy> Reconciliation<P> {
    pub fn is_query(&self) -> bool {
        matches!(self, Reconciliation::Query(_))
    }

    pub fn is_rebuild(&self) -> bool {
        matches!(self, Reconciliation::Rebuilt(_))
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Reconciliation::Unchanged(_))
    }

    /// Complete the decision: run the query if one was issued
    pub async fn settle(self) -> Snapshot<P::Data> {
        match self {
            Reconciliation::Unchanged(snapshot) | Reconciliation::Rebuilt(snapshot) => snapshot,
            Reconciliation::Query(task) => {
                let state = Arc::clone(&task.guard.state);
                match task.run().await {
                    QueryOutcome::Applied(snapshot) | QueryOutcome::Failed(snapshot) => snapshot,
                    QueryOutcome::Superseded => state.lock().snapshot(),
                }
            }
        }
    }
}

/// How an issued query ended
pub enum QueryOutcome<D> {
    /// The result was current and is now the loaded state
    Applied(Snapshot<D>),
    /// The result was current but failed; last good data is kept
    Failed(Snapshot<D>),
    /// A newer query or a cancellation replaced this one; its result was discarded
    Superseded,
}

/// An issued query, waiting to be driven
///
/// Awaiting [`run`](Self::run) (directly or on a spawned task) performs the
/// fetch and applies the result only if no newer query was issued meanwhile.
/// Dropping the task, or the future of `run`, before it completes abandons
/// the query as [`Reconciler::cancel`] would.
pub struct QueryTask<P: VisualizationPolicy> {
    fetch: BoxFuture<'static, Result<RawResult, QueryError>>,
    cancel: CancellationToken,
    guard: PendingGuard<P>,
}

impl<P: VisualizationPolicy> QueryTask<P> {
    pub fn generation(&self) -> u64 {
        self.guard.generation
    }

    pub async fn run(self) -> QueryOutcome<P::Data> {
        let QueryTask { fetch, cancel, guard } = self;
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = fetch => Some(result),
        };
        match result {
            Some(result) => apply(&*guard.policy, &*guard.state, guard.generation, result),
            None => {
                tracing::trace!(
                    visualization = %guard.policy.visualization(),
                    generation = guard.generation,
                    "query cancelled before completion"
                );
                QueryOutcome::Superseded
            }
        }
    }
}

/// Releases the pending token of a query that never reached `apply`
struct PendingGuard<P: VisualizationPolicy> {
    generation: u64,
    policy: Arc<P>,
    state: Arc<Mutex<State<P::Data>>>,
}

impl<P: VisualizationPolicy> Drop for PendingGuard<P> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if !state.is_current(self.generation) {
            return;
        }
        release_pending(&*self.policy, &mut *state);
        tracing::debug!(
            visualization = %self.policy.visualization(),
            generation = self.generation,
            "query dropped before completion"
        );
    }
}

/// Abandon the in-flight query and return to the inputs and status it replaced.
///
/// Returns the generation of the abandoned query, if there was one.
fn release_pending<P: VisualizationPolicy>(policy: &P, state: &mut State<P::Data>) -> Option<u64> {
    let pending = state.pending.take()?;
    pending.cancel.cancel();
    state.status = pending.prior_status;
    state.selections = pending.prior_selections;
    let latest_spec = std::mem::replace(&mut state.result_spec, pending.prior_result_spec);
    // Display changes made while loading were already applied to the data
    if let (Some(restored), Some(latest)) = (&state.result_spec, &latest_spec) {
        if policy.should_rebuild_query_result(restored, Some(latest)) {
            rebuild(policy, state);
        }
    }
    Some(pending.generation)
}

fn apply<P: VisualizationPolicy>(
    policy: &P,
    state: &Mutex<State<P::Data>>,
    generation: u64,
    result: Result<RawResult, QueryError>,
) -> QueryOutcome<P::Data> {
    let viz = policy.visualization();
    let mut state = state.lock();
    if !state.is_current(generation) {
        tracing::trace!(
            visualization = %viz,
            generation,
            current = state.generation,
            "discarding stale response"
        );
        return QueryOutcome::Superseded;
    }
    state.pending = None;

    let raw = match result {
        Ok(raw) => Arc::new(raw),
        Err(err) => {
            tracing::warn!(visualization = %viz, generation, error = %err, "query failed");
            state.status = QueryStatus::Errored(ReconcileError::Query(err));
            return QueryOutcome::Failed(state.snapshot());
        }
    };

    // Derive with the newest spec, which may have changed while loading
    let spec = state.result_spec.clone().unwrap_or_default();
    let derived = policy.deserialize(&raw, &spec);
    state.raw = Some(raw);
    match derived {
        Ok(data) => {
            tracing::info!(visualization = %viz, generation, "query result loaded");
            state.data = Some(Arc::new(data));
            state.status = QueryStatus::Loaded;
            QueryOutcome::Applied(state.snapshot())
        }
        Err(err) => {
            tracing::warn!(
                visualization = %viz,
                generation,
                error = %err,
                "could not derive result data"
            );
            state.status = QueryStatus::Errored(ReconcileError::Data(err));
            QueryOutcome::Failed(state.snapshot())
        }
    }
}

/// Per-visualization reconciliation engine
///
/// Holds the last requested selections and result spec, the raw result and
/// result data they produced, and the token of the in-flight query. Only
/// this type mutates that state.
pub struct Reconciler<P: VisualizationPolicy> {
    policy: Arc<P>,
    engine: Arc<dyn QueryEngine>,
    state: Arc<Mutex<State<P::Data>>>,
}

impl<P: VisualizationPolicy> Reconciler<P> {
    pub fn new(policy: P, engine: Arc<dyn QueryEngine>) -> Self {
        Self {
            policy: Arc::new(policy),
            engine,
            state: Arc::new(Mutex::new(State::new())),
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn snapshot(&self) -> Snapshot<P::Data> {
        self.state.lock().snapshot()
    }

    /// Reconcile new inputs against the stored ones
    ///
    /// 1. A new query supersedes everything else, including a rebuild.
    /// 2. Otherwise display-relevant result spec changes rebuild the result data locally.
    /// 3. Otherwise nothing happens and the current snapshot is returned.
    pub fn update(&self, selections: Selections, result_spec: ResultSpec) -> Reconciliation<P> {
        let viz = self.policy.visualization();
        let mut state = self.state.lock();

        let prev = state.selections.as_ref().zip(state.result_spec.as_ref());
        if self.policy.should_run_new_query(&selections, &result_spec, prev) {
            tracing::debug!(visualization = %viz, "inputs changed the query, issuing a new one");
            return Reconciliation::Query(self.issue(&mut state, selections, result_spec));
        }

        let needs_rebuild = self
            .policy
            .should_rebuild_query_result(&result_spec, state.result_spec.as_ref());
        state.result_spec = Some(result_spec);
        if needs_rebuild {
            tracing::debug!(visualization = %viz, "display inputs changed, rebuilding result data");
            rebuild(&*self.policy, &mut *state);
            return Reconciliation::Rebuilt(state.snapshot());
        }

        Reconciliation::Unchanged(state.snapshot())
    }

    /// Re-issue the last requested query regardless of the predicates.
    ///
    /// Returns `None` before the first update.
    pub fn retry(&self) -> Option<QueryTask<P>> {
        let mut state = self.state.lock();
        let selections = state.selections.clone()?;
        let result_spec = state.result_spec.clone()?;
        tracing::debug!(visualization = %self.policy.visualization(), "retrying last query");
        Some(self.issue(&mut state, selections, result_spec))
    }

    /// Cancel the in-flight query, if any, and restore the inputs and status it replaced.
    ///
    /// Returns whether a query was pending.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        let Some(generation) = release_pending(&*self.policy, &mut *state) else {
            return false;
        };
        tracing::debug!(
            visualization = %self.policy.visualization(),
            generation,
            "cancelled in-flight query"
        );
        true
    }

    fn issue(
        &self,
        state: &mut State<P::Data>,
        selections: Selections,
        result_spec: ResultSpec,
    ) -> QueryTask<P> {
        let (prior_status, prior_selections, prior_result_spec) = match state.pending.take() {
            Some(superseded) => {
                superseded.cancel.cancel();
                tracing::trace!(
                    visualization = %self.policy.visualization(),
                    generation = superseded.generation,
                    "superseding in-flight query"
                );
                (superseded.prior_status, superseded.prior_selections, superseded.prior_result_spec)
            }
            None => (state.status.clone(), state.selections.take(), state.result_spec.take()),
        };

        state.generation += 1;
        let generation = state.generation;
        let cancel = CancellationToken::new();
        let prepared = self.policy.prepare_selections(&selections, &result_spec);
        let fetch = self.engine.run(&prepared, Some(&result_spec), cancel.clone());

        state.selections = Some(selections);
        state.result_spec = Some(result_spec);
        state.status = QueryStatus::Loading;
        state.pending = Some(Pending {
            generation,
            cancel: cancel.clone(),
            prior_status,
            prior_selections,
            prior_result_spec,
        });

        QueryTask {
            fetch,
            cancel,
            guard: PendingGuard {
                generation,
                policy: Arc::clone(&self.policy),
                state: Arc::clone(&self.state),
            },
        }
    }
}

/// Recompute result data from the stored raw result and spec.
///
/// Without a raw result there is nothing to rebuild; an in-flight query
/// derives with the newest spec when it lands.
fn rebuild<P: VisualizationPolicy>(policy: &P, state: &mut State<P::Data>) {
    let (Some(raw), Some(spec)) = (state.raw.clone(), state.result_spec.clone()) else {
        return;
    };
    match policy.deserialize(&raw, &spec) {
        Ok(data) => {
            state.data = Some(Arc::new(data));
            if matches!(state.status, QueryStatus::Errored(ReconcileError::Data(_))) {
                state.status = QueryStatus::Loaded;
            }
        }
        Err(err) => {
            tracing::warn!(
                visualization = %policy.visualization(),
                error = %err,
                "could not rebuild result data"
            );
            if state.pending.is_none() {
                state.status = QueryStatus::Errored(ReconcileError::Data(err));
            }
        }
    }
}
