//! Batch coordinator
//!
//! Runs an [`ItemResolver`] over every input item with at most
//! `concurrency` resolutions in flight. Results are collected in
//! **completion order**, which generally differs from input order; the
//! input position of each result is kept so callers can restore it.
//! Progress is pushed to an optional [`ProgressSink`] after each settled
//! item and once more with `done: true` at the end.

use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use super::product_resolver::{ItemResolver, ProductResolver};
use crate::domain::{InputItem, ProgressSink, ProgressSnapshot, ResolutionResult, normalize_brand};
use crate::infrastructure::config::CrawlerConfig;
use crate::infrastructure::http_client::Transport;
use crate::infrastructure::parsing::ParsingResult;

/// Final counters of one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
    pub elapsed: Duration,
}

/// Everything a batch produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// One result per input item, in completion order
    pub results: Vec<ResolutionResult>,
    /// Input index of each entry of `results`
    #[serde(skip)]
    pub input_positions: Vec<usize>,
    pub stats: PipelineStats,
}

impl PipelineReport {
    /// Results rearranged into the order the items were submitted.
    pub fn in_input_order(&self) -> Vec<ResolutionResult> {
        let mut ordered: Vec<(usize, &ResolutionResult)> = self
            .input_positions
            .iter()
            .copied()
            .zip(&self.results)
            .collect();
        ordered.sort_by_key(|(position, _)| *position);
        ordered.into_iter().map(|(_, result)| result.clone()).collect()
    }
}

/// Result collection and counters, owned by the coordinator loop only
struct RunTally {
    total: usize,
    success: usize,
    errors: usize,
    results: Vec<ResolutionResult>,
    positions: Vec<usize>,
}

impl RunTally {
    fn new(total: usize) -> Self {
        Self {
            total,
            success: 0,
            errors: 0,
            results: Vec::with_capacity(total),
            positions: Vec::with_capacity(total),
        }
    }

    /// Append one result and count it in the same step.
    fn record(&mut self, position: usize, result: ResolutionResult) -> ProgressSnapshot {
        if result.is_success() {
            self.success += 1;
        } else {
            self.errors += 1;
        }
        self.results.push(result);
        self.positions.push(position);
        self.snapshot(false)
    }

    fn snapshot(&self, done: bool) -> ProgressSnapshot {
        ProgressSnapshot {
            current: self.results.len(),
            total: self.total,
            success: self.success,
            errors: self.errors,
            done,
        }
    }
}

pub struct CrawlingPipeline {
    resolver: Arc<dyn ItemResolver>,
    concurrency: usize,
}

impl CrawlingPipeline {
    pub fn new(resolver: Arc<dyn ItemResolver>, concurrency: usize) -> Self {
        Self {
            resolver,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(config: &CrawlerConfig, transport: Arc<dyn Transport>) -> ParsingResult<Self> {
        let resolver = ProductResolver::from_config(config, transport)?;
        Ok(Self::new(Arc::new(resolver), config.pipeline.concurrency))
    }

    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Resolve every item and return the results in completion order.
    ///
    /// Never fails: per-item problems (including a panicking resolver or
    /// a task that died) end up as error results and are counted in `errors`.
    pub async fn run(&self, items: Vec<InputItem>, sink: Option<&dyn ProgressSink>) -> PipelineReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("batch", %run_id, total = items.len());
        self.run_inner(items, sink).instrument(span).await
    }

    async fn run_inner(&self, items: Vec<InputItem>, sink: Option<&dyn ProgressSink>) -> PipelineReport {
        let started = Instant::now();
        let total = items.len();
        info!("🚀 Resolving {} items with concurrency {}", total, self.concurrency);

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut pending: HashMap<Id, (usize, InputItem)> = HashMap::with_capacity(total);

        for (position, item) in items.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let resolver = Arc::clone(&self.resolver);
            let task_item = item.clone();

            let handle = tasks.spawn(
                async move {
                    let _permit = semaphore.acquire_owned().await;
                    AssertUnwindSafe(resolver.resolve(&task_item))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|payload| {
                            let message = panic_message(payload.as_ref());
                            error!(
                                "💥 Resolver panicked on {} {}: {}",
                                task_item.brand, task_item.code, message
                            );
                            ResolutionResult::failed(
                                normalize_brand(&task_item.brand),
                                task_item.code.clone(),
                                format!("resolver panicked: {message}"),
                            )
                        })
                }
                .in_current_span(),
            );
            pending.insert(handle.id(), (position, item));
        }

        let mut tally = RunTally::new(total);
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, result)) => (id, Ok(result)),
                Err(e) => (e.id(), Err(e)),
            };
            let Some((position, item)) = pending.remove(&id) else {
                error!("Task {} finished but was never scheduled", id);
                continue;
            };

            let snapshot = tally.record(position, settle(outcome, &item));
            if let Some(sink) = sink {
                sink.notify(snapshot);
            }
        }

        let final_snapshot = tally.snapshot(true);
        if let Some(sink) = sink {
            sink.notify(final_snapshot);
        }

        let stats = PipelineStats {
            total,
            success: tally.success,
            errors: tally.errors,
            elapsed: started.elapsed(),
        };
        info!(
            "🏁 Batch complete: {} ok, {} errors in {:.1}s",
            stats.success,
            stats.errors,
            stats.elapsed.as_secs_f64()
        );

        PipelineReport {
            results: tally.results,
            input_positions: tally.positions,
            stats,
        }
    }
}

/// Result of a joined task; a task that died becomes an error result.
fn settle(outcome: Result<ResolutionResult, JoinError>, item: &InputItem) -> ResolutionResult {
    outcome.unwrap_or_else(|e| {
        error!("Resolver task for {} {} failed: {}", item.brand, item.code, e);
        ResolutionResult::failed(
            normalize_brand(&item.brand),
            item.code.clone(),
            format!("resolver task failed: {e}"),
        )
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
