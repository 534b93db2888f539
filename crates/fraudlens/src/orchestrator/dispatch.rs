//! Per-batch dispatcher and the task wrapped around each analyzer call.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::OwnedSemaphorePermit;
use tokio::task::JoinError;
use tracing::Instrument;

use crate::analyzer::AnalysisInput;
use crate::job::{AnalysisError, AnalysisRequest, Description, JobState};
use crate::orchestrator::Shared;

struct Dispatch {
    job_id: String,
    sequence: usize,
    request: Arc<AnalysisRequest>,
    description: Description,
}

/// Starts queued jobs of `batch_id` in submission order, one per permit.
///
/// Exits once the batch is replaced, cancelled, or has nothing left queued.
pub(crate) async fn run_dispatcher(shared: Arc<Shared>, batch_id: String) {
    debug!("Dispatcher for batch {} started", batch_id);

    loop {
        let permit = match Arc::clone(&shared.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Analysis permits closed, dispatcher for {} exiting", batch_id);
                let mut state = shared.lock_state();
                if state.batch.id == batch_id {
                    state.batch.dispatcher_active = false;
                }
                return;
            }
        };

        let next = {
            let mut state = shared.lock_state();
            if state.batch.id != batch_id {
                debug!("Batch {} was replaced, dispatcher exiting", batch_id);
                return;
            }
            if state.batch.cancelled {
                debug!("Batch {} was cancelled, dispatcher exiting", batch_id);
                state.batch.dispatcher_active = false;
                return;
            }

            let description = state.batch.description.clone();
            let Some(job) = state
                .batch
                .jobs
                .iter_mut()
                .filter(|j| j.state() == JobState::Queued)
                .min_by_key(|j| j.sequence)
            else {
                debug!("Batch {} has no queued jobs left", batch_id);
                state.batch.dispatcher_active = false;
                return;
            };

            if let Err(e) = job.start() {
                // Unreachable while the state lock is held, but never dispatch twice
                warn!("Skipping job {}: {}", job.id, e);
                continue;
            }
            let next = Dispatch {
                job_id: job.id.clone(),
                sequence: job.sequence,
                request: Arc::clone(&job.request),
                description,
            };
            shared.publish(&mut state);
            next
        };

        shared
            .runtime
            .spawn(run_analysis(Arc::clone(&shared), batch_id.clone(), next, permit));
    }
}

async fn run_analysis(
    shared: Arc<Shared>,
    batch_id: String,
    dispatch: Dispatch,
    permit: OwnedSemaphorePermit,
) {
    let span = tracing::info_span!(
        "analyze",
        job_id = %dispatch.job_id,
        file = %dispatch.request.display_name,
        sequence = dispatch.sequence,
    );

    let analyzer = Arc::clone(&shared.analyzer);
    let request = Arc::clone(&dispatch.request);
    let description = dispatch.description.clone();
    let sequence = dispatch.sequence;
    // A panicking analyzer only takes down its own task
    let mut call = shared.runtime.spawn(
        async move {
            analyzer
                .analyze(AnalysisInput {
                    request: &request,
                    description: &description,
                    sequence,
                })
                .await
        }
        .instrument(span),
    );

    let timeout = shared.config.analyzer_timeout;
    let outcome = match tokio::time::timeout(timeout, &mut call).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => Err(AnalysisError::internal(describe_join_error(join_error))),
        Err(_) => {
            call.abort();
            Err(AnalysisError::timeout(format!(
                "no result after {} ms",
                timeout.as_millis()
            )))
        }
    };

    {
        let mut state = shared.lock_state();
        if state.batch.id != batch_id {
            debug!(
                "Discarding late result for job {} of replaced batch {}",
                dispatch.job_id, batch_id
            );
            return;
        }
        let Some(job) = state.batch.jobs.iter_mut().find(|j| j.id == dispatch.job_id) else {
            debug!("Discarding result for superseded job {}", dispatch.job_id);
            return;
        };

        let applied = match outcome {
            Ok(result) => job.succeed(result),
            Err(error) => {
                warn!(
                    "Analysis of {} failed: {}",
                    dispatch.request.display_name, error
                );
                job.fail(error)
            }
        };

        match applied {
            Ok(()) => {
                if let Some(error) = job.error() {
                    debug!("Job {} ended as {}", dispatch.job_id, error.kind);
                }
                shared.publish(&mut state);
            }
            Err(e) => debug!("Discarding late result: {}", e),
        }
    }

    // Released only after the transition is visible to observers
    drop(permit);
}

fn describe_join_error(error: JoinError) -> String {
    match error.try_into_panic() {
        Ok(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            format!("analyzer panicked: {}", message)
        }
        Err(error) => format!("analyzer task did not complete: {}", error),
    }
}
