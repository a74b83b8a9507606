use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex};
use std::thread;

use tracing::{debug, error};

use crate::engine::llm_client::GenerationClient;
use crate::engine::protocol::{GenerationJob, GenerationOutcome};
use crate::error::GenerationError;

/// Narratives by intent id, or the first failure in job order.
pub type NarrativeResult = Result<HashMap<String, String>, (String, GenerationError)>;

/// Runs every job on at most `max_concurrency` threads.
/// Completion order is irrelevant: results are keyed by intent id and a
/// failure is reported for the earliest failed job in submission order.
/// Queued jobs are dropped once any call fails.
pub fn generate_narratives(
    client: &dyn GenerationClient,
    jobs: Vec<GenerationJob>,
    max_concurrency: usize,
) -> NarrativeResult {
    let order: Vec<String> = jobs.iter().map(|job| job.intent_id.clone()).collect();
    let workers = max_concurrency.max(1).min(jobs.len());

    let queue = Mutex::new(VecDeque::from(jobs));
    let failed = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<GenerationOutcome>();

    thread::scope(|scope| {
        for worker in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            let failed = &failed;

            scope.spawn(move || loop {
                if failed.load(Ordering::SeqCst) {
                    break;
                }
                let job = match queue.lock() {
                    Ok(mut pending) => pending.pop_front(),
                    Err(_) => None,
                };
                let Some(job) = job else { break };

                debug!(worker, intent_id = %job.intent_id, "generating narrative");
                let result = client.generate(&job.messages);
                if result.is_err() {
                    failed.store(true, Ordering::SeqCst);
                }

                if tx
                    .send(GenerationOutcome {
                        intent_id: job.intent_id,
                        result,
                    })
                    .is_err()
                {
                    break;
                }
            });
        }
    });
    drop(tx);

    let mut narratives = HashMap::new();
    let mut failures = HashMap::new();
    for outcome in rx {
        match outcome.result {
            Ok(text) => {
                narratives.insert(outcome.intent_id, text);
            }
            Err(e) => {
                error!(intent_id = %outcome.intent_id, error = %e, "narrative generation failed");
                failures.insert(outcome.intent_id, e);
            }
        }
    }

    if let Some(id) = order.iter().find(|id| failures.contains_key(*id)) {
        if let Some(e) = failures.remove(id) {
            return Err((id.clone(), e));
        }
    }

    Ok(narratives)
}
