//! Run driver: walks every selected repository/deployment pair in order,
//! consults the pause controller, and either performs the requested control
//! action or runs the submission pipeline for the pair's queue bucket.
//!
//! Pairs are processed strictly sequentially so console output interleaves
//! deterministically and no two pipeline runs share a bucket binding.

use tracing::info;

use crate::config::{ControlAction, RunOptions};
use crate::contract::{Archive, ObjectStore};
use crate::control::Controller;
use crate::pipeline::{self, PipelineError};
use crate::store::bucket_name;

/// What happened for one repository/deployment pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairOutcome {
    /// Pipeline ran; this many submissions completed.
    Processed(usize),
    /// Pair is paused; pipeline skipped.
    Paused,
    /// `check` action: reported pause state.
    Checked { paused: bool },
    /// `clear` action: sentinels removed.
    Cleared,
    /// `pause` action; `already` when the pair was paused before.
    PauseRequested { already: bool },
    /// `resume` action; `already` when the pair was not paused.
    ResumeRequested { already: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairReport {
    pub repo: String,
    pub deployment: String,
    pub outcome: PairOutcome,
}

/// Per-pair outcomes of one invocation.
#[derive(Debug, Default)]
pub struct RunReport {
    pub pairs: Vec<PairReport>,
}

impl RunReport {
    /// Whether any pair actually ran the pipeline (as opposed to control
    /// actions or paused skips).
    pub fn ran_pipeline(&self) -> bool {
        self.pairs
            .iter()
            .any(|pair| matches!(pair.outcome, PairOutcome::Processed(_)))
    }

    /// Total completed submissions across all processed pairs.
    pub fn total_processed(&self) -> usize {
        self.pairs
            .iter()
            .map(|pair| match pair.outcome {
                PairOutcome::Processed(count) => count,
                _ => 0,
            })
            .sum()
    }
}

/// Process all selected repository/deployment combinations.
pub async fn run<S: ObjectStore, A: Archive>(
    options: &RunOptions,
    store: &S,
    archive: &A,
) -> Result<RunReport, PipelineError> {
    let controller = Controller::new(store);
    let mut report = RunReport::default();

    for repo in options.selected_repos() {
        for deployment in options.selected_deployments() {
            let queue = queue_label(&repo, &deployment, options.dry_run);
            let paused = controller.is_paused(&repo, &deployment).await;

            let outcome = match options.action {
                Some(ControlAction::Check) => {
                    let memo = if paused { "PAUSED" } else { "NOT PAUSED" };
                    println!("*** {memo} *** - {queue}");
                    PairOutcome::Checked { paused }
                }
                Some(ControlAction::Clear) => {
                    println!("*** CLEARING *** - {queue}");
                    controller.clear(&repo, &deployment).await;
                    PairOutcome::Cleared
                }
                Some(ControlAction::Pause) => {
                    if paused {
                        println!("*** ALREADY PAUSED *** - {queue}");
                    } else {
                        println!("*** PAUSING *** - {queue}");
                        controller.pause(&repo, &deployment).await;
                    }
                    PairOutcome::PauseRequested { already: paused }
                }
                Some(ControlAction::Resume) => {
                    if paused {
                        println!("*** RESUMING *** - {queue}");
                        controller.resume(&repo, &deployment).await;
                    } else {
                        println!("*** ALREADY NOT PAUSED *** - {queue}");
                    }
                    PairOutcome::ResumeRequested { already: !paused }
                }
                None if paused => {
                    println!("*** PAUSED *** - {queue}");
                    PairOutcome::Paused
                }
                None => {
                    let bucket = bucket_name(&repo, &deployment);
                    info!(repo = %repo, deployment = %deployment, bucket = %bucket, "processing queue");
                    let count = pipeline::process(store, archive, &bucket, options).await?;
                    println!("{count} {} PROCESSED - {queue}", pluralize("SUBMISSION", count));
                    PairOutcome::Processed(count)
                }
            };

            report.pairs.push(PairReport {
                repo: repo.clone(),
                deployment: deployment.clone(),
                outcome,
            });
        }
    }
    Ok(report)
}

fn queue_label(repo: &str, deployment: &str, dry_run: bool) -> String {
    let label = format!("{repo} QUEUE {deployment}").to_uppercase();
    if dry_run {
        format!("{label} [DRY RUN]")
    } else {
        label
    }
}

/// Upper-case aware plural suffix for console reporting.
fn pluralize(word: &str, count: usize) -> String {
    if count == 1 || word.is_empty() || word.to_lowercase().ends_with('s') {
        return word.to_string();
    }
    let suffix = if word.chars().last().is_some_and(char::is_uppercase) {
        "S"
    } else {
        "s"
    };
    format!("{word}{suffix}")
}
