//! Batch test generation: one compile-only cycle per spec segment.

use std::fmt;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::segment::{split_segments, test_file_name};
use crate::cycle::{CycleOutcome, CycleRequest, VerifyMode, run_cycle};
use crate::io::config::LoopConfig;
use crate::io::model::Model;
use crate::io::prompt::{Flow, PromptEngine};
use crate::io::verify::Verifier;
use crate::io::workspace::Workspace;

/// A segment's generation was declared impossible, aborting the batch.
#[derive(Debug, Clone)]
pub struct SegmentImpossibleError {
    pub segment: usize,
    pub reason: String,
}

impl fmt::Display for SegmentImpossibleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code Generation is impossible.{}", self.reason)
    }
}

impl std::error::Error for SegmentImpossibleError {}

/// Outcome of one segment's cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentReport {
    /// 1-based segment index in document order.
    pub index: usize,
    /// Workspace-relative artifact path.
    pub target: String,
    pub outcome: CycleOutcome,
}

/// Outcomes of every processed segment, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub segments: Vec<SegmentReport>,
}

impl BatchOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.segments.iter().all(|s| s.outcome.succeeded())
    }

    /// Segments whose retry budget ran out, in document order.
    pub fn exhausted(&self) -> Vec<&SegmentReport> {
        self.segments
            .iter()
            .filter(|s| matches!(s.outcome, CycleOutcome::Exhausted { .. }))
            .collect()
    }
}

/// Generate one test file per segment of the configured spec document.
///
/// Segments run strictly in order, each with its own conversation log, retry
/// budget, and artifact path derived from its 1-based index. A declared
/// impossibility aborts the remaining segments ([`SegmentImpossibleError`]);
/// an exhausted retry budget is recorded in the report and processing
/// continues with the next segment.
pub fn run_batch<M: Model, V: Verifier>(
    workspace: &Workspace,
    model: &M,
    verifier: &V,
    engine: &PromptEngine,
    config: &LoopConfig,
) -> Result<BatchOutcome> {
    let document = workspace
        .read_file(&config.spec_file)
        .context("read specification document")?;
    let segments = split_segments(&document);
    info!(
        segments = segments.len(),
        spec = %config.spec_file,
        "starting batch test generation"
    );

    let mut reports = Vec::with_capacity(segments.len());
    for (i, segment) in segments.iter().enumerate() {
        let index = i + 1;
        let name = test_file_name(&config.test_file_pattern, index);
        let target = format!("{}/{}", config.test_dir.trim_end_matches('/'), name);
        let request = CycleRequest {
            target: target.clone(),
            input: segment.clone(),
            flow: Flow::TestCase,
            mode: VerifyMode::CompileOnly,
        };
        let outcome = run_cycle(workspace, model, verifier, engine, &request)
            .with_context(|| format!("generate segment {index}"))?;
        match &outcome {
            CycleOutcome::Impossible { reason } => {
                return Err(SegmentImpossibleError {
                    segment: index,
                    reason: reason.clone(),
                }
                .into());
            }
            CycleOutcome::Exhausted { .. } => {
                warn!(
                    segment = index,
                    target = %target,
                    "retry budget exhausted, continuing with next segment"
                );
            }
            CycleOutcome::Succeeded { .. } => {}
        }
        reports.push(SegmentReport {
            index,
            target,
            outcome,
        });
    }
    Ok(BatchOutcome { segments: reports })
}
