//! Checkpoint Verifier
//!
//! Fixed progress checkpoints over a parsed plan: ceil(50%) and
//! ceil(80%) of the step count (deduplicated) plus the final step.
//! Each carries a distinct instruction category; cross-cutting add-ons
//! append extra instructions without replacing the primary one.

use serde::Serialize;

/// Instruction category for a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckpointKind {
    /// Mid-plan progress review
    ProgressReview,
    /// Late-plan decomposition of remaining work
    DecomposeRemaining,
    /// Final approve/reject verification
    FinalApproval,
}

impl CheckpointKind {
    /// Primary instruction for this category
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::ProgressReview => {
                "Pause and review progress: compare the completed steps against the plan, \
                 confirm earlier outputs still hold, and correct course before continuing."
            }
            Self::DecomposeRemaining => {
                "Decompose the remaining work: break each unfinished step into concrete \
                 sub-tasks and confirm nothing depends on an unverified assumption."
            }
            Self::FinalApproval => {
                "Final verification: check the full result against the plan and explicitly \
                 approve or reject it."
            }
        }
    }
}

/// A fixed progress checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    /// 1-based step index at which this checkpoint fires
    pub step: usize,
    /// Instruction category
    pub kind: CheckpointKind,
}

/// Optional cross-cutting verification add-ons
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct VerifyOptions {
    /// Append an interface-contract review to each due checkpoint
    pub interface_review: bool,
    /// Append a layout/visual review to each due checkpoint
    pub layout_review: bool,
}

/// A checkpoint instruction emitted for the caller
#[derive(Debug, Clone, Serialize)]
pub struct VerificationInstruction {
    /// Step index the checkpoint fires at
    pub step: usize,
    /// Instruction category
    pub kind: CheckpointKind,
    /// Primary instruction text
    pub instruction: String,
    /// Add-on instructions, never replacing the primary
    pub addons: Vec<String>,
}

/// Compute the fixed checkpoints for a plan of `total` steps
pub fn checkpoints(total: usize) -> Vec<Checkpoint> {
    if total == 0 {
        return Vec::new();
    }

    let half = total.div_ceil(2);
    let four_fifths = (total * 4).div_ceil(5);

    let mut points = Vec::new();
    if half < total {
        points.push(Checkpoint {
            step: half,
            kind: CheckpointKind::ProgressReview,
        });
    }
    if four_fifths != half && four_fifths < total {
        points.push(Checkpoint {
            step: four_fifths,
            kind: CheckpointKind::DecomposeRemaining,
        });
    }
    points.push(Checkpoint {
        step: total,
        kind: CheckpointKind::FinalApproval,
    });
    points
}

/// Instructions for checkpoints reached by the completed step set
///
/// Stateless: `completed` is supplied by the caller on every call, and
/// the caller is responsible for not re-running instructions it has
/// already acted on.
pub fn due_instructions(total: usize, completed: &[usize], options: &VerifyOptions) -> Vec<VerificationInstruction> {
    checkpoints(total)
        .into_iter()
        .filter(|cp| completed.contains(&cp.step))
        .map(|cp| {
            let mut addons = Vec::new();
            if options.interface_review {
                addons.push(
                    "Additionally review every public interface touched by the completed steps for contract changes."
                        .to_string(),
                );
            }
            if options.layout_review {
                addons.push("Additionally review layout and visual structure against the intended design.".to_string());
            }
            VerificationInstruction {
                step: cp.step,
                kind: cp.kind,
                instruction: cp.kind.instruction().to_string(),
                addons,
            }
        })
        .collect()
}
