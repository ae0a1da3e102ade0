//! Deployment status and stage state machine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
	Pending,
	Running,
	Paused,
	Completed,
	Failed,
}

impl DeploymentStatus {
	/// Statuses `determineStartStage` treats as resumable (re-enter the last
	/// persisted stage rather than restarting at `Init`).
	pub fn is_resumable(&self) -> bool {
		matches!(self, DeploymentStatus::Paused | DeploymentStatus::Running | DeploymentStatus::Failed)
	}
}

/// One step of the deployment state machine, in a fixed linear order.
/// Transitions are monotonic forward except `Failed`, from which the
/// deployment may resume at its last completed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	Init,
	Superchain,
	Implementations,
	OpChain,
	AltDa,
	Genesis,
	StartBlock,
	Completed,
}

/// The canonical stage order; every orchestrator traversal indexes into this.
pub const STAGE_ORDER: [Stage; 8] = [
	Stage::Init,
	Stage::Superchain,
	Stage::Implementations,
	Stage::OpChain,
	Stage::AltDa,
	Stage::Genesis,
	Stage::StartBlock,
	Stage::Completed,
];

/// Thin wrapper giving index/progress helpers over [`STAGE_ORDER`].
pub struct StageOrder;

impl StageOrder {
	pub fn index_of(stage: Stage) -> usize {
		STAGE_ORDER
			.iter()
			.position(|s| *s == stage)
			.expect("STAGE_ORDER is exhaustive over Stage")
	}

	pub fn next(stage: Stage) -> Option<Stage> {
		let idx = Self::index_of(stage);
		STAGE_ORDER.get(idx + 1).copied()
	}

	/// Progress in `[0.0, 1.0]`, computed as `i / (total - 1)` per spec 4.8.
	pub fn progress(stage: Stage) -> f64 {
		let idx = Self::index_of(stage);
		let total = STAGE_ORDER.len();
		idx as f64 / (total - 1) as f64
	}

	pub fn first() -> Stage {
		STAGE_ORDER[0]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn progress_spans_zero_to_one() {
		assert_eq!(StageOrder::progress(Stage::Init), 0.0);
		assert_eq!(StageOrder::progress(Stage::Completed), 1.0);
	}

	#[test]
	fn next_walks_the_fixed_order() {
		assert_eq!(StageOrder::next(Stage::Init), Some(Stage::Superchain));
		assert_eq!(StageOrder::next(Stage::Completed), None);
	}
}
