use sigil_primitives::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
	#[error("deployment {0} not found")]
	NotFound(uuid::Uuid),
	#[error("deployment {0} is already completed")]
	AlreadyCompleted(uuid::Uuid),
	#[error("no executor registered for stage {0:?}")]
	NoExecutor(sigil_primitives::Stage),
	#[error("stage {stage:?} failed after {attempts} attempts: {source}")]
	StageFailed { stage: sigil_primitives::Stage, attempts: u32, source: Box<dyn std::error::Error + Send + Sync> },
	#[error(transparent)]
	Repository(#[from] sigil_repository::RepositoryError),
}

impl From<OrchestratorError> for ErrorKind {
	fn from(err: OrchestratorError) -> Self {
		match err {
			OrchestratorError::NotFound(id) => ErrorKind::NotFound(format!("deployment {id}")),
			OrchestratorError::AlreadyCompleted(id) => ErrorKind::Conflict(format!("deployment {id} already completed")),
			OrchestratorError::NoExecutor(stage) => ErrorKind::Internal(format!("no executor for {stage:?}")),
			OrchestratorError::StageFailed { stage, attempts, source } => {
				ErrorKind::Internal(format!("{stage:?} failed after {attempts} attempts: {source}"))
			}
			OrchestratorError::Repository(err) => err.into(),
		}
	}
}
