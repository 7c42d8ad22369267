use crate::WorkoutSessionID;

#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

#[derive(thiserror::Error, Debug)]
pub enum CreateError {
    #[error("conflict")]
    Conflict,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

impl From<ReadError> for CreateError {
    fn from(value: ReadError) -> Self {
        match value {
            ReadError::NotFound => CreateError::Other("not found".into()),
            ReadError::Storage(storage) => CreateError::Storage(storage),
            ReadError::Other(other) => CreateError::Other(other),
        }
    }
}

impl From<UpdateError> for CreateError {
    fn from(value: UpdateError) -> Self {
        match value {
            UpdateError::Storage(storage) => CreateError::Storage(storage),
            UpdateError::Other(other) => CreateError::Other(other),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum UpdateError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

/// Failure while finishing a workout session.
///
/// `Store` means nothing was written and the session can be finished again with the same id.
/// `Award` means the session is stored but its XP is not, and only the XP has to be awarded again.
#[derive(thiserror::Error, Debug)]
pub enum FinishError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("failed to store workout session {workout_session_id}: {source}")]
    Store {
        workout_session_id: WorkoutSessionID,
        source: CreateError,
    },
    #[error("workout session {workout_session_id} stored without awarding {xp_gained} XP: {source}")]
    Award {
        workout_session_id: WorkoutSessionID,
        xp_gained: u32,
        source: UpdateError,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("no connection")]
    NoConnection,
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}
