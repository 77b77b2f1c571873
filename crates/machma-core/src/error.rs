use thiserror::Error;

/// Top-level error type for machma.
#[derive(Debug, Error)]
pub enum MachmaError {
    /// A user id that is not registered in the store.
    #[error("user {user_id}{}", detail(.message))]
    UserDoesNotExist {
        user_id: i64,
        message: Option<String>,
    },

    /// An exercise name that is not registered in the store.
    #[error("exercise {exercise:?}{}", detail(.message))]
    ExerciseDoesNotExist {
        exercise: String,
        message: Option<String>,
    },

    /// A keyed lookup that expected exactly one row and found none.
    #[error("no {entity} row matching {keys}")]
    NotFound { entity: &'static str, keys: String },

    /// A request that was put together wrong by the caller.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Storage error.
    #[error("store error: {0}")]
    Store(String),

    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

impl MachmaError {
    pub fn user_does_not_exist(user_id: i64) -> Self {
        Self::UserDoesNotExist {
            user_id,
            message: None,
        }
    }

    pub fn exercise_does_not_exist(exercise: impl Into<String>) -> Self {
        Self::ExerciseDoesNotExist {
            exercise: exercise.into(),
            message: None,
        }
    }
}

fn detail(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {m}"),
        None => String::new(),
    }
}
