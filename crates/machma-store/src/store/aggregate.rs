//! Rep aggregations over every exercise.
//!
//! Each query starts from `exercises` and left-joins the reps, so exercises
//! nobody has trained yet still show up with 0.

use machma_core::error::MachmaError;
use sqlx::SqliteConnection;
use std::collections::BTreeMap;

const MAX_REPS_SQL: &str = "SELECT e.exercise_name AS exercise_name, \
            MAX(COALESCE(r.reps, 0)) AS reps \
     FROM exercises e \
     LEFT OUTER JOIN user_reps r ON r.exercise_name = e.exercise_name \
     GROUP BY e.exercise_name";

const USER_REPS_SQL: &str = "SELECT e.exercise_name AS exercise_name, \
            COALESCE(r.reps, 0) AS reps \
     FROM exercises e \
     LEFT OUTER JOIN (SELECT exercise_name, reps FROM user_reps WHERE user_id = ?) r \
       ON r.exercise_name = e.exercise_name";

/// One of the three derived rep views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// Highest reps of any user, per exercise.
    MaxReps,
    /// The user's own reps, per exercise.
    UserReps(i64),
    /// Max reps minus the user's own reps, per exercise. Not clamped at 0.
    TodoReps(i64),
}

impl Aggregate {
    /// The query yielding `(exercise_name, reps)` rows.
    fn sql(&self) -> String {
        match self {
            Self::MaxReps => MAX_REPS_SQL.to_string(),
            Self::UserReps(_) => USER_REPS_SQL.to_string(),
            Self::TodoReps(_) => format!(
                "SELECT m.exercise_name AS exercise_name, m.reps - u.reps AS reps \
                 FROM ({MAX_REPS_SQL}) m \
                 JOIN ({USER_REPS_SQL}) u ON m.exercise_name = u.exercise_name"
            ),
        }
    }

    fn user_id(&self) -> Option<i64> {
        match self {
            Self::MaxReps => None,
            Self::UserReps(id) | Self::TodoReps(id) => Some(*id),
        }
    }

    /// Reps for every exercise, keyed by exercise name.
    pub async fn fetch_all(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<BTreeMap<String, i64>, MachmaError> {
        let sql = self.sql();
        let mut query = sqlx::query_as::<_, (String, i64)>(&sql);
        if let Some(user_id) = self.user_id() {
            query = query.bind(user_id);
        }
        let rows = query
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| MachmaError::Store(format!("{self:?} query failed: {e}")))?;
        Ok(rows.into_iter().collect())
    }

    /// Reps for a single exercise.
    ///
    /// Fails with [`MachmaError::ExerciseDoesNotExist`] when the exercise is
    /// not in the aggregate, i.e. not registered.
    pub async fn fetch_one(
        &self,
        conn: &mut SqliteConnection,
        exercise: &str,
    ) -> Result<i64, MachmaError> {
        let sql = format!(
            "SELECT reps FROM ({}) WHERE exercise_name = ?",
            self.sql()
        );
        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        if let Some(user_id) = self.user_id() {
            query = query.bind(user_id);
        }
        let row = query
            .bind(exercise)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| MachmaError::Store(format!("{self:?} query failed: {e}")))?;

        row.map(|(reps,)| reps)
            .ok_or_else(|| MachmaError::exercise_does_not_exist(exercise))
    }
}
