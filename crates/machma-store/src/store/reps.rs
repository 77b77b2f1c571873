//! Rep queries and rep accounting.

use super::aggregate::Aggregate;
use super::entities::UserReps;
use super::guc::{col, Column, Guc, Mutation};
use super::scope::Scope;
use machma_core::error::MachmaError;
use std::collections::BTreeMap;
use tracing::debug;

impl Scope {
    pub async fn get_max_reps(&mut self) -> Result<BTreeMap<String, i64>, MachmaError> {
        Aggregate::MaxReps.fetch_all(self.conn()).await
    }

    pub async fn get_max_reps_for_exercise(&mut self, exercise: &str) -> Result<i64, MachmaError> {
        Aggregate::MaxReps.fetch_one(self.conn(), exercise).await
    }

    pub async fn get_user_reps(
        &mut self,
        user_id: i64,
    ) -> Result<BTreeMap<String, i64>, MachmaError> {
        self.require_user(user_id).await?;
        Aggregate::UserReps(user_id).fetch_all(self.conn()).await
    }

    pub async fn get_user_reps_for_exercise(
        &mut self,
        user_id: i64,
        exercise: &str,
    ) -> Result<i64, MachmaError> {
        self.require_user(user_id).await?;
        Aggregate::UserReps(user_id)
            .fetch_one(self.conn(), exercise)
            .await
    }

    pub async fn get_user_todo_reps(
        &mut self,
        user_id: i64,
    ) -> Result<BTreeMap<String, i64>, MachmaError> {
        self.require_user(user_id).await?;
        Aggregate::TodoReps(user_id).fetch_all(self.conn()).await
    }

    pub async fn get_user_todo_reps_for_exercise(
        &mut self,
        user_id: i64,
        exercise: &str,
    ) -> Result<i64, MachmaError> {
        self.require_user(user_id).await?;
        Aggregate::TodoReps(user_id)
            .fetch_one(self.conn(), exercise)
            .await
    }

    /// The raw reps row of a user for an exercise, if any was ever recorded.
    pub async fn get_user_reps_row(
        &mut self,
        user_id: i64,
        exercise: &str,
    ) -> Result<Option<UserReps>, MachmaError> {
        Guc::<UserReps>::get(reps_keys(user_id, exercise))?
            .execute(self.conn())
            .await
    }

    /// Add `reps` to the user's count for `exercise`, creating the row on
    /// the first contribution.
    pub async fn add_to_user_reps(
        &mut self,
        user_id: i64,
        exercise: &str,
        reps: u32,
    ) -> Result<UserReps, MachmaError> {
        if !self.has_exercise(exercise).await? {
            return Err(MachmaError::exercise_does_not_exist(exercise));
        }
        let row = Guc::<UserReps>::update_or_create(
            reps_keys(user_id, exercise),
            vec![Mutation::add("reps", i64::from(reps))],
            vec![col("reps", reps)],
        )?
        .execute(self.conn())
        .await?
        .ok_or_else(|| MachmaError::Store(format!("reps row for {user_id} vanished")))?;

        debug!("user {user_id} +{reps} {exercise} = {}", row.reps);
        Ok(row)
    }
}

fn reps_keys(user_id: i64, exercise: &str) -> Vec<Column> {
    vec![col("user_id", user_id), col("exercise_name", exercise)]
}
