//! Exercises and their aliases.

use super::entities::Exercise;
use super::guc::{col, Guc, Mutation};
use super::scope::Scope;
use machma_core::error::MachmaError;

impl Scope {
    pub async fn has_exercise(&mut self, exercise: &str) -> Result<bool, MachmaError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM exercises WHERE exercise_name = ?")
                .bind(exercise)
                .fetch_one(self.conn())
                .await
                .map_err(|e| MachmaError::Store(format!("exercise lookup failed: {e}")))?;
        Ok(count != 0)
    }

    /// Register an exercise together with its self-alias.
    ///
    /// The caller checks [`Scope::has_exercise`] first. An existing alias
    /// with the same name is not checked and makes the insert fail.
    pub async fn add_exercise(
        &mut self,
        exercise: &str,
        link: Option<&str>,
    ) -> Result<(), MachmaError> {
        sqlx::query("INSERT INTO exercises (exercise_name, exercise_link) VALUES (?, ?)")
            .bind(exercise)
            .bind(link)
            .execute(self.conn())
            .await
            .map_err(|e| MachmaError::Store(format!("insert exercise {exercise:?} failed: {e}")))?;
        self.add_alias(exercise, exercise).await
    }

    /// All exercises in the order they were added.
    pub async fn get_exercises(&mut self) -> Result<Vec<Exercise>, MachmaError> {
        sqlx::query_as::<_, Exercise>(
            "SELECT exercise_name, exercise_link FROM exercises ORDER BY rowid",
        )
        .fetch_all(self.conn())
        .await
        .map_err(|e| MachmaError::Store(format!("list exercises failed: {e}")))
    }

    /// Replace the link of an existing exercise.
    pub async fn set_exercise_link(
        &mut self,
        exercise: &str,
        link: Option<&str>,
    ) -> Result<Exercise, MachmaError> {
        let updated = Guc::<Exercise>::update(
            vec![col("exercise_name", exercise)],
            vec![Mutation::set("exercise_link", link)],
        )?
        .execute(self.conn())
        .await?;
        // Update-only requests either return the row or fail with NotFound.
        updated.ok_or_else(|| MachmaError::NotFound {
            entity: "exercises",
            keys: format!("exercise_name={exercise:?}"),
        })
    }

    pub async fn has_alias(&mut self, alias: &str) -> Result<bool, MachmaError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM exercise_aliases WHERE exercise_alias = ?")
                .bind(alias)
                .fetch_one(self.conn())
                .await
                .map_err(|e| MachmaError::Store(format!("alias lookup failed: {e}")))?;
        Ok(count != 0)
    }

    /// Point `alias` at `exercise`. The caller checks that the exercise
    /// exists and the alias does not.
    pub async fn add_alias(&mut self, alias: &str, exercise: &str) -> Result<(), MachmaError> {
        sqlx::query("INSERT INTO exercise_aliases (exercise_alias, exercise_name) VALUES (?, ?)")
            .bind(alias)
            .bind(exercise)
            .execute(self.conn())
            .await
            .map_err(|e| MachmaError::Store(format!("insert alias {alias:?} failed: {e}")))?;
        Ok(())
    }

    /// Resolve an alias to its canonical exercise name.
    pub async fn get_exercise_by_alias(
        &mut self,
        alias: &str,
    ) -> Result<Option<String>, MachmaError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT exercise_name FROM exercise_aliases WHERE exercise_alias = ?",
        )
        .bind(alias)
        .fetch_optional(self.conn())
        .await
        .map_err(|e| MachmaError::Store(format!("alias lookup failed: {e}")))?;
        Ok(row.map(|(name,)| name))
    }
}
