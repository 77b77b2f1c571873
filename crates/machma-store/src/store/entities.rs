//! Row types for the four tables.

use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;

/// A row type that lives in one table.
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    const TABLE: &'static str;
}

/// An exercise, keyed by its case-sensitive name.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Exercise {
    pub exercise_name: String,
    pub exercise_link: Option<String>,
}

impl Entity for Exercise {
    const TABLE: &'static str = "exercises";
}

/// Alternate name resolving to an exercise. Every exercise is its own alias.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ExerciseAlias {
    pub exercise_alias: String,
    pub exercise_name: String,
}

impl Entity for ExerciseAlias {
    const TABLE: &'static str = "exercise_aliases";
}

/// A chat participant, keyed by the platform's numeric user id.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub user_id: i64,
    pub user_name: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl Entity for User {
    const TABLE: &'static str = "users";
}

/// Reps accumulated by one user for one exercise.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserReps {
    pub user_id: i64,
    pub exercise_name: String,
    pub reps: i64,
}

impl Entity for UserReps {
    const TABLE: &'static str = "user_reps";
}
