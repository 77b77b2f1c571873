//! # machma-store
//!
//! SQLite-backed store for exercises, aliases, users, and their reps.

pub mod store;

pub use store::{
    aggregate::Aggregate,
    entities::{Entity, Exercise, ExerciseAlias, User, UserReps},
    guc::{col, Action, Column, Guc, Mutation, Value},
    scope::Scope,
    Store, StoreStats,
};
