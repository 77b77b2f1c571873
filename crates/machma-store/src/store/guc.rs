//! Get, then update or create: the keyed upsert used by the domain API.
//!
//! A [`Guc`] names one row of an [`Entity`] by its key columns and says what
//! to do with it:
//!
//! | update | create | or_none | row present      | row missing   |
//! |--------|--------|---------|------------------|---------------|
//! | -      | -      | -       | return it        | `None`        |
//! | -      | yes    | -       | return it        | insert        |
//! | yes    | -      | -       | update           | `NotFound`    |
//! | yes    | yes    | -       | update           | insert        |
//! | yes    | -      | yes     | update           | `None`        |
//!
//! Invalid combinations are rejected by [`Guc::new`] before anything touches
//! the database. The select and the write run on the caller's connection;
//! wrap them in a [`Scope`](super::scope::Scope) to make them atomic.

use super::entities::Entity;
use machma_core::error::MachmaError;
use sqlx::query::{Query, QueryAs};
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::SqliteConnection;
use std::fmt;
use std::marker::PhantomData;

/// A column value bound into a GUC statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Text(Option<String>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(Some(s)) => write!(f, "{s:?}"),
            Self::Text(None) => f.write_str("NULL"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(Some(v.to_string()))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(Some(v))
    }
}

impl From<Option<&str>> for Value {
    fn from(v: Option<&str>) -> Self {
        Self::Text(v.map(str::to_string))
    }
}

impl From<Option<String>> for Value {
    fn from(v: Option<String>) -> Self {
        Self::Text(v)
    }
}

/// A column name paired with a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub value: Value,
}

/// Shorthand for building a [`Column`].
pub fn col(name: &'static str, value: impl Into<Value>) -> Column {
    Column {
        name,
        value: value.into(),
    }
}

/// A change applied to an existing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// `column = value`
    Set(Column),
    /// `column = column + delta`
    Add { column: &'static str, delta: i64 },
}

impl Mutation {
    pub fn set(name: &'static str, value: impl Into<Value>) -> Self {
        Self::Set(col(name, value))
    }

    pub fn add(column: &'static str, delta: i64) -> Self {
        Self::Add { column, delta }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::Set(c) => c.name,
            Self::Add { column, .. } => *column,
        }
    }
}

/// What a [`Guc`] does once it has looked for its row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Get,
    GetOrCreate(Vec<Column>),
    Update(Vec<Mutation>),
    UpdateOrCreate {
        update: Vec<Mutation>,
        create: Vec<Column>,
    },
    UpdateOrNone(Vec<Mutation>),
}

/// A validated get / update-or-create request against one row of `E`.
#[derive(Debug, Clone)]
pub struct Guc<E> {
    keys: Vec<Column>,
    action: Action,
    entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Guc<E> {
    /// Build a request, rejecting combinations that make no sense.
    pub fn new(
        keys: Vec<Column>,
        update: Option<Vec<Mutation>>,
        create: Option<Vec<Column>>,
        or_none: bool,
    ) -> Result<Self, MachmaError> {
        if keys.is_empty() {
            return Err(invalid("at least one key column is required"));
        }
        if update.as_ref().is_some_and(Vec::is_empty) {
            return Err(invalid("update needs at least one mutation"));
        }
        if let Some(ref create) = create {
            if let Some(c) = create.iter().find(|c| keys.iter().any(|k| k.name == c.name)) {
                return Err(invalid(&format!(
                    "create value for key column {} is ambiguous",
                    c.name
                )));
            }
        }

        let action = match (update, create, or_none) {
            (_, Some(_), true) => return Err(invalid("or_none cannot be combined with create")),
            (None, None, true) => return Err(invalid("or_none requires update mutations")),
            (None, None, false) => Action::Get,
            (None, Some(create), false) => Action::GetOrCreate(create),
            (Some(update), None, false) => Action::Update(update),
            (Some(update), Some(create), false) => Action::UpdateOrCreate { update, create },
            (Some(update), None, true) => Action::UpdateOrNone(update),
        };

        Ok(Self {
            keys,
            action,
            entity: PhantomData,
        })
    }

    /// Fetch the row, or `None` if it does not exist.
    pub fn get(keys: Vec<Column>) -> Result<Self, MachmaError> {
        Self::new(keys, None, None, false)
    }

    /// Fetch the row, inserting `keys ∪ create` if it does not exist.
    pub fn get_or_create(keys: Vec<Column>, create: Vec<Column>) -> Result<Self, MachmaError> {
        Self::new(keys, None, Some(create), false)
    }

    /// Update the row; a missing row is [`MachmaError::NotFound`].
    pub fn update(keys: Vec<Column>, update: Vec<Mutation>) -> Result<Self, MachmaError> {
        Self::new(keys, Some(update), None, false)
    }

    /// Update the row, inserting `keys ∪ create` if it does not exist.
    pub fn update_or_create(
        keys: Vec<Column>,
        update: Vec<Mutation>,
        create: Vec<Column>,
    ) -> Result<Self, MachmaError> {
        Self::new(keys, Some(update), Some(create), false)
    }

    /// Update the row if it exists, otherwise return `None`.
    pub fn update_or_none(keys: Vec<Column>, update: Vec<Mutation>) -> Result<Self, MachmaError> {
        Self::new(keys, Some(update), None, true)
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Run the request and return the resulting row.
    pub async fn execute(&self, conn: &mut SqliteConnection) -> Result<Option<E>, MachmaError> {
        let existing = self.select(conn).await?;

        match (existing, &self.action) {
            (Some(row), Action::Get | Action::GetOrCreate(_)) => Ok(Some(row)),
            (
                Some(_),
                Action::Update(update)
                | Action::UpdateOrCreate { update, .. }
                | Action::UpdateOrNone(update),
            ) => {
                self.apply(conn, update).await?;
                self.select(conn).await
            }
            (None, Action::GetOrCreate(create) | Action::UpdateOrCreate { create, .. }) => {
                self.insert(conn, create).await?;
                self.select(conn).await
            }
            (None, Action::Get | Action::UpdateOrNone(_)) => Ok(None),
            (None, Action::Update(_)) => Err(MachmaError::NotFound {
                entity: E::TABLE,
                keys: self.describe_keys(),
            }),
        }
    }

    fn where_clause(&self) -> String {
        self.keys
            .iter()
            .map(|k| format!("{} = ?", k.name))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn describe_keys(&self) -> String {
        self.keys
            .iter()
            .map(|k| format!("{}={}", k.name, k.value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    async fn select(&self, conn: &mut SqliteConnection) -> Result<Option<E>, MachmaError> {
        let sql = format!("SELECT * FROM {} WHERE {}", E::TABLE, self.where_clause());
        let mut query = sqlx::query_as::<_, E>(&sql);
        for key in &self.keys {
            query = bind_as(query, &key.value);
        }
        query
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| MachmaError::Store(format!("{} lookup failed: {e}", E::TABLE)))
    }

    async fn apply(
        &self,
        conn: &mut SqliteConnection,
        update: &[Mutation],
    ) -> Result<(), MachmaError> {
        let assignments = update
            .iter()
            .map(|m| match m {
                Mutation::Set(c) => format!("{} = ?", c.name),
                Mutation::Add { column, .. } => format!("{column} = {column} + ?"),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {}",
            E::TABLE,
            self.where_clause()
        );

        let mut query = sqlx::query(&sql);
        for m in update {
            query = match m {
                Mutation::Set(c) => bind(query, &c.value),
                Mutation::Add { delta, .. } => query.bind(*delta),
            };
        }
        for key in &self.keys {
            query = bind(query, &key.value);
        }
        query.execute(&mut *conn).await.map_err(|e| {
            let columns: Vec<_> = update.iter().map(Mutation::column).collect();
            MachmaError::Store(format!(
                "{} update of {} failed: {e}",
                E::TABLE,
                columns.join(", ")
            ))
        })?;
        Ok(())
    }

    async fn insert(
        &self,
        conn: &mut SqliteConnection,
        create: &[Column],
    ) -> Result<(), MachmaError> {
        let columns: Vec<&Column> = self.keys.iter().chain(create).collect();
        let names = columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({names}) VALUES ({placeholders})",
            E::TABLE
        );

        let mut query = sqlx::query(&sql);
        for c in &columns {
            query = bind(query, &c.value);
        }
        query
            .execute(&mut *conn)
            .await
            .map_err(|e| MachmaError::Store(format!("{} insert failed: {e}", E::TABLE)))?;
        Ok(())
    }
}

fn invalid(reason: &str) -> MachmaError {
    MachmaError::InvalidRequest(format!("guc: {reason}"))
}

fn bind<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Integer(i) => query.bind(*i),
        Value::Text(s) => query.bind(s.clone()),
    }
}

fn bind_as<'q, O>(
    query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    value: &Value,
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    match value {
        Value::Integer(i) => query.bind(*i),
        Value::Text(s) => query.bind(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::entities::{Exercise, UserReps};
    use crate::store::Store;
    use machma_core::config::StoreConfig;

    async fn seeded_store() -> Store {
        let store = Store::new(&StoreConfig::in_memory()).await.unwrap();
        let mut scope = store.begin().await.unwrap();
        scope.seed_demo_data().await.unwrap();
        scope.commit().await.unwrap();
        store
    }

    fn reps_keys(user_id: i64, exercise: &str) -> Vec<Column> {
        vec![col("user_id", user_id), col("exercise_name", exercise)]
    }

    #[test]
    fn test_new_rejects_empty_keys() {
        let err = Guc::<Exercise>::get(vec![]).unwrap_err();
        assert!(matches!(err, MachmaError::InvalidRequest(_)));
    }

    #[test]
    fn test_new_rejects_or_none_with_create() {
        let err = Guc::<UserReps>::new(
            reps_keys(1, "Dips"),
            Some(vec![Mutation::add("reps", 1)]),
            Some(vec![col("reps", 1i64)]),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, MachmaError::InvalidRequest(_)));
    }

    #[test]
    fn test_new_rejects_or_none_without_update() {
        let err = Guc::<UserReps>::new(reps_keys(1, "Dips"), None, None, true).unwrap_err();
        assert!(err.to_string().contains("or_none requires update"));
    }

    #[test]
    fn test_new_rejects_empty_update_and_key_in_create() {
        assert!(Guc::<UserReps>::update(reps_keys(1, "Dips"), vec![]).is_err());
        assert!(Guc::<UserReps>::get_or_create(
            reps_keys(1, "Dips"),
            vec![col("user_id", 2i64), col("reps", 0i64)],
        )
        .is_err());
    }

    #[test]
    fn test_new_resolves_actions() {
        let keys = || vec![col("exercise_name", "Dips")];
        let set = || vec![Mutation::set("exercise_link", None::<String>)];
        assert_eq!(Guc::<Exercise>::get(keys()).unwrap().action(), &Action::Get);
        assert!(matches!(
            Guc::<Exercise>::update(keys(), set()).unwrap().action(),
            Action::Update(_)
        ));
        assert!(matches!(
            Guc::<Exercise>::update_or_none(keys(), set()).unwrap().action(),
            Action::UpdateOrNone(_)
        ));
        assert!(matches!(
            Guc::<Exercise>::update_or_create(keys(), set(), vec![]).unwrap().action(),
            Action::UpdateOrCreate { .. }
        ));
        assert!(matches!(
            Guc::<Exercise>::get_or_create(keys(), vec![]).unwrap().action(),
            Action::GetOrCreate(_)
        ));
    }

    #[tokio::test]
    async fn test_get_existing_and_missing() {
        let store = seeded_store().await;
        let mut scope = store.begin().await.unwrap();

        let row = Guc::<UserReps>::get(reps_keys(1, "Dips"))
            .unwrap()
            .execute(scope.conn())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.reps, 30);

        let missing = Guc::<UserReps>::get(reps_keys(2, "Situps"))
            .unwrap()
            .execute(scope.conn())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_references_current_value() {
        let store = seeded_store().await;
        let mut scope = store.begin().await.unwrap();

        let row = Guc::<UserReps>::update(reps_keys(2, "Dips"), vec![Mutation::add("reps", 5)])
            .unwrap()
            .execute(scope.conn())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.reps, 15);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = seeded_store().await;
        let mut scope = store.begin().await.unwrap();

        let err = Guc::<UserReps>::update(reps_keys(2, "Situps"), vec![Mutation::add("reps", 5)])
            .unwrap()
            .execute(scope.conn())
            .await
            .unwrap_err();
        match err {
            MachmaError::NotFound { entity, keys } => {
                assert_eq!(entity, "user_reps");
                assert_eq!(keys, "user_id=2, exercise_name=\"Situps\"");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_or_none_missing_returns_none() {
        let store = seeded_store().await;
        let mut scope = store.begin().await.unwrap();

        let row =
            Guc::<UserReps>::update_or_none(reps_keys(2, "Situps"), vec![Mutation::add("reps", 5)])
                .unwrap()
                .execute(scope.conn())
                .await
                .unwrap();
        assert!(row.is_none());
        let still_missing = Guc::<UserReps>::get(reps_keys(2, "Situps"))
            .unwrap()
            .execute(scope.conn())
            .await
            .unwrap();
        assert!(still_missing.is_none(), "or_none must not create a row");
    }

    #[tokio::test]
    async fn test_update_or_none_updates_existing_row() {
        let store = seeded_store().await;
        let mut scope = store.begin().await.unwrap();

        let row =
            Guc::<UserReps>::update_or_none(reps_keys(1, "Dips"), vec![Mutation::add("reps", 5)])
                .unwrap()
                .execute(scope.conn())
                .await
                .unwrap()
                .unwrap();
        assert_eq!(row.user_id, 1);
        assert_eq!(row.exercise_name, "Dips");
        assert_eq!(row.reps, 35);

        let stored = Guc::<UserReps>::get(reps_keys(1, "Dips"))
            .unwrap()
            .execute(scope.conn())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.reps, 35, "update is written, not just returned");
    }

    #[tokio::test]
    async fn test_update_or_create_creates_then_updates() {
        let store = seeded_store().await;
        let mut scope = store.begin().await.unwrap();
        let guc = Guc::<UserReps>::update_or_create(
            reps_keys(2, "Situps"),
            vec![Mutation::add("reps", 7)],
            vec![col("reps", 7i64)],
        )
        .unwrap();

        let created = guc.execute(scope.conn()).await.unwrap().unwrap();
        assert_eq!(created.reps, 7);
        let updated = guc.execute(scope.conn()).await.unwrap().unwrap();
        assert_eq!(updated.reps, 14);
    }

    #[tokio::test]
    async fn test_get_or_create_leaves_existing_row() {
        let store = seeded_store().await;
        let mut scope = store.begin().await.unwrap();

        let row = Guc::<Exercise>::get_or_create(
            vec![col("exercise_name", "Dips")],
            vec![col("exercise_link", None::<String>)],
        )
        .unwrap()
        .execute(scope.conn())
        .await
        .unwrap()
        .unwrap();
        assert_eq!(
            row.exercise_link.as_deref(),
            Some("https://www.stack.com/a/dips")
        );
    }

    #[tokio::test]
    async fn test_writes_vanish_on_rollback() {
        let store = seeded_store().await;
        let mut scope = store.begin().await.unwrap();
        Guc::<UserReps>::update(reps_keys(1, "Dips"), vec![Mutation::add("reps", 100)])
            .unwrap()
            .execute(scope.conn())
            .await
            .unwrap();
        scope.rollback().await.unwrap();

        let mut scope = store.begin().await.unwrap();
        let row = Guc::<UserReps>::get(reps_keys(1, "Dips"))
            .unwrap()
            .execute(scope.conn())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.reps, 30);
    }
}
