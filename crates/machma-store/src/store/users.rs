//! User registration and lookup.

use super::entities::User;
use super::guc::{col, Guc};
use super::scope::Scope;
use machma_core::{error::MachmaError, message::Sender};
use tracing::info;

impl Scope {
    pub async fn has_user(&mut self, user_id: i64) -> Result<bool, MachmaError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.conn())
            .await
            .map_err(|e| MachmaError::Store(format!("user lookup failed: {e}")))?;
        Ok(count != 0)
    }

    pub async fn get_user(&mut self, user_id: i64) -> Result<Option<User>, MachmaError> {
        Guc::<User>::get(vec![col("user_id", user_id)])?
            .execute(self.conn())
            .await
    }

    /// Register a user. The caller checks [`Scope::has_user`] first.
    pub async fn add_user(
        &mut self,
        user_id: i64,
        user_name: Option<&str>,
        first_name: &str,
        last_name: Option<&str>,
    ) -> Result<(), MachmaError> {
        sqlx::query(
            "INSERT INTO users (user_id, user_name, first_name, last_name) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(user_name)
        .bind(first_name)
        .bind(last_name)
        .execute(self.conn())
        .await
        .map_err(|e| MachmaError::Store(format!("insert user {user_id} failed: {e}")))?;
        Ok(())
    }

    /// Register the sender on first contact. Returns `true` if it was new.
    pub async fn ensure_user(&mut self, sender: &Sender) -> Result<bool, MachmaError> {
        if self.has_user(sender.id).await? {
            return Ok(false);
        }
        self.add_user(
            sender.id,
            sender.username.as_deref(),
            &sender.first_name,
            sender.last_name.as_deref(),
        )
        .await?;
        info!("registered user {} ({})", sender.id, sender.first_name);
        Ok(true)
    }

    /// Fail with [`MachmaError::UserDoesNotExist`] unless the user is registered.
    pub(super) async fn require_user(&mut self, user_id: i64) -> Result<(), MachmaError> {
        if self.has_user(user_id).await? {
            Ok(())
        } else {
            Err(MachmaError::user_does_not_exist(user_id))
        }
    }
}
