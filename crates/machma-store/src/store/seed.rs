//! Demo data for ethereal databases and tests.

use super::scope::Scope;
use machma_core::error::MachmaError;

impl Scope {
    /// Two users, three exercises, a handful of reps, and one extra alias.
    ///
    /// | reps     | Eve (1) | John (2) |
    /// |----------|---------|----------|
    /// | Dips     | 30      | 10       |
    /// | Crunches | 50      | 80       |
    /// | Situps   | 20      | -        |
    pub async fn seed_demo_data(&mut self) -> Result<(), MachmaError> {
        self.add_user(1, None, "Eve", None).await?;
        self.add_user(2, None, "John", None).await?;

        self.add_exercise("Dips", Some("https://www.stack.com/a/dips"))
            .await?;
        self.add_exercise("Crunches", None).await?;
        self.add_exercise("Situps", None).await?;

        for (user_id, exercise, reps) in [
            (1, "Dips", 30),
            (2, "Dips", 10),
            (1, "Crunches", 50),
            (2, "Crunches", 80),
            (1, "Situps", 20),
        ] {
            self.add_to_user_reps(user_id, exercise, reps).await?;
        }

        self.add_alias("Triceps", "Dips").await
    }
}
