use recipebox_shared::{Notification, Result};

use super::RecipeResponse;

impl super::Command {
    /// Only announces the deletion. The record and everything pointing at it
    /// are removed by the subscribers.
    pub async fn delete(&self, user_id: &str, recipe_id: &str) -> Result<RecipeResponse> {
        self.load_owned(user_id, recipe_id).await?;

        self.bus.emit(Notification::RecipeDeleted {
            recipe_id: recipe_id.to_owned(),
        });

        tracing::info!(recipe_id, user_id, "recipe deletion triggered");

        Ok(RecipeResponse::new(
            recipe_id,
            "Asynchronous deletion triggered.",
        ))
    }
}
