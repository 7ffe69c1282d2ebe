use recipebox_db::optimistic;
use recipebox_shared::{Result, ResultExt, Target};

use crate::{Method, RatingCollection, RatingResponse};

impl super::Command {
    pub async fn remove(
        &self,
        recipe_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<RatingResponse> {
        let recipe_id = recipe_id.into();
        let user_id = user_id.into();

        let _guard = self.locks.lock(&recipe_id).await;

        optimistic(self.max_attempts, |_| self.try_remove(&recipe_id, &user_id))
            .await
            .within(Target::Rating, "remove")
    }

    async fn try_remove(&self, recipe_id: &str, user_id: &str) -> Result<Option<RatingResponse>> {
        let Some(mut collection) = self.store.find_by_key::<RatingCollection>(recipe_id).await?
        else {
            tracing::warn!(recipe_id, "recipe has no ratings");

            return Ok(Some(RatingResponse::new(
                false,
                Method::Remove,
                recipe_id,
                user_id,
                "The recipe has no ratings yet",
            )));
        };

        let Some(index) = collection.position(user_id) else {
            tracing::warn!(recipe_id, user_id, "tried to remove non existent rating");

            return Ok(Some(RatingResponse::new(
                false,
                Method::Remove,
                recipe_id,
                user_id,
                format!("The user({user_id}) hasn't rated recipe so removing is not possible"),
            )));
        };

        collection.remove(index);

        if !self.store.update(&mut collection).await? {
            return Ok(None);
        }

        tracing::info!(recipe_id, user_id, "rating removed");

        Ok(Some(RatingResponse::new(
            true,
            Method::Remove,
            recipe_id,
            user_id,
            "Removed users rating from recipe",
        )))
    }
}
