use recipebox_db::optimistic;
use recipebox_shared::{Result, ResultExt, Target};

use crate::{Method, RatingCollection, RatingResponse, validate_rating};

impl super::Command {
    pub async fn update(
        &self,
        recipe_id: impl Into<String>,
        user_id: impl Into<String>,
        rating: f64,
    ) -> Result<RatingResponse> {
        let recipe_id = recipe_id.into();
        let user_id = user_id.into();
        validate_rating(rating)?;

        let _guard = self.locks.lock(&recipe_id).await;

        optimistic(self.max_attempts, |_| {
            self.try_update(&recipe_id, &user_id, rating)
        })
        .await
        .within(Target::Rating, "update")
    }

    async fn try_update(
        &self,
        recipe_id: &str,
        user_id: &str,
        rating: f64,
    ) -> Result<Option<RatingResponse>> {
        let Some(mut collection) = self.store.find_by_key::<RatingCollection>(recipe_id).await?
        else {
            tracing::warn!(recipe_id, "recipe has no ratings");

            return Ok(Some(RatingResponse::new(
                false,
                Method::Update,
                recipe_id,
                user_id,
                "The recipe has no ratings yet",
            )));
        };

        let Some(index) = collection.position(user_id) else {
            tracing::warn!(recipe_id, user_id, "tried to update non existent rating");

            return Ok(Some(RatingResponse::new(
                false,
                Method::Update,
                recipe_id,
                user_id,
                format!("The user({user_id}) hasn't rated recipe so updating is not possible"),
            )));
        };

        collection.replace(index, rating);

        if !self.store.update(&mut collection).await? {
            return Ok(None);
        }

        let average = collection.average_rating.unwrap_or_default();
        tracing::info!(recipe_id, user_id, rating, average, "rating updated");

        Ok(Some(RatingResponse::new(
            true,
            Method::Update,
            recipe_id,
            user_id,
            format!("Updated recipe new avgRating of: {average}"),
        )))
    }
}
