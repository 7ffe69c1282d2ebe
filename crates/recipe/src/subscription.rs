use recipebox_db::optimistic;
use recipebox_shared::{Notification, RatingRef, Result, ResultExt, Subscriber, Target};

use crate::{Command, RecipeRecord};

/// Applies recipe changes announced on the bus.
pub struct RecipeSubscriber(pub Command);

impl RecipeSubscriber {
    async fn link_rating(&self, recipe_id: &str, rating_id: &str) -> Result<()> {
        let rating = RatingRef::Collection(rating_id.to_owned());

        let linked = optimistic(self.0.max_attempts, |_| {
            let rating = rating.clone();

            async move {
                let Some(mut recipe) = self.0.load(recipe_id).await? else {
                    return Ok(Some(false));
                };

                if recipe.rating == rating {
                    return Ok(Some(true));
                }

                recipe.rating = rating;

                Ok(self.0.store.update(&mut recipe).await?.then_some(true))
            }
        })
        .await
        .within(Target::Recipe, "link_rating")?;

        if linked {
            tracing::info!(recipe_id, rating_id, "rating linked to recipe");
        } else {
            tracing::warn!(recipe_id, rating_id, "rated recipe no longer exists");
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl Subscriber for RecipeSubscriber {
    fn name(&self) -> &'static str {
        "recipe"
    }

    async fn handle(&self, notification: &Notification) -> Result<()> {
        match notification {
            Notification::RecipeFirstRated {
                recipe_id,
                rating_id,
            } => self.link_rating(recipe_id, rating_id).await,
            Notification::PictureChanged {
                recipe_id,
                filename,
            } => self.0.apply_picture(recipe_id, filename).await,
            Notification::RecipeDeleted { recipe_id } => {
                if self
                    .0
                    .store
                    .remove::<RecipeRecord>(recipe_id)
                    .await
                    .within(Target::Recipe, "remove")?
                {
                    tracing::info!(recipe_id, "recipe removed");
                }

                Ok(())
            }
            Notification::RecipeViewed { .. } => Ok(()),
        }
    }
}
