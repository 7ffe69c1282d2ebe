use recipebox_db::{Stored, optimistic};
use recipebox_shared::{Error, Notification, Result, ResultExt, Target};

use crate::{Method, RatingCollection, RatingResponse, validate_rating};

impl super::Command {
    /// Rates a recipe, creating its collection on the first rating. A user who
    /// already rated gets their rating updated instead of a second entry.
    pub async fn add(
        &self,
        recipe_id: impl Into<String>,
        user_id: impl Into<String>,
        rating: f64,
    ) -> Result<RatingResponse> {
        let recipe_id = recipe_id.into();
        let user_id = user_id.into();
        validate_rating(rating)?;

        let _guard = self.locks.lock(&recipe_id).await;

        optimistic(self.max_attempts, |_| self.try_add(&recipe_id, &user_id, rating))
            .await
            .within(Target::Rating, "add")
    }

    async fn try_add(
        &self,
        recipe_id: &str,
        user_id: &str,
        rating: f64,
    ) -> Result<Option<RatingResponse>> {
        let Some(mut collection) = self.load_or_create(recipe_id).await? else {
            return Ok(None);
        };

        let response = match collection.position(user_id) {
            Some(index) if collection.ratings[index].rating == rating => {
                tracing::warn!(recipe_id, user_id, rating, "rating already present");

                return Ok(Some(RatingResponse::new(
                    false,
                    Method::Update,
                    recipe_id,
                    user_id,
                    "This rating is already present",
                )));
            }
            Some(index) => {
                tracing::warn!(
                    recipe_id,
                    user_id,
                    rating,
                    "add called but user already rated, updating instead"
                );

                collection.replace(index, rating);
                RatingResponse::new(
                    true,
                    Method::Update,
                    recipe_id,
                    user_id,
                    "User already rated recipe. Updated instead",
                )
            }
            None => {
                collection.push(user_id, rating);
                RatingResponse::new(true, Method::Add, recipe_id, user_id, "User rated recipe")
            }
        };

        if !self.store.update(&mut collection).await? {
            return Ok(None);
        }

        tracing::info!(recipe_id, user_id, rating, "recipe rated");

        Ok(Some(response))
    }

    /// `None` when a concurrent first rating created the collection meanwhile.
    async fn load_or_create(&self, recipe_id: &str) -> Result<Option<Stored<RatingCollection>>> {
        if let Some(collection) = self.store.find_by_key::<RatingCollection>(recipe_id).await? {
            return Ok(Some(collection));
        }

        match self.store.create(RatingCollection::new(recipe_id)).await {
            Ok(collection) => {
                tracing::info!(
                    recipe_id,
                    rating_id = collection.id,
                    "no rating for recipe present, collection created"
                );

                self.bus.emit(Notification::RecipeFirstRated {
                    recipe_id: recipe_id.to_owned(),
                    rating_id: collection.id.to_owned(),
                });

                Ok(Some(collection))
            }
            Err(Error::Conflict(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
