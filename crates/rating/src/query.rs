use recipebox_db::{Filter, Stored};
use recipebox_shared::{Result, ResultExt, Target};

use crate::RatingCollection;

impl super::Command {
    pub async fn get(&self, id: &str) -> Result<Option<Stored<RatingCollection>>> {
        self.store.get(id).await.within(Target::Rating, "get")
    }

    pub async fn get_by_recipe(&self, recipe_id: &str) -> Result<Option<Stored<RatingCollection>>> {
        self.store
            .find_by_key(recipe_id)
            .await
            .within(Target::Rating, "get_by_recipe")
    }

    /// `0.0` when the user has not rated the recipe.
    pub async fn rating_for_user(&self, recipe_id: &str, user_id: &str) -> Result<f64> {
        Ok(self
            .get_by_recipe(recipe_id)
            .await?
            .and_then(|collection| collection.rating_of(user_id))
            .unwrap_or_default())
    }

    pub async fn recipe_ids_with_min_average(&self, min: f64) -> Result<Vec<String>> {
        Ok(self
            .store
            .find::<RatingCollection>(&[Filter::gte("averageRating", min)], None)
            .await
            .within(Target::Rating, "find_by_min_average")?
            .into_iter()
            .map(|collection| collection.data.recipe_id)
            .collect())
    }
}
