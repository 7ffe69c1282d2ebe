use recipebox_shared::{Ingredient, Picture, RatingRef, Result, ResultExt, Target};
use validator::Validate;

use crate::RecipeRecord;

use super::RecipeResponse;

#[derive(Debug, Clone, Default, Validate)]
pub struct CreateInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<String>,
    /// Tag names. Missing tags are created.
    pub tags: Vec<String>,
}

impl super::Command {
    pub async fn create(&self, owner_id: &str, input: CreateInput) -> Result<RecipeResponse> {
        input.validate()?;

        let tags = self.assembler.convert_tags_to_id(&input.tags).await?;
        let now = recipebox_shared::now();

        let recipe = self
            .store
            .create(RecipeRecord {
                name: input.name,
                description: input.description,
                ingredients: input.ingredients,
                steps: input.steps,
                tags,
                owner: owner_id.to_owned(),
                rating: RatingRef::Unrated,
                picture: Picture::None,
                creation_timestamp: now,
                update_timestamp: now,
            })
            .await
            .within(Target::Recipe, "create")?;

        tracing::info!(recipe_id = recipe.id, user_id = owner_id, "recipe created");

        Ok(RecipeResponse::new(
            &recipe.id,
            format!("Saved recipe ({}) by {owner_id}", recipe.name),
        ))
    }
}
