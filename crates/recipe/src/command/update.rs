use recipebox_db::optimistic;
use recipebox_shared::{Ingredient, Result, ResultExt, Target};
use validator::Validate;

use super::RecipeResponse;

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub steps: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

impl super::Command {
    pub async fn update(
        &self,
        user_id: &str,
        recipe_id: &str,
        input: UpdateInput,
    ) -> Result<RecipeResponse> {
        input.validate()?;

        self.load_owned(user_id, recipe_id).await?;

        let tags = match &input.tags {
            Some(names) => Some(self.assembler.convert_tags_to_id(names).await?),
            None => None,
        };

        let name = optimistic(self.max_attempts, |_| {
            let input = input.clone();
            let tags = tags.clone();

            async move {
                let mut recipe = self.load_owned(user_id, recipe_id).await?;

                if let Some(name) = input.name {
                    recipe.name = name;
                }
                if let Some(description) = input.description {
                    recipe.description = description;
                }
                if let Some(ingredients) = input.ingredients {
                    recipe.ingredients = ingredients;
                }
                if let Some(steps) = input.steps {
                    recipe.steps = steps;
                }
                if let Some(tags) = tags {
                    recipe.tags = tags;
                }
                recipe.update_timestamp = recipebox_shared::now();

                let name = recipe.name.to_owned();

                Ok(self.store.update(&mut recipe).await?.then_some(name))
            }
        })
        .await
        .within(Target::Recipe, "update")?;

        tracing::info!(recipe_id, user_id, "recipe updated");

        Ok(RecipeResponse::new(
            recipe_id,
            format!("Recipe ({name}) succesfully updated"),
        ))
    }
}
