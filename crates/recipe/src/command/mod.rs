mod create;
mod delete;
mod picture;
mod update;

use std::ops::Deref;

use recipebox_db::{Store, Stored};
use recipebox_shared::{Result, ResultExt, State, Target};
use serde::Serialize;

use crate::{Assembler, RecipeRecord};

pub use create::CreateInput;
pub use update::UpdateInput;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeResponse {
    #[serde(rename = "recipeID")]
    pub recipe_id: String,
    #[serde(rename = "msg")]
    pub message: String,
}

impl RecipeResponse {
    fn new(recipe_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            message: message.into(),
        }
    }
}

/// Write side of recipes.
#[derive(Clone)]
pub struct Command {
    state: State<Store>,
    assembler: Assembler,
    pub(crate) max_attempts: u32,
}

impl Deref for Command {
    type Target = State<Store>;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl Command {
    pub fn new(state: State<Store>, assembler: Assembler) -> Self {
        Self {
            state,
            assembler,
            max_attempts: crate::DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = std::cmp::max(attempts, 1);
        self
    }

    pub async fn load(&self, id: &str) -> Result<Option<Stored<RecipeRecord>>> {
        self.store.get(id).await.within(Target::Recipe, "load")
    }

    /// False for unknown recipes.
    pub async fn owns_recipe(&self, user_id: &str, recipe_id: &str) -> Result<bool> {
        Ok(self
            .load(recipe_id)
            .await?
            .is_some_and(|recipe| recipe.owner == user_id))
    }

    async fn load_owned(&self, user_id: &str, recipe_id: &str) -> Result<Stored<RecipeRecord>> {
        let Some(recipe) = self.load(recipe_id).await? else {
            recipebox_shared::not_found!("recipe {recipe_id} not found");
        };

        if recipe.owner != user_id {
            recipebox_shared::forbidden!("not owner of recipe");
        }

        Ok(recipe)
    }
}
