//! Per-user recipe lists. Favorites and the cook list share one shape and
//! differ only by the collection they live in.

mod recent;

use std::marker::PhantomData;
use std::ops::Deref;

use recipebox_db::{Document, Filter, Store, Stored, optimistic};
use recipebox_shared::{Error, Result, ResultExt, State, Target};
use serde::{Deserialize, Serialize};

pub use recent::{DEFAULT_RECENTS_SIZE, RecentList, Recents};

pub trait ListKind: Send + Sync + Unpin + 'static {
    const COLLECTION: &'static str;
    const LABEL: &'static str;
    const TARGET: Target;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Favorite;

impl ListKind for Favorite {
    const COLLECTION: &'static str = "favorites";
    const LABEL: &'static str = "favorites";
    const TARGET: Target = Target::Favorite;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cook;

impl ListKind for Cook {
    const COLLECTION: &'static str = "cook_lists";
    const LABEL: &'static str = "cook list";
    const TARGET: Target = Target::CookList;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct RecipeList<K> {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub recipes: Vec<String>,
    #[serde(skip)]
    kind: PhantomData<K>,
}

impl<K: ListKind> Document for RecipeList<K> {
    const COLLECTION: &'static str = K::COLLECTION;

    fn key(&self) -> Option<String> {
        Some(self.user_id.to_owned())
    }
}

impl<K> RecipeList<K> {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            recipes: vec![],
            kind: PhantomData,
        }
    }

    pub fn contains(&self, recipe_id: &str) -> bool {
        self.recipes.iter().any(|id| id == recipe_id)
    }

    /// Returns whether the list changed.
    pub(crate) fn strip(&mut self, recipe_id: &str) -> bool {
        let len = self.recipes.len();
        self.recipes.retain(|id| id != recipe_id);
        len != self.recipes.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ListMethod {
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub method: ListMethod,
    #[serde(rename = "msg")]
    pub message: String,
}

impl ListResponse {
    fn new(success: bool, method: ListMethod, message: impl Into<String>) -> Self {
        Self {
            success,
            method,
            message: message.into(),
        }
    }
}

pub struct Command<K> {
    state: State<Store>,
    max_attempts: u32,
    kind: PhantomData<K>,
}

pub type Favorites = Command<Favorite>;
pub type CookList = Command<Cook>;

impl<K> Clone for Command<K> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            max_attempts: self.max_attempts,
            kind: PhantomData,
        }
    }
}

impl<K> Deref for Command<K> {
    type Target = State<Store>;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl<K: ListKind> Command<K> {
    pub fn new(state: State<Store>) -> Self {
        Self {
            state,
            max_attempts: crate::DEFAULT_MAX_ATTEMPTS,
            kind: PhantomData,
        }
    }

    async fn load(&self, user_id: &str) -> Result<Option<Stored<RecipeList<K>>>> {
        self.store
            .find_by_key(user_id)
            .await
            .within(K::TARGET, "load")
    }

    pub async fn add(&self, user_id: &str, recipe_id: &str) -> Result<ListResponse> {
        optimistic(self.max_attempts, |_| self.try_add(user_id, recipe_id))
            .await
            .within(K::TARGET, "add")
    }

    async fn try_add(&self, user_id: &str, recipe_id: &str) -> Result<Option<ListResponse>> {
        let Some(mut list) = self.load(user_id).await? else {
            let mut list = RecipeList::<K>::new(user_id);
            list.recipes.push(recipe_id.to_owned());

            return match self.store.create(list).await {
                Ok(_) => {
                    tracing::info!(user_id, recipe_id, list = K::LABEL, "list created");

                    Ok(Some(ListResponse::new(
                        true,
                        ListMethod::Add,
                        format!(
                            "Created {} for user ({user_id}) with recipe ({recipe_id})",
                            K::LABEL
                        ),
                    )))
                }
                Err(Error::Conflict(_)) => Ok(None),
                Err(err) => Err(err),
            };
        };

        if list.contains(recipe_id) {
            return Ok(Some(ListResponse::new(
                false,
                ListMethod::Add,
                format!("Couldn't add recipe ({recipe_id}) already present"),
            )));
        }

        list.recipes.push(recipe_id.to_owned());

        if !self.store.update(&mut list).await? {
            return Ok(None);
        }

        tracing::info!(user_id, recipe_id, list = K::LABEL, "recipe added");

        Ok(Some(ListResponse::new(
            true,
            ListMethod::Add,
            format!("Recipe ({recipe_id}) added to users ({user_id}) {}", K::LABEL),
        )))
    }

    pub async fn remove(&self, user_id: &str, recipe_id: &str) -> Result<ListResponse> {
        optimistic(self.max_attempts, |_| self.try_remove(user_id, recipe_id))
            .await
            .within(K::TARGET, "remove")
    }

    async fn try_remove(&self, user_id: &str, recipe_id: &str) -> Result<Option<ListResponse>> {
        let Some(mut list) = self.load(user_id).await? else {
            return Ok(Some(ListResponse::new(
                false,
                ListMethod::Remove,
                format!(
                    "Couldn't remove recipe since user({user_id}) has no {}",
                    K::LABEL
                ),
            )));
        };

        if !list.strip(recipe_id) {
            return Ok(Some(ListResponse::new(
                false,
                ListMethod::Remove,
                format!(
                    "Couldn't remove recipe since it isn't in users({user_id}) {}",
                    K::LABEL
                ),
            )));
        }

        if !self.store.update(&mut list).await? {
            return Ok(None);
        }

        tracing::info!(user_id, recipe_id, list = K::LABEL, "recipe removed");

        Ok(Some(ListResponse::new(
            true,
            ListMethod::Remove,
            format!("Removed recipe from user({user_id}) {}", K::LABEL),
        )))
    }

    pub async fn contains(&self, user_id: &str, recipe_id: &str) -> Result<bool> {
        Ok(self
            .load(user_id)
            .await?
            .is_some_and(|list| list.contains(recipe_id)))
    }

    /// In the order they were added.
    pub async fn recipe_ids(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self
            .load(user_id)
            .await?
            .map(|list| list.data.recipes)
            .unwrap_or_default())
    }

    /// Drops a deleted recipe from every user's list.
    pub async fn strip_everywhere(&self, recipe_id: &str) -> Result<usize> {
        let lists = self
            .store
            .find::<RecipeList<K>>(&[Filter::contains("recipes", recipe_id)], None)
            .await
            .within(K::TARGET, "strip")?;
        let mut stripped = 0;

        for list in lists {
            let id = list.id;

            optimistic(self.max_attempts, |_| self.try_strip(&id, recipe_id))
                .await
                .within(K::TARGET, "strip")?;
            stripped += 1;
        }

        Ok(stripped)
    }

    async fn try_strip(&self, id: &str, recipe_id: &str) -> Result<Option<()>> {
        let Some(mut list) = self.store.get::<RecipeList<K>>(id).await? else {
            return Ok(Some(()));
        };

        if !list.strip(recipe_id) {
            return Ok(Some(()));
        }

        Ok(self.store.update(&mut list).await?.then_some(()))
    }
}
