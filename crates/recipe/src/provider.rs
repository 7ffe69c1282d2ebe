use std::collections::HashMap;
use std::ops::Deref;

use recipebox_db::{Filter, Page, Store, Stored};
use recipebox_shared::{Result, ResultExt, State, Target};
use recipebox_user::{CookList, Favorites, Recents};
use serde::Deserialize;
use validator::Validate;

use crate::{AssembledRecipe, Assembler, RecipeRecord, Tags};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub featured_limit: u32,
    pub page_size: u32,
    pub max_page_size: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            featured_limit: 25,
            page_size: 20,
            max_page_size: 100,
        }
    }
}

#[derive(Validate)]
struct NameInput {
    #[validate(length(min = 2))]
    name: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FilterInput {
    pub text: String,
    pub rating_min: f64,
    pub tags: Vec<String>,
}

/// Read side of recipes. Everything it returns is assembled.
#[derive(Clone)]
pub struct Provider {
    state: State<Store>,
    assembler: Assembler,
    tags: Tags,
    ratings: recipebox_rating::Command,
    favorites: Favorites,
    cook_list: CookList,
    recents: Recents,
    config: ProviderConfig,
}

impl Deref for Provider {
    type Target = State<Store>;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl Provider {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: State<Store>,
        assembler: Assembler,
        tags: Tags,
        ratings: recipebox_rating::Command,
        favorites: Favorites,
        cook_list: CookList,
        recents: Recents,
        config: ProviderConfig,
    ) -> Self {
        Self {
            state,
            assembler,
            tags,
            ratings,
            favorites,
            cook_list,
            recents,
            config,
        }
    }

    fn page(&self, page: Option<Page>) -> Page {
        page.unwrap_or_else(|| Page::first(self.config.page_size))
            .clamp(self.config.max_page_size)
    }

    async fn assembled(
        &self,
        filters: &[Filter],
        page: Option<Page>,
        viewer_id: Option<&str>,
    ) -> Result<Vec<AssembledRecipe>> {
        let records = self
            .store
            .find::<RecipeRecord>(filters, Some(self.page(page)))
            .await
            .within(Target::Recipe, "find")?;

        self.assembler.convert_recipes(&records, viewer_id).await
    }

    pub async fn get_by_id(&self, id: &str, viewer_id: Option<&str>) -> Result<AssembledRecipe> {
        tracing::info!(recipe_id = id, viewer_id, "fetching recipe");

        let Some(record) = self
            .store
            .get::<RecipeRecord>(id)
            .await
            .within(Target::Recipe, "get_by_id")?
        else {
            recipebox_shared::not_found!("recipe {id} not found");
        };

        self.assembler.convert_recipe(&record, viewer_id).await
    }

    pub async fn from_user(
        &self,
        owner_id: &str,
        page: Option<Page>,
        viewer_id: Option<&str>,
    ) -> Result<Vec<AssembledRecipe>> {
        tracing::info!(user_id = owner_id, "fetching recipes of user");

        self.assembled(&[Filter::eq("owner", owner_id)], page, viewer_id)
            .await
    }

    /// Case-insensitive substring match on the recipe name.
    pub async fn by_name(
        &self,
        name: &str,
        page: Option<Page>,
        viewer_id: Option<&str>,
    ) -> Result<Vec<AssembledRecipe>> {
        NameInput {
            name: name.to_owned(),
        }
        .validate()?;

        tracing::info!(name, "fetching recipes by name");

        self.assembled(&[Filter::like("name", name)], page, viewer_id)
            .await
    }

    /// Recipes carrying every tag when `intersect`, any of them otherwise.
    /// Tag names are looked up, never created.
    pub async fn by_tags(
        &self,
        names: &[String],
        intersect: bool,
        page: Option<Page>,
        viewer_id: Option<&str>,
    ) -> Result<Vec<AssembledRecipe>> {
        tracing::info!(?names, intersect, "fetching recipes by tags");

        let Some(filters) = self.tag_filters(names, intersect).await? else {
            return Ok(vec![]);
        };

        self.assembled(&filters, page, viewer_id).await
    }

    /// `None` when no recipe can match.
    async fn tag_filters(&self, names: &[String], intersect: bool) -> Result<Option<Vec<Filter>>> {
        let mut ids = Vec::with_capacity(names.len());

        for name in names {
            match self.tags.find_by_name(name).await? {
                Some(tag) => ids.push(tag.id),
                None if intersect => return Ok(None),
                None => {}
            }
        }

        if ids.is_empty() {
            return Ok(None);
        }

        if intersect {
            Ok(Some(
                ids.into_iter()
                    .map(|id| Filter::contains("tags", id))
                    .collect(),
            ))
        } else {
            Ok(Some(vec![Filter::contains_any("tags", ids)]))
        }
    }

    /// Recipes whose average rating is at least `min`. Unrated recipes never
    /// match.
    pub async fn by_min_rating(
        &self,
        min: f64,
        page: Option<Page>,
        viewer_id: Option<&str>,
    ) -> Result<Vec<AssembledRecipe>> {
        tracing::info!(min, "fetching recipes by rating");

        let ids = self.ratings.recipe_ids_with_min_average(min).await?;

        self.assembled(&[Filter::id_in(ids)], page, viewer_id).await
    }

    /// Combines name, minimum rating and tags (all of them). Empty criteria
    /// are ignored; with none at all this is [`Provider::featured`].
    pub async fn filter(
        &self,
        input: FilterInput,
        page: Option<Page>,
        viewer_id: Option<&str>,
    ) -> Result<Vec<AssembledRecipe>> {
        tracing::info!(
            text = input.text,
            rating_min = input.rating_min,
            tags = ?input.tags,
            "filtering recipes"
        );

        let mut filters = vec![];

        if !input.text.is_empty() {
            filters.push(Filter::like("name", input.text));
        }

        if input.rating_min > 0.0 {
            let ids = self
                .ratings
                .recipe_ids_with_min_average(input.rating_min)
                .await?;
            filters.push(Filter::id_in(ids));
        }

        if !input.tags.is_empty() {
            let Some(tag_filters) = self.tag_filters(&input.tags, true).await? else {
                return Ok(vec![]);
            };
            filters.extend(tag_filters);
        }

        if filters.is_empty() {
            return self.featured(viewer_id).await;
        }

        self.assembled(&filters, page, viewer_id).await
    }

    pub async fn featured(&self, viewer_id: Option<&str>) -> Result<Vec<AssembledRecipe>> {
        let records = self
            .store
            .find::<RecipeRecord>(&[], Some(Page::first(self.config.featured_limit.max(1))))
            .await
            .within(Target::Recipe, "featured")?;

        self.assembler.convert_recipes(&records, viewer_id).await
    }

    pub async fn favorites_of(&self, user_id: &str) -> Result<Vec<AssembledRecipe>> {
        let ids = self.favorites.recipe_ids(user_id).await?;

        self.in_order(ids, Some(user_id)).await
    }

    pub async fn cook_list_of(&self, user_id: &str) -> Result<Vec<AssembledRecipe>> {
        let ids = self.cook_list.recipe_ids(user_id).await?;

        self.in_order(ids, Some(user_id)).await
    }

    /// Most recently viewed first.
    pub async fn recents_of(&self, user_id: &str) -> Result<Vec<AssembledRecipe>> {
        let ids = self.recents.recipe_ids(user_id).await?;

        self.in_order(ids, Some(user_id)).await
    }

    /// Assembles `ids` in the given order. Ids of recipes that no longer
    /// exist are skipped.
    async fn in_order(&self, ids: Vec<String>, viewer_id: Option<&str>) -> Result<Vec<AssembledRecipe>> {
        let mut found: HashMap<String, Stored<RecipeRecord>> = self
            .store
            .find::<RecipeRecord>(&[Filter::id_in(ids.iter().cloned())], None)
            .await
            .within(Target::Recipe, "find")?
            .into_iter()
            .map(|record| (record.id.to_owned(), record))
            .collect();

        let records: Vec<_> = ids.iter().filter_map(|id| found.remove(id)).collect();

        self.assembler.convert_recipes(&records, viewer_id).await
    }
}
