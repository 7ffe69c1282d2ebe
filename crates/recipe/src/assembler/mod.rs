//! Turns stored recipes into what clients see.
//!
//! Every reference on a [`RecipeRecord`] is resolved through an injected
//! collaborator. Resolutions for one recipe are independent reads and run
//! concurrently, each under the same deadline; the first failure aborts the
//! whole conversion.

mod lookup;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use recipebox_db::Stored;
use recipebox_shared::{
    Error, Ingredient, Notification, NotificationBus, Picture, RatingRef, Result, Target,
};
use recipebox_user::UserView;
use serde::Serialize;

use crate::RecipeRecord;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait::async_trait]
pub trait TagLookup: Send + Sync {
    /// Looks the tag up by name, creating it when missing.
    async fn tag_id(&self, name: &str) -> Result<String>;

    async fn tag_name(&self, id: &str) -> Result<String>;
}

#[async_trait::async_trait]
pub trait UserLookup: Send + Sync {
    async fn sanitized(&self, user_id: &str) -> Result<UserView>;
}

/// Aggregate of a rating collection. `average_rating` is `None` when nobody
/// rated yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub average_rating: Option<f64>,
    pub number_of_ratings: usize,
}

#[async_trait::async_trait]
pub trait RatingLookup: Send + Sync {
    async fn summary(&self, rating_id: &str) -> Result<RatingSummary>;

    /// `0.0` when the user has not rated the recipe.
    async fn rating_for_user(&self, recipe_id: &str, user_id: &str) -> Result<f64>;
}

#[async_trait::async_trait]
pub trait PhotoLookup: Send + Sync {
    async fn url(&self, filename: &str) -> Result<String>;
}

#[async_trait::async_trait]
pub trait FavoriteLookup: Send + Sync {
    async fn is_favorite(&self, recipe_id: &str, viewer_id: &str) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait CookListLookup: Send + Sync {
    async fn is_on_cook_list(&self, recipe_id: &str, viewer_id: &str) -> Result<bool>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingInfo {
    pub average_rating: f64,
    pub number_of_ratings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledRecipe {
    pub id: String,
    pub name: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<String>,
    pub tags: Vec<String>,
    pub owner: UserView,
    pub rating: RatingInfo,
    pub picture: String,
    pub creation_timestamp: u64,
    pub update_timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_on_cook_list: Option<bool>,
}

struct Personal {
    is_favorite: bool,
    my_rating: f64,
    is_on_cook_list: bool,
}

pub struct Collaborators {
    pub tags: Arc<dyn TagLookup>,
    pub users: Arc<dyn UserLookup>,
    pub ratings: Arc<dyn RatingLookup>,
    pub photos: Arc<dyn PhotoLookup>,
    pub favorites: Arc<dyn FavoriteLookup>,
    pub cook_list: Arc<dyn CookListLookup>,
}

#[derive(Clone)]
pub struct Assembler {
    collaborators: Arc<Collaborators>,
    bus: NotificationBus,
    timeout: Duration,
}

impl Assembler {
    pub fn new(collaborators: Collaborators, bus: NotificationBus) -> Self {
        Self {
            collaborators: Arc::new(collaborators),
            bus,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn resolve<T>(&self, target: Target, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(Error::resolution(target, err)),
            Err(_) => {
                tracing::warn!(collaborator = %target, timeout = ?self.timeout, "resolution timed out");

                Err(Error::resolution(target, Error::Timeout))
            }
        }
    }

    /// Ids in input order. Unknown names become new tags.
    pub async fn convert_tags_to_id(&self, names: &[String]) -> Result<Vec<String>> {
        tracing::debug!(?names, "converting tag names to ids");

        try_join_all(
            names
                .iter()
                .map(|name| self.resolve(Target::Tag, self.collaborators.tags.tag_id(name))),
        )
        .await
    }

    /// Names in input order. An id that does not resolve fails the call.
    pub async fn convert_tags_to_name(&self, ids: &[String]) -> Result<Vec<String>> {
        tracing::debug!(?ids, "converting tag ids to names");

        try_join_all(
            ids.iter()
                .map(|id| self.resolve(Target::Tag, self.collaborators.tags.tag_name(id))),
        )
        .await
    }

    pub async fn convert_rating_ref_to_info(&self, rating: &RatingRef) -> Result<RatingInfo> {
        let Some(rating_id) = rating.collection_id() else {
            return Ok(RatingInfo::default());
        };

        let summary = self
            .resolve(Target::Rating, self.collaborators.ratings.summary(rating_id))
            .await?;

        Ok(RatingInfo {
            average_rating: summary.average_rating.unwrap_or_default(),
            number_of_ratings: summary.number_of_ratings,
        })
    }

    async fn picture_url(&self, picture: &Picture) -> Result<String> {
        match picture.filename() {
            Some(filename) => {
                self.resolve(Target::Photo, self.collaborators.photos.url(filename))
                    .await
            }
            None => Ok(String::new()),
        }
    }

    async fn personal(&self, recipe_id: &str, viewer_id: Option<&str>) -> Result<Option<Personal>> {
        let Some(viewer_id) = viewer_id else {
            return Ok(None);
        };

        let (is_favorite, my_rating, is_on_cook_list) = tokio::try_join!(
            self.resolve(
                Target::Favorite,
                self.collaborators.favorites.is_favorite(recipe_id, viewer_id)
            ),
            self.resolve(
                Target::Rating,
                self.collaborators
                    .ratings
                    .rating_for_user(recipe_id, viewer_id)
            ),
            self.resolve(
                Target::CookList,
                self.collaborators
                    .cook_list
                    .is_on_cook_list(recipe_id, viewer_id)
            ),
        )?;

        Ok(Some(Personal {
            is_favorite,
            my_rating,
            is_on_cook_list,
        }))
    }

    async fn assemble(
        &self,
        record: &Stored<RecipeRecord>,
        viewer_id: Option<&str>,
    ) -> Result<AssembledRecipe> {
        let (tags, owner, rating, picture, personal) = tokio::try_join!(
            self.convert_tags_to_name(&record.tags),
            self.resolve(Target::User, self.collaborators.users.sanitized(&record.owner)),
            self.convert_rating_ref_to_info(&record.rating),
            self.picture_url(&record.picture),
            self.personal(&record.id, viewer_id),
        )?;

        Ok(AssembledRecipe {
            id: record.id.to_owned(),
            name: record.name.to_owned(),
            description: record.description.to_owned(),
            ingredients: record.ingredients.to_owned(),
            steps: record.steps.to_owned(),
            tags,
            owner,
            rating,
            picture,
            creation_timestamp: record.creation_timestamp,
            update_timestamp: record.update_timestamp,
            is_favorite: personal.as_ref().map(|p| p.is_favorite),
            my_rating: personal.as_ref().map(|p| p.my_rating),
            is_on_cook_list: personal.as_ref().map(|p| p.is_on_cook_list),
        })
    }

    /// Assembles one recipe and, when a viewer is given, records the view.
    pub async fn convert_recipe(
        &self,
        record: &Stored<RecipeRecord>,
        viewer_id: Option<&str>,
    ) -> Result<AssembledRecipe> {
        tracing::debug!(recipe_id = record.id, viewer_id, "converting recipe");

        let recipe = self.assemble(record, viewer_id).await?;

        if let Some(user_id) = viewer_id {
            self.bus.emit(Notification::RecipeViewed {
                recipe_id: record.id.to_owned(),
                user_id: user_id.to_owned(),
            });
        }

        Ok(recipe)
    }

    /// Output order matches input order. One failed recipe fails the batch.
    ///
    /// Unlike [`Assembler::convert_recipe`] this never emits
    /// [`Notification::RecipeViewed`]: listing recipes does not count as
    /// viewing them, so reading a user's recents leaves their order alone.
    pub async fn convert_recipes(
        &self,
        records: &[Stored<RecipeRecord>],
        viewer_id: Option<&str>,
    ) -> Result<Vec<AssembledRecipe>> {
        tracing::debug!(count = records.len(), viewer_id, "converting recipes");

        try_join_all(records.iter().map(|record| self.assemble(record, viewer_id))).await
    }
}
