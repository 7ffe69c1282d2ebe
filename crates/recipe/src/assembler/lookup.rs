use recipebox_shared::{Photos, Result};
use recipebox_user::{CookList, Favorites, UserView};

use super::{
    CookListLookup, FavoriteLookup, PhotoLookup, RatingLookup, RatingSummary, TagLookup,
    UserLookup,
};
use crate::Tags;

#[async_trait::async_trait]
impl TagLookup for Tags {
    async fn tag_id(&self, name: &str) -> Result<String> {
        Tags::tag_id(self, name).await
    }

    async fn tag_name(&self, id: &str) -> Result<String> {
        match self.get(id).await? {
            Some(tag) => Ok(tag.data.name),
            None => recipebox_shared::not_found!("tag {id} not found"),
        }
    }
}

#[async_trait::async_trait]
impl UserLookup for recipebox_user::Command {
    async fn sanitized(&self, user_id: &str) -> Result<UserView> {
        recipebox_user::Command::sanitized(self, user_id).await
    }
}

#[async_trait::async_trait]
impl RatingLookup for recipebox_rating::Command {
    async fn summary(&self, rating_id: &str) -> Result<RatingSummary> {
        let Some(collection) = self.get(rating_id).await? else {
            recipebox_shared::not_found!("rating {rating_id} not found");
        };

        Ok(RatingSummary {
            average_rating: collection.average_rating,
            number_of_ratings: collection.count(),
        })
    }

    async fn rating_for_user(&self, recipe_id: &str, user_id: &str) -> Result<f64> {
        recipebox_rating::Command::rating_for_user(self, recipe_id, user_id).await
    }
}

#[async_trait::async_trait]
impl PhotoLookup for Photos {
    async fn url(&self, filename: &str) -> Result<String> {
        Ok(Photos::url(self, filename))
    }
}

#[async_trait::async_trait]
impl FavoriteLookup for Favorites {
    async fn is_favorite(&self, recipe_id: &str, viewer_id: &str) -> Result<bool> {
        self.contains(viewer_id, recipe_id).await
    }
}

#[async_trait::async_trait]
impl CookListLookup for CookList {
    async fn is_on_cook_list(&self, recipe_id: &str, viewer_id: &str) -> Result<bool> {
        self.contains(viewer_id, recipe_id).await
    }
}
