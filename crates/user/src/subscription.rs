use recipebox_shared::{Notification, Result, Subscriber};

use crate::{CookList, Favorites, Recents};

/// Keeps per-user lists in step with recipe views and deletions.
pub struct UserSubscriber {
    pub favorites: Favorites,
    pub cook_list: CookList,
    pub recents: Recents,
}

#[async_trait::async_trait]
impl Subscriber for UserSubscriber {
    fn name(&self) -> &'static str {
        "user-lists"
    }

    async fn handle(&self, notification: &Notification) -> Result<()> {
        match notification {
            Notification::RecipeViewed { recipe_id, user_id } => {
                self.recents.push(user_id, recipe_id).await
            }
            Notification::RecipeDeleted { recipe_id } => {
                let favorites = self.favorites.strip_everywhere(recipe_id).await?;
                let cook_lists = self.cook_list.strip_everywhere(recipe_id).await?;
                let recents = self.recents.strip_everywhere(recipe_id).await?;

                tracing::info!(
                    recipe_id,
                    favorites,
                    cook_lists,
                    recents,
                    "deleted recipe removed from user lists"
                );

                Ok(())
            }
            _ => Ok(()),
        }
    }
}
