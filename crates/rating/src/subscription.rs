use recipebox_shared::{Notification, Result, ResultExt, Subscriber, Target};

use crate::RatingCollection;

pub struct RatingSubscriber(pub super::Command);

#[async_trait::async_trait]
impl Subscriber for RatingSubscriber {
    fn name(&self) -> &'static str {
        "rating"
    }

    async fn handle(&self, notification: &Notification) -> Result<()> {
        let Notification::RecipeDeleted { recipe_id } = notification else {
            return Ok(());
        };

        let _guard = self.0.locks.lock(recipe_id).await;

        if self
            .0
            .store
            .remove_by_key::<RatingCollection>(recipe_id)
            .await
            .within(Target::Rating, "remove_collection")?
        {
            tracing::info!(recipe_id, "rating collection removed with its recipe");
        }

        Ok(())
    }
}
