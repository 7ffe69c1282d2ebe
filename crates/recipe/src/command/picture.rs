use recipebox_db::optimistic;
use recipebox_shared::{Notification, Picture, Result, ResultExt, Target};

impl super::Command {
    pub async fn set_picture(
        &self,
        user_id: &str,
        recipe_id: &str,
        filename: impl Into<String>,
    ) -> Result<()> {
        let filename = filename.into();

        self.load_owned(user_id, recipe_id).await?;

        self.bus.emit(Notification::PictureChanged {
            recipe_id: recipe_id.to_owned(),
            filename,
        });

        tracing::info!(recipe_id, user_id, "picture change triggered");

        Ok(())
    }

    /// Applies a picture change. Called by the subscriber.
    pub async fn apply_picture(&self, recipe_id: &str, filename: &str) -> Result<()> {
        let picture = Picture::from(filename.to_owned());

        optimistic(self.max_attempts, |_| {
            let picture = picture.clone();

            async move {
                let Some(mut recipe) = self.load(recipe_id).await? else {
                    return Ok(Some(false));
                };

                recipe.picture = picture;
                recipe.update_timestamp = recipebox_shared::now();

                Ok(self.store.update(&mut recipe).await?.then_some(true))
            }
        })
        .await
        .within(Target::Recipe, "apply_picture")?;

        Ok(())
    }
}
