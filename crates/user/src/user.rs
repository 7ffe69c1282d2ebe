use std::ops::Deref;

use recipebox_db::{Document, Store, Stored, optimistic};
use recipebox_shared::{Error, Photos, Picture, Result, ResultExt, Role, State, Target};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    pub joined_at: u64,
    pub avatar: Picture,
    pub role: Role,
}

impl Document for UserRecord {
    const COLLECTION: &'static str = "users";

    fn key(&self) -> Option<String> {
        Some(self.username.to_lowercase())
    }
}

/// What other users may see of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    #[serde(rename = "joinedAt")]
    pub joined_at: u64,
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
    pub role: Role,
}

#[derive(Validate)]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 30))]
    pub username: String,
    #[validate(email)]
    pub email: String,
}

#[derive(Clone)]
pub struct Command {
    state: State<Store>,
    photos: Photos,
    max_attempts: u32,
}

impl Deref for Command {
    type Target = State<Store>;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl Command {
    pub fn new(state: State<Store>, photos: Photos) -> Self {
        Self {
            state,
            photos,
            max_attempts: crate::DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<String> {
        input.validate()?;

        let record = UserRecord {
            username: input.username,
            email: input.email,
            joined_at: recipebox_shared::now(),
            avatar: Picture::None,
            role: Role::User,
        };

        let user = match self.store.create(record).await {
            Ok(user) => user,
            Err(Error::Conflict(_)) => {
                return Err(Error::Conflict("Username already exists".to_owned()));
            }
            Err(err) => return Err(err.within(Target::User, "register")),
        };

        tracing::info!(user_id = user.id, username = user.username, "user registered");

        Ok(user.id)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Stored<UserRecord>>> {
        self.store.get(id).await.within(Target::User, "get")
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Stored<UserRecord>>> {
        self.store
            .find_by_key(&username.to_lowercase())
            .await
            .within(Target::User, "find_by_username")
    }

    pub async fn sanitized(&self, id: &str) -> Result<UserView> {
        let Some(user) = self.get(id).await? else {
            recipebox_shared::not_found!("user {id} not found");
        };

        Ok(UserView {
            id: user.id.to_owned(),
            username: user.username.to_owned(),
            joined_at: user.joined_at,
            avatar_url: self.photos.picture_url(&user.avatar),
            role: user.role,
        })
    }

    pub async fn set_avatar(&self, id: &str, filename: impl Into<String>) -> Result<()> {
        let avatar = Picture::from(filename.into());

        optimistic(self.max_attempts, |_| {
            let avatar = avatar.clone();

            async move {
                let Some(mut user) = self.get(id).await? else {
                    recipebox_shared::not_found!("user {id} not found");
                };

                user.avatar = avatar;

                Ok(self.store.update(&mut user).await?.then_some(()))
            }
        })
        .await
        .within(Target::User, "set_avatar")?;

        tracing::info!(user_id = id, "avatar changed");

        Ok(())
    }
}
