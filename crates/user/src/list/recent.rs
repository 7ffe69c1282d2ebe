use std::ops::Deref;

use recipebox_db::{Document, Filter, Store, Stored, optimistic};
use recipebox_shared::{Error, Result, ResultExt, State, Target};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RECENTS_SIZE: usize = 20;

/// Recently viewed recipes, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentList {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub recents: Vec<String>,
}

impl Document for RecentList {
    const COLLECTION: &'static str = "recents";

    fn key(&self) -> Option<String> {
        Some(self.user_id.to_owned())
    }
}

impl RecentList {
    fn push(&mut self, recipe_id: &str, size: usize) {
        self.recents.retain(|id| id != recipe_id);
        self.recents.push(recipe_id.to_owned());

        let overflow = self.recents.len().saturating_sub(size.max(1));
        self.recents.drain(..overflow);
    }
}

#[derive(Clone)]
pub struct Recents {
    state: State<Store>,
    size: usize,
    max_attempts: u32,
}

impl Deref for Recents {
    type Target = State<Store>;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl Recents {
    pub fn new(state: State<Store>) -> Self {
        Self {
            state,
            size: DEFAULT_RECENTS_SIZE,
            max_attempts: crate::DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = std::cmp::max(size, 1);
        self
    }

    pub async fn push(&self, user_id: &str, recipe_id: &str) -> Result<()> {
        optimistic(self.max_attempts, |_| self.try_push(user_id, recipe_id))
            .await
            .within(Target::Recent, "push")?;

        tracing::info!(user_id, recipe_id, "added to recents");

        Ok(())
    }

    async fn try_push(&self, user_id: &str, recipe_id: &str) -> Result<Option<()>> {
        let Some(mut list) = self.store.find_by_key::<RecentList>(user_id).await? else {
            let mut list = RecentList {
                user_id: user_id.to_owned(),
                recents: vec![],
            };
            list.push(recipe_id, self.size);

            return match self.store.create(list).await {
                Ok(_) => Ok(Some(())),
                Err(Error::Conflict(_)) => Ok(None),
                Err(err) => Err(err),
            };
        };

        list.push(recipe_id, self.size);

        Ok(self.store.update(&mut list).await?.then_some(()))
    }

    /// Most recent first.
    pub async fn recipe_ids(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self
            .store
            .find_by_key::<RecentList>(user_id)
            .await
            .within(Target::Recent, "load")?
            .map(|list| list.data.recents.into_iter().rev().collect())
            .unwrap_or_default())
    }

    pub async fn strip_everywhere(&self, recipe_id: &str) -> Result<usize> {
        let lists: Vec<Stored<RecentList>> = self
            .store
            .find(&[Filter::contains("recents", recipe_id)], None)
            .await
            .within(Target::Recent, "strip")?;
        let mut stripped = 0;

        for list in lists {
            let id = list.id;

            optimistic(self.max_attempts, |_| self.try_strip(&id, recipe_id))
                .await
                .within(Target::Recent, "strip")?;
            stripped += 1;
        }

        Ok(stripped)
    }

    async fn try_strip(&self, id: &str, recipe_id: &str) -> Result<Option<()>> {
        let Some(mut list) = self.store.get::<RecentList>(id).await? else {
            return Ok(Some(()));
        };

        let len = list.recents.len();
        list.recents.retain(|r| r != recipe_id);
        if len == list.recents.len() {
            return Ok(Some(()));
        }

        Ok(self.store.update(&mut list).await?.then_some(()))
    }
}
