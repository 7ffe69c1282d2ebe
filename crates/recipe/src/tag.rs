use std::ops::Deref;

use recipebox_db::{Document, Filter, Page, Store, Stored, optimistic};
use recipebox_shared::{Error, Result, ResultExt, State, Target};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

impl Document for Tag {
    const COLLECTION: &'static str = "tags";

    fn key(&self) -> Option<String> {
        Some(self.name.to_owned())
    }
}

#[derive(Validate)]
struct SearchInput {
    #[validate(length(min = 2))]
    fragment: String,
}

#[derive(Clone)]
pub struct Tags {
    state: State<Store>,
    max_attempts: u32,
}

impl Deref for Tags {
    type Target = State<Store>;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl Tags {
    pub fn new(state: State<Store>) -> Self {
        Self {
            state,
            max_attempts: crate::DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Exactly one tag per name. More than one is never papered over.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Stored<Tag>>> {
        let mut found = self
            .store
            .find::<Tag>(&[Filter::eq("name", name)], Some(Page::first(2)))
            .await
            .within(Target::Tag, "find_by_name")?;

        if found.len() > 1 {
            return Err(Error::Integrity(format!("more than one tag named {name}")));
        }

        Ok(found.pop())
    }

    /// Id of the tag called `name`, created on first use.
    pub async fn tag_id(&self, name: &str) -> Result<String> {
        optimistic(self.max_attempts, |_| self.try_tag_id(name))
            .await
            .within(Target::Tag, "tag_id")
    }

    async fn try_tag_id(&self, name: &str) -> Result<Option<String>> {
        if let Some(tag) = self.find_by_name(name).await? {
            return Ok(Some(tag.id));
        }

        match self
            .store
            .create(Tag {
                name: name.to_owned(),
            })
            .await
        {
            Ok(tag) => {
                tracing::info!(tag_id = tag.id, name, "tag created");

                Ok(Some(tag.id))
            }
            Err(Error::Conflict(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Stored<Tag>>> {
        self.store.get(id).await.within(Target::Tag, "get")
    }

    /// Case-insensitive substring search over tag names.
    pub async fn search(&self, fragment: &str) -> Result<Vec<Stored<Tag>>> {
        SearchInput {
            fragment: fragment.to_owned(),
        }
        .validate()?;

        self.store
            .find(&[Filter::like("name", fragment)], None)
            .await
            .within(Target::Tag, "search")
    }
}
