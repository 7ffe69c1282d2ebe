mod add;
mod collection;
mod query;
mod remove;
mod subscription;
mod update;

use std::ops::Deref;

use recipebox_db::{KeyedLocks, Store};
use recipebox_shared::State;
use serde::Serialize;
use validator::{Validate, ValidationError};

pub use collection::{RatingCollection, RatingEntry};
pub use subscription::RatingSubscriber;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Method {
    Add,
    Update,
    Remove,
}

/// Outcome of a rating mutation. Business-rule rejections come back with
/// `success: false`, never as errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingResponse {
    pub success: bool,
    pub method: Method,
    #[serde(rename = "recipeID")]
    pub recipe_id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "msg")]
    pub message: String,
}

impl RatingResponse {
    fn new(
        success: bool,
        method: Method,
        recipe_id: &str,
        user_id: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success,
            method,
            recipe_id: recipe_id.to_owned(),
            user_id: user_id.to_owned(),
            message: message.into(),
        }
    }
}

#[derive(Validate)]
struct RatingInput {
    #[validate(range(min = 1.0, max = 5.0), custom(function = "finite"))]
    rating: f64,
}

fn finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("finite"))
    }
}

fn validate_rating(rating: f64) -> recipebox_shared::Result<()> {
    RatingInput { rating }.validate()?;

    Ok(())
}

#[derive(Clone)]
pub struct Command {
    state: State<Store>,
    max_attempts: u32,
    locks: KeyedLocks,
}

impl Deref for Command {
    type Target = State<Store>;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl Command {
    pub fn new(state: State<Store>) -> Self {
        Self {
            state,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            locks: KeyedLocks::default(),
        }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = std::cmp::max(attempts, 1);
        self
    }
}
