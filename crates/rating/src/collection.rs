use recipebox_db::Document;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingEntry {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub rating: f64,
}

/// Every rating given to one recipe. `average_rating` is `None` while
/// `ratings` is empty and always the mean of `ratings` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingCollection {
    #[serde(rename = "recipeID")]
    pub recipe_id: String,
    pub ratings: Vec<RatingEntry>,
    pub average_rating: Option<f64>,
}

impl Document for RatingCollection {
    const COLLECTION: &'static str = "ratings";

    fn key(&self) -> Option<String> {
        Some(self.recipe_id.to_owned())
    }
}

impl RatingCollection {
    pub fn new(recipe_id: impl Into<String>) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            ratings: vec![],
            average_rating: None,
        }
    }

    pub fn position(&self, user_id: &str) -> Option<usize> {
        self.ratings.iter().position(|e| e.user_id == user_id)
    }

    pub fn rating_of(&self, user_id: &str) -> Option<f64> {
        self.position(user_id).map(|i| self.ratings[i].rating)
    }

    pub fn count(&self) -> usize {
        self.ratings.len()
    }

    pub(crate) fn push(&mut self, user_id: impl Into<String>, rating: f64) {
        self.ratings.push(RatingEntry {
            user_id: user_id.into(),
            rating,
        });
        self.recompute();
    }

    pub(crate) fn replace(&mut self, index: usize, rating: f64) {
        self.ratings[index].rating = rating;
        self.recompute();
    }

    pub(crate) fn remove(&mut self, index: usize) {
        self.ratings.remove(index);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.average_rating = if self.ratings.is_empty() {
            None
        } else {
            let sum: f64 = self.ratings.iter().map(|e| e.rating).sum();
            Some(sum / self.ratings.len() as f64)
        };

        tracing::debug!(
            recipe_id = self.recipe_id,
            count = self.ratings.len(),
            average = ?self.average_rating,
            "average recomputed"
        );
    }
}
