use recipebox_db::Document;
use recipebox_shared::{Ingredient, Picture, RatingRef};
use serde::{Deserialize, Serialize};

/// Canonical stored form of a recipe: every reference is an id or a sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRecord {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<String>,
    pub tags: Vec<String>,
    pub owner: String,
    pub rating: RatingRef,
    pub picture: Picture,
    pub creation_timestamp: u64,
    pub update_timestamp: u64,
}

impl Document for RecipeRecord {
    const COLLECTION: &'static str = "recipes";
}
