use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Unit {
    #[default]
    G,
    Kg,
    Ml,
    L,
    Tsp,
    Tbsp,
    Cup,
    Piece,
    Pinch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: f64,
    pub unit: Unit,
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Reference from a recipe to its rating collection.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RatingRef {
    #[default]
    Unrated,
    Collection(String),
}

impl RatingRef {
    pub fn collection_id(&self) -> Option<&str> {
        match self {
            RatingRef::Unrated => None,
            RatingRef::Collection(id) => Some(id),
        }
    }
}

impl From<String> for RatingRef {
    fn from(value: String) -> Self {
        if value.is_empty() {
            RatingRef::Unrated
        } else {
            RatingRef::Collection(value)
        }
    }
}

impl From<RatingRef> for String {
    fn from(value: RatingRef) -> Self {
        match value {
            RatingRef::Unrated => String::new(),
            RatingRef::Collection(id) => id,
        }
    }
}

pub const NO_PICTURE: &str = "NO_PIC";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Picture {
    #[default]
    None,
    File(String),
}

impl Picture {
    pub fn filename(&self) -> Option<&str> {
        match self {
            Picture::None => None,
            Picture::File(name) => Some(name),
        }
    }
}

impl From<String> for Picture {
    fn from(value: String) -> Self {
        if value.is_empty() || value == NO_PICTURE {
            Picture::None
        } else {
            Picture::File(value)
        }
    }
}

impl From<Picture> for String {
    fn from(value: Picture) -> Self {
        match value {
            Picture::None => NO_PICTURE.to_owned(),
            Picture::File(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_serialize_as_plain_strings() {
        assert_eq!(serde_json::to_string(&RatingRef::Unrated).unwrap(), r#""""#);
        assert_eq!(serde_json::to_string(&Picture::None).unwrap(), r#""NO_PIC""#);

        let rating: RatingRef = serde_json::from_str(r#""01J00000000000000000000000""#).unwrap();
        assert_eq!(rating.collection_id(), Some("01J00000000000000000000000"));

        let picture: Picture = serde_json::from_str(r#""NO_PIC""#).unwrap();
        assert_eq!(picture, Picture::None);
    }

    #[test]
    fn unit_parses_lowercase_names() {
        assert_eq!("tbsp".parse::<Unit>().unwrap(), Unit::Tbsp);
        assert_eq!(Unit::Piece.to_string(), "piece");
        assert!("spoonful".parse::<Unit>().is_err());
    }
}
