//! Recipe attributes owned by a single user: tags and ingredients.

mod repository;
mod service;

pub use repository::*;
pub use service::*;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum length of a resource name.
pub const MAX_NAME_LENGTH: usize = 255;

/// Kinds of owned resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Tag,
    Ingredient,
}

impl ResourceKind {
    /// Table holding this kind of resource.
    pub(crate) fn table(self) -> &'static str {
        match self {
            ResourceKind::Tag => "tags",
            ResourceKind::Ingredient => "ingredients",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResourceKind::Tag => write!(f, "tag"),
            ResourceKind::Ingredient => write!(f, "ingredient"),
        }
    }
}

/// Resource as saved on database.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Resource {
    pub id: i64,
    pub name: String,
    #[serde(skip)]
    #[sqlx(rename = "user_id")]
    pub owner: i64,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_name() {
        let tag = Resource {
            id: 1,
            name: "Vegan".into(),
            owner: 1,
        };
        assert_eq!(tag.to_string(), "Vegan");
        assert_eq!(ResourceKind::Ingredient.to_string(), "ingredient");
    }

    #[test]
    fn test_owner_is_not_serialized() {
        let ingredient = Resource {
            id: 7,
            name: "Olive".into(),
            owner: 42,
        };
        assert_eq!(
            serde_json::to_value(&ingredient).unwrap(),
            serde_json::json!({ "id": 7, "name": "Olive" })
        );
    }
}
