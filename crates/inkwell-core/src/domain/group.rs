use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Group - a topical community posts can be filed under. The slug is its public identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            slug: slug.into(),
            description: description.into(),
        }
    }
}
