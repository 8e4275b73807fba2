use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::post::{Category, PostFields, Tags};

/// In-progress form contents. Any of them may still be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftFields {
    pub title: String,
    pub content: String,
    pub category: Option<Category>,
    pub tags: Tags,
    pub cover_image: Option<String>,
}

impl DraftFields {
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.content.trim().is_empty()
            && self.category.is_none()
            && self.tags.is_empty()
            && self.cover_image.is_none()
    }

    /// `None` while the category is still missing
    pub fn to_post_fields(&self) -> Option<PostFields> {
        Some(PostFields {
            title: self.title.clone(),
            content: self.content.clone(),
            category: self.category?,
            tags: self.tags.clone(),
            cover_image: self.cover_image.clone(),
        })
    }
}

impl From<PostFields> for DraftFields {
    fn from(fields: PostFields) -> Self {
        DraftFields {
            title: fields.title,
            content: fields.content,
            category: Some(fields.category),
            tags: fields.tags,
            cover_image: fields.cover_image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub last_saved: DateTime<Utc>,
}

impl Draft {
    pub fn new(fields: DraftFields, last_saved: DateTime<Utc>) -> Self {
        Draft {
            title: fields.title,
            content: fields.content,
            category: fields.category,
            tags: fields.tags,
            cover_image: fields.cover_image,
            last_saved,
        }
    }

    pub fn fields(&self) -> DraftFields {
        DraftFields {
            title: self.title.clone(),
            content: self.content.clone(),
            category: self.category,
            tags: self.tags.clone(),
            cover_image: self.cover_image.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DraftStatus {
    Saved(Draft),
    NothingToSave,
}
