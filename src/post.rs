use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::text_utils::normalize_tag;

pub const MAX_TAGS: usize = 5;

/// Milliseconds since the Unix epoch at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

impl Display for PostId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>()
            .map(PostId)
            .map_err(|_| format!("Invalid post id {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technology,
    Lifestyle,
    Travel,
    Food,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Technology, Category::Lifestyle, Category::Travel, Category::Food];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::Lifestyle => "lifestyle",
            Category::Travel => "travel",
            Category::Food => "food",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Category::ALL.into_iter()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| format!("Unknown category {}. Expected one of: technology, lifestyle, travel, food", s))
    }
}

/// Normalized, duplicate free and capped at [`MAX_TAGS`], also when read back from storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Tags(Vec<String>);

impl Tags {
    pub fn new() -> Self {
        Tags(vec![])
    }

    /// Returns false when the tag was dropped: empty after normalization, duplicated or over the limit.
    pub fn add(&mut self, raw: &str) -> bool {
        let Some(tag) = normalize_tag(raw) else {
            return false;
        };

        if self.0.len() >= MAX_TAGS || self.0.contains(&tag) {
            return false;
        }

        self.0.push(tag);
        true
    }

    pub fn remove(&mut self, tag: &str) {
        self.0.retain(|t| t != tag);
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item=&String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        self.0.as_slice()
    }
}

impl From<Vec<String>> for Tags {
    fn from(raw: Vec<String>) -> Self {
        raw.into_iter().collect()
    }
}

impl From<Tags> for Vec<String> {
    fn from(tags: Tags) -> Self {
        tags.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for Tags {
    fn from_iter<T: IntoIterator<Item=S>>(iter: T) -> Self {
        let mut tags = Tags::new();
        for tag in iter {
            tags.add(tag.as_ref());
        }
        tags
    }
}

/// What the author fills in when publishing
#[derive(Debug, Clone, PartialEq)]
pub struct PostFields {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub tags: Tags,
    pub cover_image: Option<String>,
}

impl PostFields {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.title.trim().is_empty() {
            return Err(StoreError::Invalid("title is required".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(StoreError::Invalid("content is required".to_string()));
        }
        Ok(())
    }
}

/// Partial edit. `cover_image: Some(None)` removes the cover.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Tags>,
    pub cover_image: Option<Option<String>>,
}

impl From<PostFields> for PostUpdate {
    fn from(fields: PostFields) -> Self {
        PostUpdate {
            title: Some(fields.title),
            content: Some(fields.content),
            category: Some(fields.category),
            tags: Some(fields.tags),
            cover_image: Some(fields.cover_image),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub category: Category,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn fields(&self) -> PostFields {
        PostFields {
            title: self.title.clone(),
            content: self.content.clone(),
            category: self.category,
            tags: self.tags.clone(),
            cover_image: self.cover_image.clone(),
        }
    }

    /// Used to sort posts, newest first
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    /// `needle` must already be lowercase
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.category.as_str().contains(needle)
            || self.tags.iter().any(|t| t.contains(needle))
    }

    pub(crate) fn apply(&mut self, update: PostUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(cover_image) = update.cover_image {
            self.cover_image = cover_image;
        }
    }
}

impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "id={}, date={}, author={}, category={}\ntitle={}\ncontent:\n{}",
               self.id,
               self.created_at.to_rfc3339(),
               self.author,
               self.category,
               self.title,
               self.content
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample_post() -> Post {
        Post {
            id: PostId(1717171717171),
            title: "What I learned after 20+ years".to_string(),
            content: "<p>How to be a great software engineer?</p>".to_string(),
            category: Category::Technology,
            tags: Tags::from_iter(["Career", "coding"]),
            cover_image: None,
            author: "Anonymous".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 31, 16, 8, 37).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Travel".parse::<Category>(), Ok(Category::Travel));
        assert_eq!(" food ".parse::<Category>(), Ok(Category::Food));
        assert!("sports".parse::<Category>().is_err());
    }

    #[test]
    fn test_tags_are_normalized_and_capped() {
        let mut tags = Tags::from_iter(["Rust", "rust", "Web Dev", "#!", "a", "b", "c", "d"]);
        assert_eq!(tags.as_slice(), ["rust", "webdev", "a", "b", "c"]);
        assert!(!tags.add("e"));
        tags.remove("a");
        assert!(tags.add("e"));
        assert!(tags.contains("e"));
        assert_eq!(tags.len(), MAX_TAGS);
    }

    #[test]
    fn test_validate() {
        let mut fields = sample_post().fields();
        assert!(fields.validate().is_ok());
        fields.title = "   ".to_string();
        assert!(matches!(fields.validate(), Err(StoreError::Invalid(_))));
        fields.title = "t".to_string();
        fields.content = "".to_string();
        assert!(matches!(fields.validate(), Err(StoreError::Invalid(_))));
    }

    #[test]
    fn test_serialized_layout() {
        let post = sample_post();
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["id"], 1717171717171u64);
        assert_eq!(json["category"], "technology");
        assert_eq!(json["tags"], serde_json::json!(["career", "coding"]));
        assert_eq!(json["createdAt"], "2024-05-31T16:08:37Z");
        assert!(json.get("updatedAt").is_none());
        assert!(json.get("coverImage").is_none());

        let back: Post = serde_json::from_value(json).unwrap();
        assert_eq!(back, post);
    }

    #[test]
    fn test_stored_tags_are_normalized() {
        let tags: Tags = serde_json::from_str(r#"["Coding","Coding","a","b","c","d","e"]"#).unwrap();
        assert_eq!(tags.as_slice(), ["coding", "a", "b", "c", "d"]);
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["coding","a","b","c","d"]"#);
    }

    #[test]
    fn test_matches() {
        let post = sample_post();
        assert!(post.matches("learned"));
        assert!(post.matches("tech"));
        assert!(post.matches("cod"));
        assert!(!post.matches("travel"));
    }

    #[test]
    fn test_apply_update() {
        let mut post = sample_post();
        post.cover_image = Some("data:image/jpeg;base64,AAAA".to_string());
        post.apply(PostUpdate {
            title: Some("New title".to_string()),
            cover_image: Some(None),
            ..PostUpdate::default()
        });
        assert_eq!(post.title, "New title");
        assert_eq!(post.category, Category::Technology);
        assert!(post.cover_image.is_none());
    }
}
