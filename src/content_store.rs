use chrono::Utc;
use serde::Deserialize;
use spdlog::{info, warn};

use crate::draft::{Draft, DraftFields, DraftStatus};
use crate::error::{StorageError, StoreError};
use crate::identity::resolve_author;
use crate::paginator::Paginator;
use crate::post::{Category, Post, PostFields, PostId, PostUpdate, Tags};
use crate::storage::KeyValueStorage;

pub const POSTS_KEY: &str = "blogs";
pub const DRAFT_KEY: &str = "blogDraft";
pub const MAX_TAG_SUGGESTIONS: usize = 5;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Posts kept. The oldest ones are evicted first.
    pub capacity: usize,
    /// Posts kept when retrying a refused write
    pub retry_capacity: usize,
    /// Size limit of the storage backend, if any
    pub quota_bytes: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            capacity: 50,
            retry_capacity: 25,
            quota_bytes: None,
        }
    }
}

#[derive(Debug)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub page: u32,
    pub page_count: u32,
}

/// Posts and the draft slot on top of a key-value storage.
///
/// Every operation reads the whole collection, changes it and writes it back. There is no
/// coordination between two stores sharing the same storage: the last write wins.
pub struct ContentStore<S: KeyValueStorage> {
    storage: S,
    config: StoreConfig,
}

impl<S: KeyValueStorage> ContentStore<S> {
    pub fn new(storage: S, config: StoreConfig) -> Self {
        ContentStore { storage, config }
    }

    pub fn with_defaults(storage: S) -> Self {
        Self::new(storage, StoreConfig::default())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Newest first, by last update or creation date
    pub fn list_posts(&self) -> Vec<Post> {
        let mut posts = self.load_posts();
        posts.sort_by(|a, b| {
            b.last_activity().cmp(&a.last_activity())
                .then_with(|| b.id.cmp(&a.id))
        });
        posts
    }

    pub fn get_post(&self, id: PostId) -> Option<Post> {
        self.load_posts().into_iter().find(|p| p.id == id)
    }

    pub fn create_post(&mut self, fields: PostFields, author: Option<&str>) -> Result<Post, StoreError> {
        fields.validate()?;

        let mut posts = self.load_posts();
        let now = Utc::now();
        let post = Post {
            id: Self::next_id(&posts, now.timestamp_millis()),
            title: fields.title,
            content: fields.content,
            category: fields.category,
            tags: fields.tags,
            cover_image: fields.cover_image,
            author: resolve_author(author),
            created_at: now,
            updated_at: None,
        };

        posts.push(post.clone());
        if posts.len() > self.config.capacity {
            let evicted = posts.len() - self.config.capacity;
            posts.drain(0..evicted);
            info!("Evicted {} old post(s) to keep {} posts", evicted, self.config.capacity);
        }

        self.persist(posts)?;
        info!("Post {} created: {}", post.id, post.title);
        Ok(post)
    }

    /// Applies `update` keeping the creation date, the author and the position in the collection
    pub fn update_post(&mut self, id: PostId, update: PostUpdate) -> Result<Post, StoreError> {
        let mut posts = self.load_posts();
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Err(StoreError::NotFound(id));
        };

        let mut updated = post.clone();
        updated.apply(update);
        updated.fields().validate()?;
        updated.updated_at = Some(Utc::now().max(updated.created_at));
        *post = updated.clone();

        self.persist(posts)?;
        info!("Post {} updated", id);
        Ok(updated)
    }

    /// Deleting a post that does not exist is not an error
    pub fn delete_post(&mut self, id: PostId) -> Result<(), StoreError> {
        let mut posts = self.load_posts();
        let count = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == count {
            return Ok(());
        }

        self.persist(posts)?;
        info!("Post {} deleted", id);
        Ok(())
    }

    /// Case-insensitive match on title, category and tags. A blank query lists everything.
    /// Spaces around a non blank query are part of it.
    pub fn search(&self, query: &str) -> Vec<Post> {
        let posts = self.list_posts();
        if query.trim().is_empty() {
            return posts;
        }

        let needle = query.to_lowercase();
        posts.into_iter()
            .filter(|p| p.matches(&needle))
            .collect()
    }

    /// Pages start at 1. The first page of an empty collection is empty.
    pub fn list_page(&self, page: u32, page_size: u32) -> Result<PostPage, String> {
        Self::page_of(self.list_posts(), page, page_size)
    }

    pub fn category_page(&self, category: Category, page: u32, page_size: u32) -> Result<PostPage, String> {
        Self::page_of(self.posts_by_category(category), page, page_size)
    }

    fn page_of(posts: Vec<Post>, page: u32, page_size: u32) -> Result<PostPage, String> {
        if posts.is_empty() && page == 1 {
            return Ok(PostPage { posts, page, page_count: 0 });
        }

        let paginator = Paginator::from(&posts, page_size)?;
        let page_posts = paginator.get_page(page)?.to_vec();
        Ok(PostPage {
            posts: page_posts,
            page,
            page_count: paginator.page_count(),
        })
    }

    pub fn posts_by_category(&self, category: Category) -> Vec<Post> {
        self.list_posts().into_iter()
            .filter(|p| p.category == category)
            .collect()
    }

    /// Distinct tags, most recently used first
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = vec![];
        for post in self.list_posts() {
            for tag in post.tags.iter() {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }
        tags
    }

    /// Known tags containing `input`, skipping the ones already chosen
    pub fn suggest_tags(&self, input: &str, category: Option<Category>, chosen: &Tags) -> Vec<String> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return vec![];
        }

        let posts = match category {
            Some(category) => self.posts_by_category(category),
            None => self.list_posts(),
        };

        let mut suggestions: Vec<String> = vec![];
        for tag in posts.iter().flat_map(|p| p.tags.iter()) {
            if suggestions.len() >= MAX_TAG_SUGGESTIONS {
                break;
            }
            if tag.contains(&needle) && !chosen.contains(tag) && !suggestions.contains(tag) {
                suggestions.push(tag.clone());
            }
        }
        suggestions
    }

    /// Overwrites the draft slot, unless there is nothing in it
    pub fn save_draft(&mut self, fields: DraftFields) -> Result<DraftStatus, StoreError> {
        if fields.is_empty() {
            return Ok(DraftStatus::NothingToSave);
        }

        let draft = Draft::new(fields, Utc::now());
        let raw = serde_json::to_string(&draft)
            .map_err(|e| StoreError::Invalid(format!("Unable to serialize draft: {}", e)))?;
        self.storage.set(DRAFT_KEY, &raw).map_err(StoreError::StorageQuota)?;
        Ok(DraftStatus::Saved(draft))
    }

    pub fn load_draft(&self) -> Option<Draft> {
        let raw = self.storage.get(DRAFT_KEY)?;
        match serde_json::from_str::<Draft>(&raw) {
            Ok(draft) => Some(draft),
            Err(e) => {
                warn!("Stored draft is unreadable, ignoring it: {}", e);
                None
            }
        }
    }

    pub fn discard_draft(&mut self) {
        self.storage.remove(DRAFT_KEY);
    }

    /// Insertion order. An unreadable collection reads as empty.
    fn load_posts(&self) -> Vec<Post> {
        let Some(raw) = self.storage.get(POSTS_KEY) else {
            return vec![];
        };

        match serde_json::from_str::<Vec<Post>>(&raw) {
            Ok(posts) => posts,
            Err(e) => {
                warn!("Stored posts are unreadable, starting with an empty collection: {}", e);
                vec![]
            }
        }
    }

    /// On a refused write, retries once keeping only the most recently active posts
    fn persist(&mut self, posts: Vec<Post>) -> Result<(), StoreError> {
        let err = match self.write_posts(&posts) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        let retry_capacity = self.config.retry_capacity;
        if posts.len() <= retry_capacity {
            return Err(StoreError::StorageQuota(err));
        }

        warn!("Storage refused {} posts ({}). Retrying with the {} most recent", posts.len(), err, retry_capacity);
        let reduced = Self::most_recent(posts, retry_capacity);
        self.write_posts(&reduced).map_err(StoreError::StorageQuota)
    }

    fn write_posts(&mut self, posts: &[Post]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(posts)
            .map_err(|e| StorageError::Io { key: POSTS_KEY.to_string(), source: e.into() })?;
        self.storage.set(POSTS_KEY, &raw)
    }

    /// Keeps the `count` most recently active posts, preserving their insertion order
    fn most_recent(posts: Vec<Post>, count: usize) -> Vec<Post> {
        let mut by_activity: Vec<(chrono::DateTime<Utc>, PostId)> = posts.iter()
            .map(|p| (p.last_activity(), p.id))
            .collect();
        by_activity.sort_by(|a, b| b.cmp(a));
        let keep: Vec<PostId> = by_activity.into_iter().take(count).map(|(_, id)| id).collect();

        posts.into_iter()
            .filter(|p| keep.contains(&p.id))
            .collect()
    }

    /// Creation time in milliseconds, bumped when needed so ids keep increasing
    fn next_id(posts: &[Post], now_millis: i64) -> PostId {
        let now = now_millis.max(0) as u64;
        match posts.iter().map(|p| p.id.0).max() {
            Some(max) if max >= now => PostId(max + 1),
            _ => PostId(now),
        }
    }
}
