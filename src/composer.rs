//! Drives the optimizer and the store on behalf of a post form, turning their failures
//! into notices the front-end can show.

use std::fmt;
use std::fmt::{Display, Formatter};

use spdlog::{info, warn};
use thiserror::Error;

use crate::content_store::ContentStore;
use crate::draft::{Draft, DraftFields, DraftStatus};
use crate::error::{OptimizeError, StoreError};
use crate::image_optimizer::{EncodedImage, ImageInput, ImageOptimizer};
use crate::identity::IdentityProvider;
use crate::post::{Post, PostId, PostUpdate};
use crate::storage::KeyValueStorage;

/// Identifies one image selection. Later selections get larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImageToken(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    ImageSkipped(String),
    NothingToSave,
    DraftSaved,
    NotFound(PostId),
    Published(PostId),
    Updated(PostId),
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ImageSkipped(reason) => write!(f, "Image was not attached: {}", reason),
            Notice::NothingToSave => write!(f, "Nothing to save"),
            Notice::DraftSaved => write!(f, "Draft saved successfully!"),
            Notice::NotFound(id) => write!(f, "Post {} not found", id),
            Notice::Published(id) => write!(f, "Post {} published", id),
            Notice::Updated(id) => write!(f, "Post {} updated", id),
        }
    }
}

#[derive(Error, Debug)]
pub enum ComposerError {
    #[error("A category is required to publish")]
    MissingCategory,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the author is editing. Only the latest image selection may set the cover.
#[derive(Debug, Default)]
pub struct ComposerForm {
    pub fields: DraftFields,
    /// Set when editing an already published post
    pub editing: Option<PostId>,
    last_token: u64,
}

impl ComposerForm {
    pub fn new() -> Self {
        ComposerForm::default()
    }

    pub fn editing(post: &Post) -> Self {
        ComposerForm {
            fields: post.fields().into(),
            editing: Some(post.id),
            last_token: 0,
        }
    }

    /// Starts an image selection, making any earlier one stale
    pub fn begin_image(&mut self) -> ImageToken {
        self.last_token += 1;
        ImageToken(self.last_token)
    }

    pub fn is_current(&self, token: ImageToken) -> bool {
        token.0 == self.last_token
    }

    /// Returns the notice to show, if any. Results of stale selections are dropped.
    pub fn apply_cover(&mut self, token: ImageToken, result: Result<EncodedImage, OptimizeError>) -> Option<Notice> {
        if !self.is_current(token) {
            info!("Dropping result of image selection {:?}, a newer one was made", token);
            return None;
        }

        match result {
            Ok(image) => {
                self.fields.cover_image = Some(image.to_data_uri());
                None
            }
            Err(e) => {
                warn!("Cover image skipped: {}", e);
                Some(Notice::ImageSkipped(e.to_string()))
            }
        }
    }

    pub fn remove_cover(&mut self) {
        // Any selection still running must not bring the cover back
        self.begin_image();
        self.fields.cover_image = None;
    }

    pub fn reset(&mut self) {
        self.fields = DraftFields::default();
        self.editing = None;
        self.begin_image();
    }
}

pub struct PostComposer<S: KeyValueStorage, I: IdentityProvider> {
    store: ContentStore<S>,
    optimizer: ImageOptimizer,
    identity: I,
}

impl<S: KeyValueStorage, I: IdentityProvider> PostComposer<S, I> {
    pub fn new(store: ContentStore<S>, optimizer: ImageOptimizer, identity: I) -> Self {
        PostComposer {
            store,
            optimizer,
            identity,
        }
    }

    pub fn store(&self) -> &ContentStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ContentStore<S> {
        &mut self.store
    }

    pub fn optimizer(&self) -> &ImageOptimizer {
        &self.optimizer
    }

    /// An image that cannot be decoded leaves the cover absent and never blocks the form
    pub fn attach_cover(&self, form: &mut ComposerForm, input: ImageInput) -> Option<Notice> {
        let token = form.begin_image();
        let result = self.optimizer.optimize(input);
        form.apply_cover(token, result)
    }

    /// Publishes the form, or saves the edit when the form edits an existing post.
    /// On failure the form and the draft are left untouched so the author can retry.
    pub fn publish(&mut self, form: &mut ComposerForm) -> Result<Notice, ComposerError> {
        let fields = form.fields.to_post_fields().ok_or(ComposerError::MissingCategory)?;

        let notice = match form.editing {
            Some(id) => match self.store.update_post(id, PostUpdate::from(fields)) {
                Ok(post) => Notice::Updated(post.id),
                Err(e) if e.is_not_found() => {
                    warn!("Post {} disappeared while being edited", id);
                    return Ok(Notice::NotFound(id));
                }
                Err(e) => return Err(e.into()),
            },
            None => {
                let author = self.identity.display_name();
                let post = self.store.create_post(fields, author.as_deref())?;
                self.store.discard_draft();
                Notice::Published(post.id)
            }
        };

        form.reset();
        Ok(notice)
    }

    pub fn save_draft(&mut self, form: &ComposerForm) -> Result<Notice, ComposerError> {
        match self.store.save_draft(form.fields.clone())? {
            DraftStatus::Saved(_) => Ok(Notice::DraftSaved),
            DraftStatus::NothingToSave => Ok(Notice::NothingToSave),
        }
    }

    pub fn restore_draft(&self) -> Option<(ComposerForm, Draft)> {
        let draft = self.store.load_draft()?;
        let form = ComposerForm {
            fields: draft.fields(),
            editing: None,
            last_token: 0,
        };
        Some((form, draft))
    }

    pub fn cancel(&mut self, form: &mut ComposerForm) {
        self.store.discard_draft();
        form.reset();
    }

    /// Opens a published post for editing
    pub fn edit(&self, id: PostId) -> Result<ComposerForm, Notice> {
        match self.store.get_post(id) {
            Some(post) => Ok(ComposerForm::editing(&post)),
            None => Err(Notice::NotFound(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::content_store::StoreConfig;
    use crate::identity::FixedIdentity;
    use crate::image_optimizer::test_images::flat_png;
    use crate::post::{Category, Tags};
    use crate::storage::MemoryStorage;

    use super::*;

    fn composer(identity: Option<&str>) -> PostComposer<MemoryStorage, FixedIdentity> {
        PostComposer::new(
            ContentStore::with_defaults(MemoryStorage::new()),
            ImageOptimizer::with_defaults(),
            FixedIdentity(identity.map(|s| s.to_string())),
        )
    }

    fn filled_form() -> ComposerForm {
        let mut form = ComposerForm::new();
        form.fields = DraftFields {
            title: "Lisbon in three days".to_string(),
            content: "<p>Pastel de nata</p>".to_string(),
            category: Some(Category::Travel),
            tags: Tags::from_iter(["portugal"]),
            cover_image: None,
        };
        form
    }

    #[test]
    fn test_publish_clears_draft_and_form() {
        let mut composer = composer(Some("Ada"));
        let mut form = filled_form();
        assert_eq!(composer.save_draft(&form).unwrap(), Notice::DraftSaved);

        let notice = composer.publish(&mut form).unwrap();
        let Notice::Published(id) = notice.clone() else {
            panic!("unexpected notice {:?}", notice);
        };

        let post = composer.store().get_post(id).unwrap();
        assert_eq!(post.author, "Ada");
        assert_eq!(post.title, "Lisbon in three days");
        assert!(composer.store().load_draft().is_none());
        assert!(form.fields.is_empty());
    }

    #[test]
    fn test_publish_failure_keeps_draft_and_form() {
        let store = ContentStore::new(MemoryStorage::with_quota(200), StoreConfig::default());
        let mut composer = PostComposer::new(store, ImageOptimizer::with_defaults(), FixedIdentity(None));
        let mut form = filled_form();
        composer.save_draft(&form).unwrap();

        form.fields.content = format!("<p>{}</p>", "long ".repeat(100));
        let res = composer.publish(&mut form);
        assert!(matches!(res, Err(ComposerError::Store(StoreError::StorageQuota(_)))));
        assert_eq!(form.fields.title, "Lisbon in three days");
        assert!(composer.store().load_draft().is_some());
    }

    #[test]
    fn test_publish_requires_category() {
        let mut composer = composer(None);
        let mut form = filled_form();
        form.fields.category = None;
        assert!(matches!(composer.publish(&mut form), Err(ComposerError::MissingCategory)));
    }

    #[test]
    fn test_edit_flow() {
        let mut composer = composer(None);
        let mut form = filled_form();
        let Notice::Published(id) = composer.publish(&mut form).unwrap() else {
            panic!("post not published");
        };

        let mut form = composer.edit(id).unwrap();
        form.fields.title = "Porto in two days".to_string();
        assert_eq!(composer.publish(&mut form).unwrap(), Notice::Updated(id));

        let post = composer.store().get_post(id).unwrap();
        assert_eq!(post.title, "Porto in two days");
        assert_eq!(post.author, "Anonymous");
        assert!(post.updated_at.is_some());
    }

    #[test]
    fn test_edit_of_deleted_post() {
        let mut composer = composer(None);
        let mut form = filled_form();
        let Notice::Published(id) = composer.publish(&mut form).unwrap() else {
            panic!("post not published");
        };
        let mut form = composer.edit(id).unwrap();
        composer.store_mut().delete_post(id).unwrap();

        assert_eq!(composer.publish(&mut form).unwrap(), Notice::NotFound(id));
        assert!(composer.edit(id).is_err());
        assert!(composer.store().list_posts().is_empty());
    }

    #[test]
    fn test_undecodable_cover_is_skipped() {
        let composer = composer(None);
        let mut form = filled_form();
        let notice = composer.attach_cover(&mut form, ImageInput::Bytes(b"GIF89a garbage".to_vec()));
        assert!(matches!(notice, Some(Notice::ImageSkipped(_))));
        assert!(form.fields.cover_image.is_none());
    }

    #[test]
    fn test_attach_cover() {
        let composer = composer(None);
        let mut form = filled_form();
        assert!(composer.attach_cover(&mut form, ImageInput::Bytes(flat_png(1000, 500))).is_none());
        assert!(form.fields.cover_image.as_deref().unwrap().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_nothing_to_save() {
        let mut composer = composer(None);
        assert_eq!(composer.save_draft(&ComposerForm::new()).unwrap(), Notice::NothingToSave);
        assert!(composer.restore_draft().is_none());
    }

    #[test]
    fn test_restore_and_cancel() {
        let mut composer = composer(None);
        composer.save_draft(&filled_form()).unwrap();
        let (mut form, draft) = composer.restore_draft().unwrap();
        assert_eq!(form.fields, filled_form().fields);
        assert_eq!(draft.title, "Lisbon in three days");

        composer.cancel(&mut form);
        assert!(composer.restore_draft().is_none());
        assert!(form.fields.is_empty());
    }

    #[tokio::test]
    async fn test_last_selected_image_wins() {
        let optimizer = Arc::new(ImageOptimizer::with_defaults());
        let mut form = filled_form();

        let first = form.begin_image();
        let second = form.begin_image();
        let second_res = optimizer.clone().optimize_async(ImageInput::Bytes(flat_png(20, 10))).await;
        let first_res = optimizer.clone().optimize_async(ImageInput::Bytes(flat_png(900, 900))).await;

        // The second selection finishes first, the first one arrives late
        assert!(form.apply_cover(second, second_res).is_none());
        let cover = form.fields.cover_image.clone();
        assert!(form.apply_cover(first, first_res).is_none());
        assert_eq!(form.fields.cover_image, cover);
        assert!(!form.is_current(first));
    }

    #[test]
    fn test_removed_cover_is_not_restored() {
        let optimizer = ImageOptimizer::with_defaults();
        let mut form = filled_form();
        let token = form.begin_image();
        form.remove_cover();
        assert!(form.apply_cover(token, optimizer.optimize(ImageInput::Bytes(flat_png(4, 4)))).is_none());
        assert!(form.fields.cover_image.is_none());
    }
}
