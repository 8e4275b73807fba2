use std::io;
use std::io::ErrorKind;

use ramhorns::Template;

use crate::post::Post;
use crate::settings::Theme;
use crate::text_utils::{format_date_time, reading_time_minutes};
use crate::view::{view_tags, ViewTag};

#[derive(ramhorns::Content)]
struct ViewItem<'a> {
    theme: &'a str,
    id: String,
    author: &'a str,
    category: &'a str,
    tags: &'a Vec<ViewTag<'a>>,
    date: &'a str,
    time: &'a str,
    edited: bool,
    reading_time: u64,
    has_cover: bool,
    cover_image: &'a str,
    post_title: &'a str,
    post_content: &'a str,
}

/// Full post preview
pub struct PostRenderer<'a> {
    pub template: Template<'a>,
}

impl<'a> PostRenderer<'a> {
    pub fn new(view_tpl_src: &'a str) -> io::Result<PostRenderer<'a>> {
        let template = match Template::new(view_tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(io::Error::new(ErrorKind::InvalidInput, format!("Error parsing post view template: {}", e)));
            }
        };

        Ok(PostRenderer {
            template,
        })
    }

    pub fn render(&self, post: &Post, theme: Theme) -> String {
        let tags = &view_tags(post.tags.as_slice());
        let (date, time) = format_date_time(&post.created_at);
        let cover_image = post.cover_image.as_deref().unwrap_or_default();

        self.template.render(&ViewItem {
            theme: theme.as_str(),
            id: post.id.to_string(),
            author: post.author.as_str(),
            category: post.category.as_str(),
            tags,
            date: date.as_str(),
            time: time.as_str(),
            edited: post.updated_at.is_some(),
            reading_time: reading_time_minutes(&post.content) as u64,
            has_cover: !cover_image.is_empty(),
            cover_image,
            post_title: post.title.as_str(),
            post_content: post.content.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::post::{Category, PostId, Tags};
    use crate::view::DEFAULT_POST_TEMPLATE;

    use super::*;

    fn post() -> Post {
        Post {
            id: PostId(1704164645000),
            title: "<post-title>".to_string(),
            content: "<p>post content</p>".to_string(),
            category: Category::Technology,
            tags: Tags::from_iter(["rust", "programming"]),
            cover_image: None,
            author: "<Thiago>".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn render_view() {
        let template_src = r##"ID=[{{id}}]
TITLE=[{{post_title}}]
AUTHOR=[{{author}}]
DATE=[{{date}}]
TIME=[{{time}}]
CATEGORY=[{{category}}]
TAGS=[{{#tags}}({{tag}}){{/tags}}]
EDITED=[{{#edited}}yes{{/edited}}]
POST_CONTENT=[{{{post_content}}}]"##;
        let post_renderer = PostRenderer::new(template_src).unwrap();
        let res = post_renderer.render(&post(), Theme::Light);
        assert_eq!(res, r##"ID=[1704164645000]
TITLE=[&lt;post-title&gt;]
AUTHOR=[&lt;Thiago&gt;]
DATE=[2024-01-02]
TIME=[03:04:05]
CATEGORY=[technology]
TAGS=[(rust)(programming)]
EDITED=[]
POST_CONTENT=[<p>post content</p>]"##);
    }

    #[test]
    fn render_default_template_with_cover() {
        let mut post = post();
        post.cover_image = Some("data:image/jpeg;base64,AAAA".to_string());
        let post_renderer = PostRenderer::new(DEFAULT_POST_TEMPLATE).unwrap();
        let res = post_renderer.render(&post, Theme::Dark);
        assert!(res.contains(r#"<article class="post dark">"#));
        assert!(res.contains(r#"src="data:image/jpeg;base64,AAAA""#));
        assert!(res.contains("#rust"));
        assert!(res.contains("1 min read"));
    }

    #[test]
    fn render_default_template_without_cover() {
        let post_renderer = PostRenderer::new(DEFAULT_POST_TEMPLATE).unwrap();
        let res = post_renderer.render(&post(), Theme::Light);
        assert!(!res.contains("<img"));
    }

    #[test]
    fn mismatched_sections_are_rejected() {
        assert!(PostRenderer::new("{{#title}}<h1>{{/author}}").is_err());
        assert!(PostRenderer::new("{{/title}}").is_err());
    }
}
