use std::io;
use std::io::ErrorKind;

use ramhorns::Template;

use crate::content_store::PostPage;
use crate::post::Post;
use crate::settings::Theme;
use crate::text_utils::{excerpt, format_date_time, reading_time_minutes};
use crate::view::{view_tags, ViewTag};

pub const SUMMARY_CHARS: usize = 150;

#[derive(ramhorns::Content)]
struct ListPage<'a> {
    theme: &'a str,
    post_list: Vec<PostItem<'a>>,
    page_list: Vec<ViewPagination>,
    show_pagination: bool,
}

#[derive(ramhorns::Content)]
struct PostItem<'a> {
    id: String,
    date: String,
    time: String,
    title: &'a str,
    category: &'a str,
    tags: Vec<ViewTag<'a>>,
    reading_time: u64,
    summary: String,
}

#[derive(ramhorns::Content)]
struct ViewPagination {
    current: bool,
    number: u32,
}

/// Post cards, as shown when browsing or searching
pub struct ListRenderer<'a> {
    pub template: Template<'a>,
}

impl<'a> ListRenderer<'a> {
    pub fn new(list_tpl_src: &'a str) -> io::Result<ListRenderer<'a>> {
        let template = match Template::new(list_tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(io::Error::new(ErrorKind::InvalidInput, format!("Error parsing list template: {}", e)));
            }
        };

        Ok(ListRenderer {
            template,
        })
    }

    pub fn render(&self, posts: &[Post], theme: Theme) -> String {
        self.render_list(posts, theme, 1, 1)
    }

    pub fn render_page(&self, page: &PostPage, theme: Theme) -> String {
        self.render_list(&page.posts, theme, page.page, page.page_count)
    }

    fn render_list(&self, posts: &[Post], theme: Theme, cur_page: u32, page_count: u32) -> String {
        let mut post_list = Vec::with_capacity(posts.len());
        for post in posts {
            let (date, time) = format_date_time(&post.last_activity());
            post_list.push(PostItem {
                id: post.id.to_string(),
                date,
                time,
                title: post.title.as_str(),
                category: post.category.as_str(),
                tags: view_tags(post.tags.as_slice()),
                reading_time: reading_time_minutes(&post.content) as u64,
                summary: excerpt(&post.content, SUMMARY_CHARS),
            });
        }

        let page_list: Vec<ViewPagination> = (1..=page_count)
            .map(|number| ViewPagination {
                current: number == cur_page,
                number,
            })
            .collect();

        self.template.render(&ListPage {
            theme: theme.as_str(),
            post_list,
            page_list,
            show_pagination: page_count > 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::post::{Category, PostId, Tags};
    use crate::view::DEFAULT_LIST_TEMPLATE;

    use super::*;

    fn post(id: u64, title: &str) -> Post {
        Post {
            id: PostId(id),
            title: title.to_string(),
            content: "<p>Someone asked me this question today and I did not have an answer.</p>".to_string(),
            category: Category::Lifestyle,
            tags: Tags::from_iter(["career"]),
            cover_image: None,
            author: "Anonymous".to_string(),
            created_at: Utc.with_ymd_and_hms(2022, 4, 2, 12, 5, 0).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn render_list() {
        let template_src = "{{#post_list}}[{{id}}|{{title}}|{{date}}|{{category}}|{{#tags}}{{tag}}{{/tags}}|{{summary}}]{{/post_list}}";
        let renderer = ListRenderer::new(template_src).unwrap();
        let res = renderer.render(&[post(2, "Second"), post(1, "First")], Theme::Light);
        assert_eq!(res, "[2|Second|2022-04-02|lifestyle|career|Someone asked me this question today and I did not have an answer.]\
[1|First|2022-04-02|lifestyle|career|Someone asked me this question today and I did not have an answer.]");
    }

    #[test]
    fn render_empty_list() {
        let renderer = ListRenderer::new(DEFAULT_LIST_TEMPLATE).unwrap();
        let res = renderer.render(&[], Theme::Dark);
        assert!(res.contains("No posts yet"));
        assert!(res.contains(r#"class="posts dark""#));
        assert!(!res.contains("<nav>"));
    }

    #[test]
    fn render_pagination() {
        let template_src = "{{#show_pagination}}{{#page_list}}{{#current}}[{{number}}]{{/current}}{{^current}}{{number}}{{/current}}{{/page_list}}{{/show_pagination}}";
        let renderer = ListRenderer::new(template_src).unwrap();
        let page = PostPage {
            posts: vec![post(1, "First")],
            page: 2,
            page_count: 3,
        };
        assert_eq!(renderer.render_page(&page, Theme::Light), "1[2]3");
    }
}
