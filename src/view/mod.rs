use std::io;
use std::io::ErrorKind;
use std::path::Path;

pub mod list_renderer;
pub mod post_renderer;

pub const POST_TEMPLATE_FILE: &str = "preview.html";
pub const LIST_TEMPLATE_FILE: &str = "list.html";

pub const DEFAULT_POST_TEMPLATE: &str = r##"<article class="post {{theme}}">
{{#has_cover}}<img class="cover" src="{{{cover_image}}}" alt="{{post_title}}">
{{/has_cover}}<h1>{{post_title}}</h1>
<div class="meta">{{author}} | {{date}} {{time}} | {{category}} | {{reading_time}} min read</div>
<div class="tags">{{#tags}}<span class="tag">#{{tag}}</span>{{/tags}}</div>
<div class="content">{{{post_content}}}</div>
</article>
"##;

pub const DEFAULT_LIST_TEMPLATE: &str = r##"<section class="posts {{theme}}">
{{#post_list}}<article class="card">
<h2>{{title}}</h2>
<div class="meta">{{id}} | {{date}} | {{category}} | {{reading_time}} min read</div>
<p class="excerpt">{{summary}}</p>
<div class="tags">{{#tags}}<span class="tag">#{{tag}}</span>{{/tags}}</div>
</article>
{{/post_list}}{{^post_list}}<p class="empty">No posts yet</p>
{{/post_list}}{{#show_pagination}}<nav>{{#page_list}}{{#current}}[{{number}}]{{/current}}{{^current}} {{number}} {{/current}}{{/page_list}}</nav>
{{/show_pagination}}</section>
"##;

#[derive(ramhorns::Content)]
pub(crate) struct ViewTag<'a> {
    tag: &'a str,
}

pub(crate) fn view_tags(tags: &[String]) -> Vec<ViewTag<'_>> {
    tags.iter().map(|t| ViewTag { tag: t.as_str() }).collect()
}

/// Template from `template_dir` when present there, the built-in one otherwise
pub fn read_template(template_dir: Option<&Path>, file_name: &str, default: &str) -> io::Result<String> {
    let Some(dir) = template_dir else {
        return Ok(default.to_string());
    };

    match std::fs::read_to_string(dir.join(file_name)) {
        Ok(template) => Ok(template),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(default.to_string()),
        Err(e) => Err(io::Error::new(e.kind(), format!("Error reading template {}: {}", file_name, e))),
    }
}
