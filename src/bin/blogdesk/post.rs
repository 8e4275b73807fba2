use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use blogdesk::composer::{ComposerForm, Notice};
use blogdesk::image_optimizer::ImageInput;
use blogdesk::post::{Category, PostId};
use blogdesk::view::list_renderer::ListRenderer;
use blogdesk::view::post_renderer::PostRenderer;
use blogdesk::view::{read_template, DEFAULT_LIST_TEMPLATE, DEFAULT_POST_TEMPLATE, LIST_TEMPLATE_FILE, POST_TEMPLATE_FILE};

use crate::App;

#[derive(Args, Debug)]
pub(crate) struct FormArgs {
    /// Title of the post
    #[arg(short, long)]
    title: Option<String>,

    /// technology, lifestyle, travel or food
    #[arg(short = 'k', long)]
    category: Option<Category>,

    /// Tag, up to 5. Can be repeated
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// HTML content
    #[arg(long, conflicts_with = "content_file")]
    content: Option<String>,

    /// File with the HTML content
    #[arg(long)]
    content_file: Option<PathBuf>,

    /// Cover image file. It is resized and compressed before being stored
    #[arg(long)]
    cover: Option<PathBuf>,

    /// Remove the current cover image
    #[arg(long, conflicts_with = "cover")]
    remove_cover: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum PostCommand {
    /// Publish a new post
    Create(FormArgs),
    /// Edit a published post. Only the given fields change
    Edit {
        id: PostId,
        #[command(flatten)]
        form: FormArgs,
    },
    /// Delete a post
    Delete { id: PostId },
    /// Render the preview of a post
    Show {
        id: PostId,
        /// Writes the preview to a file instead of the stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List posts, newest first
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(short = 'k', long)]
        category: Option<Category>,
    },
    /// Search titles, categories and tags
    Search { query: String },
}

#[derive(Subcommand, Debug)]
pub(crate) enum DraftCommand {
    /// Save the draft, merging the given fields into the current one
    Save(FormArgs),
    /// Show the draft
    Show,
    /// Publish the draft
    Publish,
    /// Throw the draft away
    Discard,
}

fn print_notice(notice: &Notice) {
    match notice {
        Notice::ImageSkipped(_) | Notice::NotFound(_) => eprintln!("{}", notice),
        _ => println!("{}", notice),
    }
}

/// Fills `form` with the given arguments. Image problems are reported but do not stop the command.
fn fill_form(app: &App, form: &mut ComposerForm, args: FormArgs) -> Result<()> {
    if let Some(title) = args.title {
        form.fields.title = title;
    }
    if let Some(category) = args.category {
        form.fields.category = Some(category);
    }
    if !args.tags.is_empty() {
        form.fields.tags = args.tags.iter().collect();
    }
    if let Some(content) = args.content {
        form.fields.content = content;
    }
    if let Some(content_file) = args.content_file {
        form.fields.content = fs::read_to_string(&content_file)
            .with_context(|| format!("Error reading {}", content_file.display()))?;
    }
    if args.remove_cover {
        form.remove_cover();
    }
    if let Some(cover) = args.cover {
        let notice = match fs::read(&cover) {
            Ok(bytes) => app.composer.attach_cover(form, ImageInput::Bytes(bytes)),
            Err(e) => Some(Notice::ImageSkipped(format!("{}: {}", cover.display(), e))),
        };
        if let Some(notice) = notice {
            print_notice(&notice);
        }
    }
    Ok(())
}

fn publish(app: &mut App, form: &mut ComposerForm) -> Result<()> {
    let notice = app.composer.publish(form)?;
    print_notice(&notice);
    if let Notice::NotFound(_) = notice {
        bail!("Nothing was saved");
    }
    Ok(())
}

fn print_list(app: &App, posts: &[blogdesk::post::Post]) -> Result<()> {
    let template = read_template(app.config.paths.template_dir.as_deref(), LIST_TEMPLATE_FILE, DEFAULT_LIST_TEMPLATE)?;
    let renderer = ListRenderer::new(&template)?;
    println!("{}", renderer.render(posts, app.settings.theme()));
    Ok(())
}

pub(crate) fn post_cmd(app: &mut App, cmd: PostCommand) -> Result<()> {
    match cmd {
        PostCommand::Create(args) => {
            let mut form = ComposerForm::new();
            fill_form(app, &mut form, args)?;
            publish(app, &mut form)
        }
        PostCommand::Edit { id, form: args } => {
            let mut form = match app.composer.edit(id) {
                Ok(form) => form,
                Err(notice) => bail!("{}", notice),
            };
            fill_form(app, &mut form, args)?;
            publish(app, &mut form)
        }
        PostCommand::Delete { id } => {
            app.composer.store_mut().delete_post(id)?;
            println!("Post {} deleted", id);
            Ok(())
        }
        PostCommand::Show { id, output } => {
            let Some(post) = app.composer.store().get_post(id) else {
                bail!("{}", Notice::NotFound(id));
            };
            let template = read_template(app.config.paths.template_dir.as_deref(), POST_TEMPLATE_FILE, DEFAULT_POST_TEMPLATE)?;
            let rendered = PostRenderer::new(&template)?.render(&post, app.settings.theme());
            match output {
                Some(path) => {
                    fs::write(&path, rendered).with_context(|| format!("Error writing {}", path.display()))?;
                    println!("Preview written to {}", path.display());
                }
                None => println!("{}", rendered),
            }
            Ok(())
        }
        PostCommand::List { page, category } => {
            let store = app.composer.store();
            let page_size = app.config.defaults.page_size;
            let post_page = match category {
                Some(category) => store.category_page(category, page, page_size),
                None => store.list_page(page, page_size),
            }.map_err(anyhow::Error::msg)?;
            let template = read_template(app.config.paths.template_dir.as_deref(), LIST_TEMPLATE_FILE, DEFAULT_LIST_TEMPLATE)?;
            let renderer = ListRenderer::new(&template)?;
            println!("{}", renderer.render_page(&post_page, app.settings.theme()));
            Ok(())
        }
        PostCommand::Search { query } => {
            let posts = app.composer.store().search(&query);
            print_list(app, &posts)
        }
    }
}

pub(crate) fn draft_cmd(app: &mut App, cmd: DraftCommand) -> Result<()> {
    match cmd {
        DraftCommand::Save(args) => {
            let mut form = match app.composer.restore_draft() {
                Some((form, _)) => form,
                None => ComposerForm::new(),
            };
            fill_form(app, &mut form, args)?;
            let notice = app.composer.save_draft(&form)?;
            print_notice(&notice);
            Ok(())
        }
        DraftCommand::Show => {
            match app.composer.store().load_draft() {
                Some(draft) => {
                    println!("Last saved: {}", draft.last_saved.to_rfc3339());
                    println!("Title: {}", draft.title);
                    println!("Category: {}", draft.category.map(|c| c.to_string()).unwrap_or_default());
                    println!("Tags: {}", draft.tags.as_slice().join(" "));
                    println!("Cover image: {}", if draft.cover_image.is_some() { "yes" } else { "no" });
                    println!("{}", draft.content);
                }
                None => println!("No draft"),
            }
            Ok(())
        }
        DraftCommand::Publish => {
            let Some((mut form, _)) = app.composer.restore_draft() else {
                bail!("No draft to publish");
            };
            publish(app, &mut form)
        }
        DraftCommand::Discard => {
            let mut form = ComposerForm::new();
            app.composer.cancel(&mut form);
            println!("Draft discarded");
            Ok(())
        }
    }
}
