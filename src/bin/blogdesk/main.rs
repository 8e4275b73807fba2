use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spdlog::{info, warn};

use blogdesk::composer::PostComposer;
use blogdesk::config::Config;
use blogdesk::content_store::ContentStore;
use blogdesk::identity::{FixedIdentity, IdentityProvider, OsIdentity};
use blogdesk::image_optimizer::ImageOptimizer;
use blogdesk::logger::configure_logger;
use blogdesk::settings::{Settings, Theme};
use blogdesk::storage::FileStorage;

use crate::config::{open_config, write_sample_cfg};
use crate::optimize::{image_cmd, ImageArgs};
use crate::post::{draft_cmd, post_cmd, DraftCommand, PostCommand};

mod config;
mod optimize;
mod post;

const CFG_FILE_NAME: &str = "blogdesk.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path. Defaults to blogdesk.toml in the executable dir, the current dir or the user config dir
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish, edit, browse and search posts
    #[command(subcommand)]
    Post(PostCommand),
    /// Work on the draft
    #[command(subcommand)]
    Draft(DraftCommand),
    /// Light or dark previews
    #[command(subcommand)]
    Theme(ThemeCommand),
    /// Optimize an image the way cover images are optimized
    Image(ImageArgs),
    /// Write a sample configuration
    Init {
        /// Directory where blogdesk.toml is written
        #[arg(short, long)]
        out_dir: String,
    },
}

#[derive(Subcommand, Debug)]
enum ThemeCommand {
    Get,
    Set { theme: Theme },
    Toggle,
}

/// Everything a command needs, built once from the configuration
pub(crate) struct App {
    pub config: Config,
    pub composer: PostComposer<FileStorage, FixedIdentity>,
    pub settings: Settings<FileStorage>,
}

impl App {
    fn open(config: Config) -> Result<App> {
        let storage_dir = config.paths.storage_dir.clone()
            .context("No storage directory configured")?;
        let storage = FileStorage::open(&storage_dir, config.store.quota_bytes)
            .with_context(|| format!("Error opening storage in {}", storage_dir.display()))?;
        info!("Using storage in {}", storage_dir.display());

        let author = config.identity.author.clone()
            .or_else(|| OsIdentity.display_name());
        let composer = PostComposer::new(
            ContentStore::new(storage.clone(), config.store.clone()),
            ImageOptimizer::new(config.optimizer.clone()),
            FixedIdentity(author),
        );

        Ok(App {
            config,
            composer,
            settings: Settings::new(storage),
        })
    }
}

fn theme_cmd(app: &mut App, cmd: ThemeCommand) -> Result<()> {
    let theme = match cmd {
        ThemeCommand::Get => app.settings.theme(),
        ThemeCommand::Set { theme } => {
            app.settings.set_theme(theme)?;
            theme
        }
        ThemeCommand::Toggle => app.settings.toggle_theme()?,
    };
    println!("{}", theme);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Command::Init { out_dir } = args.command {
        let path = write_sample_cfg(&PathBuf::from(out_dir))?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let config = open_config(args.config_path.map(PathBuf::from))?;
    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    let mut app = App::open(config)?;
    match args.command {
        Command::Post(cmd) => post_cmd(&mut app, cmd),
        Command::Draft(cmd) => draft_cmd(&mut app, cmd),
        Command::Theme(cmd) => theme_cmd(&mut app, cmd),
        Command::Image(args) => image_cmd(&app, args),
        Command::Init { .. } => Ok(()),
    }
}
