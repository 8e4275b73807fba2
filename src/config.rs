use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;

use crate::content_store::StoreConfig;
use crate::image_optimizer::OptimizerConfig;

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct Paths {
    /// Where posts, the draft and the settings are kept
    pub storage_dir: Option<PathBuf>,
    /// Overrides for the built-in preview.html and list.html templates
    pub template_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Defaults {
    pub page_size: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults { page_size: 10 }
    }
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct Identity {
    /// Name used to sign posts. The OS user name is used when missing.
    pub author: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, Debug)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct Config {
    pub paths: Paths,
    pub defaults: Defaults,
    pub store: StoreConfig,
    pub optimizer: OptimizerConfig,
    pub identity: Identity,
    pub log: Option<Log>,
}

fn parse_path(path: PathBuf) -> PathBuf {
    let Some(str_path) = path.to_str() else {
        return path;
    };

    if !str_path.starts_with("${exe_dir}") {
        return path;
    }

    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    match exe_dir {
        Some(exe_dir) => PathBuf::from(str_path.replace("${exe_dir}", &exe_dir.to_string_lossy())),
        None => path,
    }
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    cfg.paths = Paths {
        storage_dir: cfg.paths.storage_dir.map(parse_path),
        template_dir: cfg.paths.template_dir.map(parse_path),
    };
    if let Some(ref mut log) = cfg.log {
        log.location = log.location.take().map(parse_path);
    }

    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}
