use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;

use blogdesk::config::{read_config, Config};

use crate::CFG_FILE_NAME;

const CONFIG_SAMPLE: &str = r#"# blogdesk configuration, created on {{TODAY}}
# For the file locations, if you want it to be relative to the executable directory
# use ${exe_dir}/location

[paths]
storage_dir = "data"
# template_dir = "templates"

[defaults]
page_size = 10

# Posts kept, oldest evicted first. When storage refuses a write,
# it is retried once keeping only retry_capacity posts.
[store]
capacity = 50
retry_capacity = 25
quota_bytes = 5242880

[optimizer]
max_width = 800
max_bytes = 300000
default_quality = 0.7
min_quality = 0.3
quality_step = 0.1

# [identity]
# author = "Your Name"

# [log]
# level = "Info"
# log_to_console = false
# location = "${exe_dir}/log/blogdesk.log"
"#;

fn get_config_path() -> Option<PathBuf> {
    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let candidates = [
        exe_dir,
        env::current_dir().ok(),
        dirs::config_dir().map(|dir| dir.join("blogdesk")),
    ];

    candidates.into_iter()
        .flatten()
        .map(|dir| dir.join(CFG_FILE_NAME))
        .find(|path| path.exists())
}

fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("blogdesk")
}

/// Without a configuration file everything runs on defaults
pub(crate) fn open_config(cfg_path: Option<PathBuf>) -> Result<Config> {
    let config_path = match cfg_path {
        Some(path) if !path.exists() => bail!("Configuration file {} not found", path.display()),
        Some(path) => Some(path),
        None => get_config_path(),
    };

    let mut config = match config_path {
        Some(ref path) => read_config(path)?,
        None => Config::default(),
    };

    // Relative locations are relative to the configuration file
    let cfg_dir = config_path.as_deref().and_then(Path::parent);
    let storage_dir = match (config.paths.storage_dir.take(), cfg_dir) {
        (None, _) => default_storage_dir(),
        (Some(dir), Some(cfg_dir)) if dir.is_relative() => cfg_dir.join(dir),
        (Some(dir), _) => dir,
    };
    config.paths.storage_dir = Some(storage_dir);

    Ok(config)
}

pub(crate) fn write_sample_cfg(out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Error creating directory {}", out_dir.display()))?;

    let file_path = out_dir.join(CFG_FILE_NAME);
    if file_path.exists() {
        bail!("{} already exists", file_path.display());
    }

    fs::write(&file_path, get_sample_cfg())
        .with_context(|| format!("Error writing {}", file_path.display()))?;
    Ok(file_path)
}

fn get_sample_cfg() -> String {
    let today = Local::now().format("%Y-%m-%d").to_string();
    CONFIG_SAMPLE.replace("{{TODAY}}", &today)
}
