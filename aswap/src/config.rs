pub mod file;
pub mod settings;
pub mod validation;

pub use self::{file::File, settings::*};
use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Locates and reads the configuration file, returning the path it was read
/// from so that `deploy` can write the updated contract address back.
pub fn read_config<T>(
    config_file: &Option<PathBuf>,
    default_config_path: T,
) -> anyhow::Result<(PathBuf, File)>
where
    T: FnOnce() -> anyhow::Result<PathBuf>,
{
    let path = match config_file {
        Some(path) => path.clone(),
        None => locate_default(Path::new(DEFAULT_CONFIG_FILE), default_config_path)?,
    };

    let file = File::read(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    Ok((path, file))
}

fn locate_default<T>(local: &Path, default_config_path: T) -> anyhow::Result<PathBuf>
where
    T: FnOnce() -> anyhow::Result<PathBuf>,
{
    if local.exists() {
        return Ok(local.to_path_buf());
    }

    let default_path = default_config_path()?;
    if default_path.exists() {
        tracing::debug!(
            "Using config file at default path: {}",
            default_path.display()
        );
        return Ok(default_path);
    }

    Err(anyhow!(
        "no config file found at {} or {}",
        local.display(),
        default_path.display()
    ))
}
