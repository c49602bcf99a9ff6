use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use serde::de::DeserializeOwned;

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

/// Path to the user config file: `$HOME/.config/proxy-printer.toml`
///
/// Returns `None` if the home directory cannot be determined.
pub static CONFIG_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let home_dir = dirs::home_dir()?;
    Some(home_dir.join(".config").join(format!("{PROJECT_NAME}.toml")))
});

/// Read and parse the user config file at the given path.
///
/// A missing file is not an error and yields the default value.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn read_user_config<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };

    match fs::read_to_string(path) {
        Ok(content) => {
            toml::from_str::<T>(&content).map_err(|e| anyhow!("Failed to parse config file {}:\n{e}", path.display()))
        }
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(error) => Err(anyhow!("Failed to read config file {}: {error}", path.display())),
    }
}
