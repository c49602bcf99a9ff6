pub mod config;
pub mod deck;
pub mod fetch;
pub mod layout;
pub mod pdf;
pub mod render;
pub mod scryfall;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Command;
use clap_complete::Shell;
use colored::Colorize;

/// Default directory for deck files.
pub const DEFAULT_DECKS_DIR: &str = "decks";

/// Default directory for downloaded card images.
pub const DEFAULT_IMAGES_DIR: &str = "images";

/// Default directory for generated PDF files.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Resolve the deck file to an absolute path.
///
/// The path is used as given if it exists,
/// otherwise it is looked up by file name inside the decks directory.
///
/// ```rust
/// use std::path::Path;
/// use proxy_printer::resolve_deck_path;
///
/// let missing = resolve_deck_path(Path::new("no-such-deck.txt"), Path::new("no-such-dir"));
/// assert!(missing.is_err());
/// ```
pub fn resolve_deck_path(path: &Path, decks_dir: &Path) -> Result<PathBuf> {
    let candidates = [
        Some(path.to_path_buf()),
        path.file_name().map(|name| decks_dir.join(name)),
    ];

    let Some(filepath) = candidates.into_iter().flatten().find(|candidate| candidate.is_file()) else {
        anyhow::bail!(
            "Deck file does not exist or is not accessible: '{}' (also looked in '{}')",
            path.display(),
            decks_dir.display()
        );
    };

    let absolute_path = dunce::canonicalize(&filepath)?;
    Ok(absolute_path)
}

/// Output file path for a deck: `<output dir>/<deck stem>_<suffix>.pdf`.
///
/// ```rust
/// use std::path::Path;
/// use proxy_printer::output_file_path;
///
/// let path = output_file_path(Path::new("output"), Path::new("decks/goblins.txt"), "print");
/// assert_eq!(path, Path::new("output").join("goblins_print.pdf"));
/// ```
#[must_use]
pub fn output_file_path(output_dir: &Path, deck_path: &Path, suffix: &str) -> PathBuf {
    let stem = path_to_file_stem_string(deck_path);
    output_dir.join(format!("{stem}_{suffix}.pdf"))
}

/// Create the directory if it does not exist yet.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Convert `OsStr` to String with invalid Unicode handling.
pub fn os_str_to_string(name: &OsStr) -> String {
    name.to_str().map_or_else(
        || name.to_string_lossy().replace('\u{FFFD}', ""),
        std::string::ToString::to_string,
    )
}

/// Convert given path to string with invalid Unicode handling.
pub fn path_to_string(path: &Path) -> String {
    path.to_str().map_or_else(
        || path.to_string_lossy().to_string().replace('\u{FFFD}', ""),
        std::string::ToString::to_string,
    )
}

/// Convert given path to file stem string with invalid Unicode handling.
#[must_use]
pub fn path_to_file_stem_string(path: &Path) -> String {
    os_str_to_string(path.file_stem().unwrap_or_default())
}

#[inline]
pub fn print_error(message: &str) {
    eprintln!("{}", format!("Error: {message}").red());
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        $crate::print_error(&format!($($arg)*))
    };
}

#[inline]
pub fn print_warning(message: &str) {
    eprintln!("{}", message.yellow());
}

#[macro_export]
macro_rules! print_warning {
    ($($arg:tt)*) => {
        $crate::print_warning(&format!($($arg)*))
    };
}

/// Generate a shell completion script for the given shell.
pub fn generate_shell_completion(shell: Shell, mut command: Command, install: bool, command_name: &str) -> Result<()> {
    if install {
        let out_dir = get_shell_completion_dir(shell, command_name)?;
        let path = clap_complete::generate_to(shell, &mut command, command_name, out_dir)?;
        println!("Completion file generated to: {}", path.display());
    } else {
        clap_complete::generate(shell, &mut command, command_name, &mut std::io::stdout());
    }
    Ok(())
}

/// Determine the appropriate directory for storing shell completions.
///
/// First checks if the user-specific directory exists,
/// then checks for the global directory.
/// If neither exist, creates and uses the user-specific dir.
fn get_shell_completion_dir(shell: Shell, name: &str) -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to get home directory")?;

    // Special handling for oh-my-zsh.
    // Create custom "plugin", which will then have to be loaded in .zshrc
    if shell == Shell::Zsh {
        let omz_plugins = home.join(".oh-my-zsh/custom/plugins");
        if omz_plugins.exists() {
            let plugin_dir = omz_plugins.join(name);
            std::fs::create_dir_all(&plugin_dir)?;
            return Ok(plugin_dir);
        }
    }

    let user_dir = match shell {
        Shell::PowerShell => {
            if cfg!(windows) {
                home.join(r"Documents\PowerShell\completions")
            } else {
                home.join(".config/powershell/completions")
            }
        }
        Shell::Bash => home.join(".bash_completion.d"),
        Shell::Elvish => home.join(".elvish"),
        Shell::Fish => home.join(".config/fish/completions"),
        Shell::Zsh => home.join(".zsh/completions"),
        _ => anyhow::bail!("Unsupported shell"),
    };

    if user_dir.exists() {
        return Ok(user_dir);
    }

    let global_dir = match shell {
        Shell::PowerShell => {
            if cfg!(windows) {
                home.join(r"Documents\PowerShell\completions")
            } else {
                home.join(".config/powershell/completions")
            }
        }
        Shell::Bash => PathBuf::from("/etc/bash_completion.d"),
        Shell::Fish => PathBuf::from("/usr/share/fish/completions"),
        Shell::Zsh => PathBuf::from("/usr/share/zsh/site-functions"),
        _ => anyhow::bail!("Unsupported shell"),
    };

    if global_dir.exists() {
        return Ok(global_dir);
    }

    std::fs::create_dir_all(&user_dir)?;
    Ok(user_dir)
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    use std::fs::File;

    use tempfile::tempdir;

    #[test]
    fn test_resolve_deck_path_as_given() {
        let dir = tempdir().unwrap();
        let deck = dir.path().join("goblins.txt");
        File::create(&deck).unwrap();

        let resolved = resolve_deck_path(&deck, Path::new("nonexistent")).unwrap();
        assert_eq!(resolved, dunce::canonicalize(&deck).unwrap());
    }

    #[test]
    fn test_resolve_deck_path_from_decks_dir() {
        let dir = tempdir().unwrap();
        let deck = dir.path().join("elves.txt");
        File::create(&deck).unwrap();

        let resolved = resolve_deck_path(Path::new("elves.txt"), dir.path()).unwrap();
        assert_eq!(resolved, dunce::canonicalize(&deck).unwrap());
    }

    #[test]
    fn test_resolve_deck_path_nonexistent() {
        let dir = tempdir().unwrap();
        let resolved = resolve_deck_path(Path::new("missing.txt"), dir.path());
        assert!(resolved.is_err());
    }

    #[test]
    fn test_resolve_deck_path_directory_is_not_a_deck() {
        let dir = tempdir().unwrap();
        let resolved = resolve_deck_path(dir.path(), dir.path());
        assert!(resolved.is_err());
    }

    #[test]
    fn test_output_file_path() {
        let output = Path::new("out");
        assert_eq!(
            output_file_path(output, Path::new("/decks/burn.txt"), "overview"),
            output.join("burn_overview.pdf")
        );
        assert_eq!(
            output_file_path(output, Path::new("my.deck.list.txt"), "print"),
            output.join("my.deck.list_print.pdf")
        );
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir(&nested).unwrap();
    }

    #[test]
    fn test_path_to_file_stem_string() {
        assert_eq!(path_to_file_stem_string(Path::new("decks/Æther.txt")), "Æther");
        assert_eq!(path_to_string(Path::new("decks/a.txt")), "decks/a.txt");
    }
}
