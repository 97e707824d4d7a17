//! Default configuration locations.

use std::path::{Path, PathBuf};

/// Application directory name under the user config dir.
pub const APP_DIR: &str = "usagemon";

/// Config file name inside [`default_config_dir`].
pub const CONFIG_FILE: &str = "config.yaml";

/// Dotfile name used in the home and working directories.
pub const DOTFILE: &str = ".usagemon.yaml";

/// Returns the default configuration directory (`~/.config/usagemon`).
///
/// Uses `$HOME/.config` on every platform so the path matches the
/// documented location; falls back to `dirs::config_dir` without a home.
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".config").join(APP_DIR))
        .or_else(|| dirs::config_dir().map(|c| c.join(APP_DIR)))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the default config file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join(CONFIG_FILE)
}

/// Returns the config file search order, excluding an explicit path.
pub fn config_search_paths() -> Vec<PathBuf> {
    search_paths_from(dirs::home_dir().as_deref(), Path::new("."))
}

fn search_paths_from(home: Option<&Path>, cwd: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(3);
    if let Some(home) = home {
        paths.push(home.join(".config").join(APP_DIR).join(CONFIG_FILE));
        paths.push(home.join(DOTFILE));
    }
    paths.push(cwd.join(DOTFILE));
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_order() {
        let paths = search_paths_from(Some(Path::new("/home/u")), Path::new("/work"));
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/home/u/.config/usagemon/config.yaml"),
                PathBuf::from("/home/u/.usagemon.yaml"),
                PathBuf::from("/work/.usagemon.yaml"),
            ]
        );
    }

    #[test]
    fn test_search_without_home() {
        let paths = search_paths_from(None, Path::new("."));
        assert_eq!(paths, vec![PathBuf::from("./.usagemon.yaml")]);
    }

    #[test]
    fn test_default_config_path_name() {
        assert!(default_config_path().ends_with("usagemon/config.yaml"));
    }
}
