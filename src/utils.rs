use directories::UserDirs;
use std::path::PathBuf;

use super::constants::{CONFIG_DIR, CONFIG_FILE_NAME};
use super::external_api::ApiError;

/// Get path to the config file in the user's home directory
pub fn get_config_path() -> Result<PathBuf, ApiError> {
    UserDirs::new()
        .ok_or(ApiError::NotFoundUserDir)
        .map(|user_dirs| user_dirs.home_dir().join(CONFIG_DIR).join(CONFIG_FILE_NAME))
}

/// Config path given on the command line, or the default one
pub fn resolve_config_path(path: Option<PathBuf>) -> Result<PathBuf, ApiError> {
    match path {
        Some(path) => Ok(path),
        None => get_config_path(),
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_get_config_path() {
        let path = get_config_path().unwrap();
        assert!(path.ends_with(".config/tagview/config.json"), "Got path {:?}", path);
    }

    #[test]
    fn test_resolve_explicit_config_path() {
        let path = PathBuf::from("/tmp/tagview.json");
        assert_eq!(resolve_config_path(Some(path.clone())).unwrap(), path);
    }
}
