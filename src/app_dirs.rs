use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Default location of the session log under $HOME/.local/state/keydrill
    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("keydrill");
            Some(state_dir.join("train.log"))
        } else {
            ProjectDirs::from("", "", "keydrill")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("train.log"))
        }
    }
}
