//! Platform data directory resolution.
//!
//! - macOS: `~/Library/Application Support/VentLink`
//! - Windows: `%APPDATA%\VentLink`
//! - Linux: `$XDG_DATA_HOME/ventlink` or `~/.local/share/ventlink`
//!
//! This module does not create directories; the caller decides when.

use std::path::PathBuf;

use vl_core::app_dirs::AppDirs;
use vl_core::ports::{AppDirsError, AppDirsPort};

#[cfg(target_os = "linux")]
const APP_DIR_NAME: &str = "ventlink";
#[cfg(not(target_os = "linux"))]
const APP_DIR_NAME: &str = "VentLink";

pub struct PlatformAppDirs {
    override_root: Option<PathBuf>,
}

impl PlatformAppDirs {
    pub fn new() -> Self {
        Self {
            override_root: None,
        }
    }

    /// Use a fixed data root instead of the platform default.
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            override_root: Some(root),
        }
    }
}

impl Default for PlatformAppDirs {
    fn default() -> Self {
        Self::new()
    }
}

impl AppDirsPort for PlatformAppDirs {
    fn get_app_dirs(&self) -> Result<AppDirs, AppDirsError> {
        if let Some(root) = &self.override_root {
            return Ok(AppDirs {
                app_data_root: root.clone(),
            });
        }

        let base_dir = dirs::data_dir().ok_or(AppDirsError::Unresolved)?;
        Ok(AppDirs {
            app_data_root: base_dir.join(APP_DIR_NAME),
        })
    }
}
