//! OS-specific application directories.

use std::path::PathBuf;

use crate::constants::APP_NAME;
use crate::error::{SioError, SioResult};

pub struct Platform;

impl Platform {
    /// Get the platform-specific application data directory.
    ///
    /// - Windows: `%APPDATA%/sio`
    /// - macOS: `~/Library/Application Support/sio`
    /// - Linux: `~/.local/share/sio`
    pub fn data_dir() -> SioResult<PathBuf> {
        let base = dirs::data_dir()
            .ok_or_else(|| SioError::Config("could not determine data directory".into()))?;
        Ok(base.join(APP_NAME))
    }

    /// Get the platform-specific configuration directory.
    pub fn config_dir() -> SioResult<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| SioError::Config("could not determine config directory".into()))?;
        Ok(base.join(APP_NAME))
    }
}
