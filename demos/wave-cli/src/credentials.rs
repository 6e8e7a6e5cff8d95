//! Local credentials file holding the refresh token
//!
//! The library never persists tokens; this is the caller-side store the CLI
//! uses between runs. Format: `{ "refresh_token": "..." }`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of the credentials file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// Long-lived refresh token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Credentials file location and I/O
#[derive(Debug, Clone)]
pub struct CredentialsFile {
    path: PathBuf,
}

impl CredentialsFile {
    /// Default location in the platform config directory
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bradford-white-wave")
            .join("credentials.json")
    }

    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.unwrap_or_else(Self::default_path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the file; a missing file is an empty credentials set
    pub fn load(&self) -> anyhow::Result<Credentials> {
        if !self.path.exists() {
            return Ok(Credentials::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Stored refresh token, or an error telling the user how to get one
    pub fn refresh_token(&self) -> anyhow::Result<String> {
        self.load()?.refresh_token.ok_or_else(|| {
            anyhow::anyhow!(
                "No refresh token in {}. Run `wave-cli auth-url` and `wave-cli exchange`, or `wave-cli login`.",
                self.path.display()
            )
        })
    }

    /// Write the refresh token, user-readable only on Unix
    pub fn save_refresh_token(&self, refresh_token: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let credentials = Credentials {
            refresh_token: Some(refresh_token.to_string()),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&credentials)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}
