//! Connection settings remembered between runs.
//!
//! Keys this version does not know about are kept on rewrite so older and
//! newer builds can share one file.
use crate::error::ConfigError;
use crate::util::{now_epoch_ms, write_atomic};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radarr_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_profile_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_profile_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at_epoch_ms: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SavedSettings {
    /// Root folder and profile are only offered together, with the profile
    /// name for display.
    pub fn root_and_profile(&self) -> Option<(&str, i64, &str)> {
        match (
            self.root_folder.as_deref(),
            self.quality_profile_id,
            self.quality_profile_name.as_deref(),
        ) {
            (Some(root), Some(id), Some(name)) if !root.is_empty() => Some((root, id, name)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn try_load(&self) -> Result<Option<SavedSettings>, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Missing or malformed settings are treated as absent.
    pub fn load(&self) -> Option<SavedSettings> {
        match self.try_load() {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring saved settings");
                None
            }
        }
    }

    /// Stamp and write `settings`, readable by the owner only.
    pub fn save(&self, settings: &SavedSettings) -> Result<()> {
        let mut stamped = settings.clone();
        stamped.saved_at_epoch_ms = Some(u64::try_from(now_epoch_ms()).unwrap_or(u64::MAX));
        let mut bytes = serde_json::to_vec_pretty(&stamped).context("serialize settings")?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes)
            .with_context(|| format!("write {}", self.path.display()))?;
        restrict_permissions(&self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("chmod 600 {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
