//! File-based settings repository.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use vl_core::ports::SettingsPort;
use vl_core::settings::{Settings, CURRENT_SCHEMA_VERSION};

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

pub struct FileSettingsRepository {
    path: PathBuf,
}

impl FileSettingsRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> Self {
        Self {
            path: base_dir.as_ref().join(DEFAULT_SETTINGS_FILE),
        }
    }

    async fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create settings dir failed: {}", dir.display()))?;
        }
        Ok(())
    }

    async fn atomic_write(&self, content: &str) -> Result<()> {
        self.ensure_parent_dir().await?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("write temp settings failed: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).await.with_context(|| {
            format!(
                "rename temp settings to target failed: {} -> {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}

#[async_trait]
impl SettingsPort for FileSettingsRepository {
    /// Load settings, falling back to defaults when the file is missing.
    /// Files written by an older schema are rewritten at the current one;
    /// missing sections are filled from defaults during deserialization.
    async fn load(&self) -> Result<Settings> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Settings::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read settings failed: {}", self.path.display()))
            }
        };

        let mut settings: Settings = serde_json::from_str(&content)?;
        if settings.schema_version < CURRENT_SCHEMA_VERSION {
            settings.schema_version = CURRENT_SCHEMA_VERSION;
            self.save(&settings).await?;
        }

        Ok(settings)
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        let content =
            serde_json::to_string_pretty(settings).context("serialize settings failed")?;

        self.atomic_write(&content).await
    }
}
