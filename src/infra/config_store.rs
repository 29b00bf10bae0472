// ============================================================
// Config Store
// ============================================================
// Saves and restores the TextCrnnConfig a model was built from.
// Weights are not stored here; a collaborator that owns the
// training loop pairs this file with its own checkpoints.
//
//   {dir}/
//     text_crnn_config.json   ← pretty-printed hyperparameters
//
// A loaded config is validated before it is handed back, so a
// hand-edited file fails here rather than at init().

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::ml::model::TextCrnnConfig;

const CONFIG_FILE: &str = "text_crnn_config.json";

pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create config directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    pub fn save(&self, cfg: &TextCrnnConfig) -> Result<()> {
        let path = self.path();
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<TextCrnnConfig> {
        let path = self.path();

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        let cfg: TextCrnnConfig = serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))?;
        cfg.validate()
            .with_context(|| format!("Invalid config in '{}'", path.display()))?;

        tracing::debug!("Loaded model config from '{}'", path.display());
        Ok(cfg)
    }
}
