use crate::error::{EcoBalanceError, Result};
use ecobalance_common::prompts::{is_known_model, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 既定のデータセット（Webアプリと同じ配信パス）
pub const DEFAULT_DATASET: &str = "data/santander-data.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    /// ファイルパスまたは http(s) URL
    pub dataset: String,
    /// 生成リクエストの打ち切り秒数
    pub timeout_seconds: u64,
    /// 会話履歴の保存先（未指定なら設定ディレクトリ配下）
    pub session_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.into(),
            dataset: DEFAULT_DATASET.into(),
            timeout_seconds: 120,
            session_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        if !is_known_model(&config.model) {
            log::warn!("unknown model in config: {}", config.model);
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| EcoBalanceError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("ecobalance"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// 会話履歴の保存ディレクトリ
    pub fn session_dir(&self) -> Result<PathBuf> {
        match &self.session_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::config_dir()?.join("sessions")),
        }
    }

    pub fn get_api_key(&self) -> Result<String> {
        // 環境変数を優先
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.api_key.clone().ok_or(EcoBalanceError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn set_model(&mut self, model: String) -> Result<()> {
        if !is_known_model(&model) {
            return Err(EcoBalanceError::Config(format!("未対応のモデル: {}", model)));
        }
        self.model = model;
        self.save()
    }
}
