//! 設定
//!
//! `<config_dir>/cljr/config.json` から読み込む。ファイルがなければデフォルト値を使う

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// コマンドのキーバインド方式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeybindingStyle {
    /// `"<prefix> rf"` 形式
    Prefix(String),
    /// `"<modifier>r <modifier>f"` 形式
    Modifier(String),
}

impl Default for KeybindingStyle {
    fn default() -> Self {
        KeybindingStyle::Prefix("C-c C-m".to_string())
    }
}

/// cljr の設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CljrConfig {
    /// 空のソースファイルを開いたときに ns 宣言を挿入する
    pub add_ns_to_blank_files: bool,
    /// プロジェクトルートを示すファイル名
    pub project_marker: String,
    /// ソースファイルの拡張子（ドットなし）
    pub source_extension: String,
    /// テストファイル名の接尾辞（拡張子を除く）
    pub test_suffix: String,
    /// プロジェクト全体置換で扱うファイル数の上限
    pub max_project_files: usize,
    /// 走査しないディレクトリ名
    pub ignored_dirs: Vec<String>,
    /// キーバインド方式
    pub keybinding: KeybindingStyle,
}

impl Default for CljrConfig {
    fn default() -> Self {
        Self {
            add_ns_to_blank_files: true,
            project_marker: "project.clj".to_string(),
            source_extension: "clj".to_string(),
            test_suffix: "_test".to_string(),
            max_project_files: 1000,
            ignored_dirs: vec![".git".to_string(), ".svn".to_string(), ".hg".to_string()],
            keybinding: KeybindingStyle::default(),
        }
    }
}

impl CljrConfig {
    /// デフォルトの設定ファイルパス
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cljr").join("config.json"))
    }

    /// デフォルトパスから読み込む（存在しなければデフォルト値）
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// 指定ファイルから読み込む
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_json(&content).map_err(|err| match err {
            crate::error::CljrError::Config(ConfigError::InvalidFile { message, .. }) => {
                ConfigError::InvalidFile {
                    path: path.display().to_string(),
                    message,
                }
                .into()
            }
            other => other,
        })?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// JSON 文字列から読み込み、検証する
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content).map_err(|e| ConfigError::InvalidFile {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 設定値の検証
    pub fn validate(&self) -> Result<()> {
        if self.project_marker.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "project_marker".to_string(),
            }
            .into());
        }
        if self.source_extension.trim().is_empty() || self.source_extension.starts_with('.') {
            return Err(ConfigError::InvalidValue {
                key: "source_extension".to_string(),
                value: self.source_extension.clone(),
            }
            .into());
        }
        if self.max_project_files == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_project_files".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
