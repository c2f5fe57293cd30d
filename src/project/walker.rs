//! ソースファイル列挙
//!
//! プロジェクト全体置換の対象ファイルを列挙する。外部プロセスは使わない

use crate::config::CljrConfig;
use crate::error::{FileError, Result};
use crate::file::has_extension;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// ルート以下のソースファイルを列挙するトレイト
pub trait SourceWalker {
    /// `root` 以下のソースファイル（バージョン管理ディレクトリを除く）
    fn source_files(&self, root: &Path) -> Result<Vec<PathBuf>>;
}

/// walkdir によるファイル列挙
#[derive(Debug, Clone)]
pub struct WalkdirSourceWalker {
    extension: String,
    ignored_dirs: Vec<String>,
    max_files: usize,
}

impl WalkdirSourceWalker {
    pub fn new(extension: impl Into<String>, ignored_dirs: Vec<String>, max_files: usize) -> Self {
        Self {
            extension: extension.into(),
            ignored_dirs,
            max_files,
        }
    }

    pub fn from_config(config: &CljrConfig) -> Self {
        Self::new(
            config.source_extension.clone(),
            config.ignored_dirs.clone(),
            config.max_project_files,
        )
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && self
                .ignored_dirs
                .iter()
                .any(|name| entry.file_name().to_string_lossy() == name.as_str())
    }
}

impl SourceWalker for WalkdirSourceWalker {
    fn source_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(FileError::InvalidPath {
                path: root.display().to_string(),
            }
            .into());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_ignored(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("skipping unreadable entry under {}: {}", root.display(), err);
                    continue;
                }
            };
            if entry.file_type().is_file() && has_extension(entry.path(), &self.extension) {
                files.push(entry.into_path());
                if files.len() >= self.max_files {
                    log::warn!(
                        "project file limit {} reached under {}",
                        self.max_files,
                        root.display()
                    );
                    break;
                }
            }
        }

        Ok(files)
    }
}

/// 固定のファイル一覧を返す（テストや組み込み先向け）
#[derive(Debug, Clone, Default)]
pub struct StaticSourceWalker {
    pub files: Vec<PathBuf>,
}

impl SourceWalker for StaticSourceWalker {
    fn source_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .files
            .iter()
            .filter(|path| path.starts_with(root))
            .cloned()
            .collect())
    }
}
