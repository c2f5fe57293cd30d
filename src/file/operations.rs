//! ファイル操作コア機能
//!
//! ファイル読み込み、アトミック保存、リネームの実装

use crate::error::{FileError, Result};
use std::path::{Path, PathBuf};

/// ファイル読み込み処理
pub struct FileReader;

impl FileReader {
    pub fn new() -> Self {
        Self
    }

    /// ファイル内容を読み込み（存在しない場合は `None`）
    pub fn read_file(&self, path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }
        if !path.is_file() {
            return Err(FileError::InvalidPath {
                path: format!("Not a regular file: {}", path.display()),
            }
            .into());
        }

        let content = std::fs::read_to_string(path).map_err(|e| FileError::from_io(&e, path))?;

        // BOM除去と改行コード統一
        let without_bom = content.strip_prefix('\u{feff}').unwrap_or(&content);
        Ok(Some(without_bom.replace("\r\n", "\n")))
    }
}

impl Default for FileReader {
    fn default() -> Self {
        Self
    }
}

/// ファイル保存処理（一時ファイル経由のアトミック保存）
pub struct FileSaver;

impl FileSaver {
    pub fn new() -> Self {
        Self
    }

    /// ファイルを保存
    pub fn save_file(&self, path: &Path, content: &str) -> Result<()> {
        log::debug!("save_file: {} ({} bytes)", path.display(), content.len());
        self.atomic_save_impl(path, content)
    }

    /// アトミック保存（一時ファイル経由）
    fn atomic_save_impl(&self, path: &Path, content: &str) -> Result<()> {
        let temp_path = temp_path_for(path)?;

        std::fs::write(&temp_path, content.as_bytes())
            .map_err(|e| FileError::from_io(&e, &temp_path))?;

        std::fs::rename(&temp_path, path).map_err(|e| {
            log::warn!("atomic save rename failed for {}: {}", path.display(), e);
            let _ = std::fs::remove_file(&temp_path);
            FileError::from_io(&e, path)
        })?;

        Ok(())
    }
}

impl Default for FileSaver {
    fn default() -> Self {
        Self::new()
    }
}

fn temp_path_for(original: &Path) -> Result<PathBuf> {
    let parent = original.parent().ok_or_else(|| FileError::InvalidPath {
        path: original.display().to_string(),
    })?;
    let filename = original.file_name().ok_or_else(|| FileError::InvalidPath {
        path: original.display().to_string(),
    })?;

    let temp_name = format!(".{}_{}", filename.to_string_lossy(), std::process::id());
    Ok(parent.join(temp_name))
}

/// ファイルをリネームする
///
/// 移動先が既に存在する場合は上書きしない。移動先の親ディレクトリは必要に応じて作成する
pub fn rename_file(from: &Path, to: &Path) -> Result<()> {
    if !from.is_file() {
        return Err(FileError::NotFound {
            path: from.display().to_string(),
        }
        .into());
    }
    if to.exists() {
        return Err(FileError::AlreadyExists {
            path: to.display().to_string(),
        }
        .into());
    }
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|e| FileError::from_io(&e, parent))?;
    }

    std::fs::rename(from, to).map_err(|e| FileError::from_io(&e, from))?;
    log::info!("renamed {} -> {}", from.display(), to.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CljrError;
    use tempfile::tempdir;

    #[test]
    fn read_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let result = FileReader::new().read_file(&dir.path().join("new.clj")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn read_normalizes_line_endings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.clj");
        std::fs::write(&path, "\u{feff}(ns a)\r\n(def x 1)\r\n").unwrap();

        let content = FileReader::new().read_file(&path).unwrap().unwrap();
        assert_eq!(content, "(ns a)\n(def x 1)\n");
    }

    #[test]
    fn atomic_save_replaces_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.clj");
        std::fs::write(&path, "old").unwrap();

        FileSaver::new().save_file(&path, "(ns a)\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "(ns a)\n");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn rename_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("src/a.clj");
        std::fs::create_dir_all(from.parent().unwrap()).unwrap();
        std::fs::write(&from, "(ns a)").unwrap();

        let to = dir.path().join("src/deep/b.clj");
        rename_file(&from, &to).unwrap();

        assert!(!from.exists());
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "(ns a)");
    }

    #[test]
    fn rename_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("a.clj");
        let to = dir.path().join("b.clj");
        std::fs::write(&from, "a").unwrap();
        std::fs::write(&to, "b").unwrap();

        let err = rename_file(&from, &to).unwrap_err();
        assert!(matches!(err, CljrError::File(FileError::AlreadyExists { .. })));
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "b");
    }
}
