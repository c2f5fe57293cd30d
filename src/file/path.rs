//! パス処理ユーティリティ
//!
//! ファイルパスの正規化、展開、相対化

use crate::error::{CljrError, Result};
use std::path::{Component, Path, PathBuf};

/// パスを字句的に正規化（`.` と `..` を解決）
pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {
                    return Err(CljrError::Path(format!(
                        "ルートを超えた親ディレクトリ参照: {}",
                        path.display()
                    )));
                }
                _ => components.push(component),
            },
            _ => components.push(component),
        }
    }

    Ok(components.iter().collect())
}

/// `~` と環境変数を展開
pub fn expand_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let raw = path.as_ref().to_string_lossy().to_string();
    let expanded = shellexpand::full(&raw)
        .map_err(|e| CljrError::Path(format!("環境変数展開エラー: {}", e)))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// 入力パスを `base_dir` 基準で解決し、正規化する
pub fn resolve_path<P: AsRef<Path>>(input: P, base_dir: &Path) -> Result<PathBuf> {
    let expanded = expand_path(input)?;
    let joined = if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    };
    normalize_path(joined)
}

/// ファイル拡張子の判定（大文字小文字を区別する）
pub fn has_extension<P: AsRef<Path>>(path: P, extension: &str) -> bool {
    path.as_ref()
        .extension()
        .map(|ext| ext == std::ffi::OsStr::new(extension))
        .unwrap_or(false)
}

/// ファイル名（拡張子なし）を取得
pub fn file_stem<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(|s| s.to_string())
}

/// `root` からの相対パス（`root` の外なら `None`）
pub fn relative_to(path: &Path, root: &Path) -> Option<PathBuf> {
    path.strip_prefix(root).ok().map(Path::to_path_buf)
}

/// 実在する部分までシンボリックリンクを解決した絶対パス
///
/// ファイルがまだ存在しない場合は親ディレクトリだけを解決する
pub fn canonicalize_lenient(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|dir| dir.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}
