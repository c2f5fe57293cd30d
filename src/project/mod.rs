//! プロジェクト検出
//!
//! 親ディレクトリをたどってプロジェクトマーカー（既定では `project.clj`）を探す

pub mod walker;

pub use walker::{SourceWalker, StaticSourceWalker, WalkdirSourceWalker};

use crate::error::{FileError, Result};
use std::path::{Path, PathBuf};

/// テストライブラリ
pub const MIDJE_NAMESPACE: &str = "midje.sweet";
pub const CLOJURE_TEST_NAMESPACE: &str = "clojure.test";

/// `start` から親方向へ `marker` を含むディレクトリを探す
///
/// `start` がファイルの場合はその親ディレクトリから探索する
pub fn locate_dominating_file(start: &Path, marker: &str) -> Option<PathBuf> {
    let first = if start.is_file() { start.parent()? } else { start };
    first
        .ancestors()
        .find(|dir| dir.join(marker).is_file())
        .map(Path::to_path_buf)
}

/// 検出されたプロジェクト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root: PathBuf,
    marker: String,
}

impl Project {
    /// ファイルまたはディレクトリを含むプロジェクトを探す
    pub fn discover(start: &Path, marker: &str) -> Option<Self> {
        let root = locate_dominating_file(start, marker)?;
        let root = root.canonicalize().unwrap_or(root);
        log::debug!("project root for {}: {}", start.display(), root.display());
        Some(Self {
            root,
            marker: marker.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// プロジェクト記述ファイルのパス
    pub fn descriptor_path(&self) -> PathBuf {
        self.root.join(&self.marker)
    }

    /// プロジェクト記述ファイルに `package` が含まれるか
    pub fn depends_on(&self, package: &str) -> Result<bool> {
        let path = self.descriptor_path();
        let content =
            std::fs::read_to_string(&path).map_err(|e| FileError::from_io(&e, &path))?;
        Ok(content.contains(package))
    }

    /// テストファイルで使うテストライブラリの名前空間
    pub fn test_library(&self) -> Result<&'static str> {
        if self.depends_on("midje")? {
            Ok(MIDJE_NAMESPACE)
        } else {
            Ok(CLOJURE_TEST_NAMESPACE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn finds_nearest_marker() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("proj");
        std::fs::create_dir_all(root.join("src/app")).unwrap();
        std::fs::write(root.join("project.clj"), "(defproject app \"0.1.0\")").unwrap();
        let file = root.join("src/app/core.clj");
        std::fs::write(&file, "").unwrap();

        assert_eq!(locate_dominating_file(&file, "project.clj"), Some(root.clone()));
        assert_eq!(locate_dominating_file(&root.join("src"), "project.clj"), Some(root));
    }

    #[test]
    fn no_marker_means_no_project() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        assert!(Project::discover(&dir.path().join("src"), "no-such-marker.edn").is_none());
    }

    #[test]
    fn test_library_depends_on_descriptor() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("project.clj"),
            "(defproject app \"0.1.0\" :profiles {:dev {:dependencies [[midje \"1.5.1\"]]}})",
        )
        .unwrap();
        let project = Project::discover(dir.path(), "project.clj").unwrap();
        assert_eq!(project.test_library().unwrap(), MIDJE_NAMESPACE);

        std::fs::write(dir.path().join("project.clj"), "(defproject app \"0.1.0\")").unwrap();
        assert_eq!(project.test_library().unwrap(), CLOJURE_TEST_NAMESPACE);
    }
}
