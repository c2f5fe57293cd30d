//! 空のソースファイルへの ns 宣言の挿入

use super::Workspace;
use crate::buffer::Buffer;
use crate::error::{CommandError, Outcome, Result, SkipReason};
use crate::file::has_extension;
use crate::namespace::{insert_in_ns, ClauseKind, NamespaceSupport};
use crate::project::{Project, CLOJURE_TEST_NAMESPACE};
use std::path::Path;

impl Workspace {
    /// 現在のバッファが空のソースファイルなら ns 宣言を挿入する
    ///
    /// テストファイルにはテスト対象の名前空間とテストライブラリを `:use` で追加する。
    /// 成功時は挿入した名前空間名を返す
    pub fn bootstrap_blank_file(&mut self) -> Outcome<String> {
        if !self.config.add_ns_to_blank_files {
            return Outcome::Skipped(SkipReason::Disabled);
        }

        let buffer = match self.buffers.current_mut() {
            Ok(buffer) => buffer,
            Err(err) => return Outcome::Failed(err),
        };
        let Some(path) = buffer.file_path().map(Path::to_path_buf) else {
            return Outcome::Failed(
                CommandError::NotVisitingFile {
                    name: buffer.name().to_string(),
                }
                .into(),
            );
        };
        if !has_extension(&path, &self.config.source_extension) {
            return Outcome::Skipped(SkipReason::NotSourceFile { path });
        }
        if !buffer.is_empty() {
            return Outcome::Skipped(SkipReason::NotBlank);
        }

        let outcome = Outcome::from_result(insert_blank_ns(
            buffer,
            &path,
            self.namespace.as_ref(),
            &self.config.project_marker,
        ));
        match &outcome {
            Outcome::Succeeded(ns) => log::info!("inserted ns {} into {}", ns, path.display()),
            Outcome::Failed(err) => log::warn!("could not bootstrap {}: {}", path.display(), err),
            Outcome::Skipped(_) => {}
        }
        outcome
    }
}

fn insert_blank_ns(
    buffer: &mut Buffer,
    path: &Path,
    namespace: &dyn NamespaceSupport,
    marker: &str,
) -> Result<String> {
    let project = Project::discover(path, marker);
    let ns = namespace.expected_ns(path, project.as_ref().map(Project::root))?;

    namespace.insert_ns_form(buffer, &ns);
    buffer.insert("\n\n");

    if namespace.in_tests(path, &ns) {
        let library = match &project {
            Some(project) => project.test_library()?,
            None => CLOJURE_TEST_NAMESPACE,
        };
        for entry in [namespace.non_test_ns(&ns), library.to_string()] {
            insert_in_ns(buffer, ClauseKind::Use)?;
            buffer.insert(&entry);
        }
    }

    buffer.goto_char(buffer.len_chars());
    Ok(ns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CljrConfig;
    use std::fs;
    use tempfile::tempdir;

    fn project(descriptor: &str) -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("project.clj"), descriptor).unwrap();
        fs::create_dir_all(dir.path().join("src/foo")).unwrap();
        fs::create_dir_all(dir.path().join("test/foo")).unwrap();
        dir
    }

    #[test]
    fn blank_source_file_gets_ns() {
        let dir = project("(defproject foo \"0.1.0\")");
        let mut ws = Workspace::new(CljrConfig::default()).unwrap();

        let opened = ws.open_file(dir.path().join("src/foo/bar_baz.clj")).unwrap();
        assert!(opened.created);
        assert_eq!(opened.bootstrap.succeeded().map(String::as_str), Some("foo.bar-baz"));

        let buffer = ws.current_buffer().unwrap();
        assert_eq!(buffer.text(), "(ns foo.bar-baz)\n\n");
        assert_eq!(buffer.point(), buffer.len_chars());
        assert!(buffer.is_modified());
    }

    #[test]
    fn blank_test_file_uses_clojure_test() {
        let dir = project("(defproject foo \"0.1.0\")");
        let mut ws = Workspace::new(CljrConfig::default()).unwrap();

        ws.open_file(dir.path().join("test/foo/bar_test.clj")).unwrap();
        assert_eq!(
            ws.current_buffer().unwrap().text(),
            "(ns foo.bar-test\n  (:use foo.bar\n        clojure.test))\n\n"
        );
    }

    #[test]
    fn blank_test_file_uses_midje_when_declared() {
        let dir = project("(defproject foo \"0.1.0\"\n  :profiles {:dev {:dependencies [[midje \"1.9.9\"]]}})");
        let mut ws = Workspace::new(CljrConfig::default()).unwrap();

        ws.open_file(dir.path().join("test/foo/bar_test.clj")).unwrap();
        assert_eq!(
            ws.current_buffer().unwrap().text(),
            "(ns foo.bar-test\n  (:use foo.bar\n        midje.sweet))\n\n"
        );
    }

    #[test]
    fn non_blank_and_foreign_files_are_left_alone() {
        let dir = project("(defproject foo \"0.1.0\")");
        let existing = dir.path().join("src/foo/core.clj");
        fs::write(&existing, "(def x 1)\n").unwrap();
        let mut ws = Workspace::new(CljrConfig::default()).unwrap();

        let opened = ws.open_file(&existing).unwrap();
        assert_eq!(opened.bootstrap.skip_reason(), Some(&SkipReason::NotBlank));
        assert_eq!(ws.current_buffer().unwrap().text(), "(def x 1)\n");

        let opened = ws.open_file(dir.path().join("src/foo/notes.txt")).unwrap();
        assert!(matches!(
            opened.bootstrap.skip_reason(),
            Some(SkipReason::NotSourceFile { .. })
        ));
        assert!(ws.current_buffer().unwrap().is_empty());

        let opened = ws.open_file(dir.path().join("src/foo/LEGACY.CLJ")).unwrap();
        assert!(matches!(
            opened.bootstrap.skip_reason(),
            Some(SkipReason::NotSourceFile { .. })
        ));
        assert!(ws.current_buffer().unwrap().is_empty());

        let again = ws.open_file(&existing).unwrap();
        assert_eq!(again.bootstrap.skip_reason(), Some(&SkipReason::AlreadyOpen));
        assert_eq!(ws.buffers().len(), 3);
    }

    #[test]
    fn disabled_option_skips_bootstrap() {
        let dir = project("(defproject foo \"0.1.0\")");
        let config = CljrConfig {
            add_ns_to_blank_files: false,
            ..CljrConfig::default()
        };
        let mut ws = Workspace::new(config).unwrap();

        let opened = ws.open_file(dir.path().join("src/foo/empty.clj")).unwrap();
        assert_eq!(opened.bootstrap.skip_reason(), Some(&SkipReason::Disabled));
        assert!(ws.current_buffer().unwrap().is_empty());
    }
}
