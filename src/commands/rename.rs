//! ファイルのリネームと名前空間の変更の伝播

use super::Workspace;
use crate::buffer::buffer_name_for;
use crate::error::{BufferError, CommandError, Outcome, Result, SkipReason};
use crate::file::{canonicalize_lenient, rename_file, resolve_path};
use crate::namespace::{replace_symbol, replace_symbol_in_buffer};
use crate::project::Project;
use std::path::{Path, PathBuf};

/// プロジェクト全体置換の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceReport {
    /// 走査したファイル数
    pub files_scanned: usize,
    /// 置換が発生したファイル
    pub files_changed: Vec<PathBuf>,
    /// 置換した箇所の総数
    pub replacements: usize,
    /// 置換に失敗したファイルとエラー内容
    pub failures: Vec<(PathBuf, String)>,
}

/// リネームの結果
#[derive(Debug, Clone)]
pub struct RenameReport {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    /// リネーム前の名前空間（ns 宣言がなければ `None`）
    pub old_ns: Option<String>,
    pub new_ns: Option<String>,
    /// プロジェクト全体置換の結果
    pub propagation: Outcome<ReplaceReport>,
    /// 保存したファイル
    pub saved: Vec<PathBuf>,
    /// ユーザー向けメッセージ
    pub message: String,
}

impl Workspace {
    /// 現在のバッファのファイルをリネームし、名前空間の変更をプロジェクト全体へ反映する
    ///
    /// `new_name` は元ファイルのディレクトリを基準に解決する。`~` と環境変数は展開する
    pub fn rename_file(&mut self, new_name: &str) -> Result<RenameReport> {
        let index = self
            .buffers
            .current_index()
            .ok_or(BufferError::NoCurrentBuffer)?;
        let buffer = self.buffers.get(index).ok_or(BufferError::NoCurrentBuffer)?;

        let old_path = match buffer.file_path() {
            Some(path) if path.is_file() => canonicalize_lenient(path),
            _ => {
                return Err(CommandError::NotVisitingFile {
                    name: buffer.name().to_string(),
                }
                .into())
            }
        };
        let old_ns = self.namespace.find_ns(buffer.text());

        let base_dir = old_path.parent().map(Path::to_path_buf).unwrap_or_default();
        let new_path = canonicalize_lenient(&resolve_path(new_name, &base_dir)?);
        let new_buffer_name = buffer_name_for(&new_path);

        let taken = self
            .buffers
            .find_by_name(&new_buffer_name)
            .or_else(|| self.buffers.find_by_path(&new_path))
            .filter(|&other| other != index);
        if taken.is_some() {
            return Err(CommandError::BufferExists {
                name: new_buffer_name,
            }
            .into());
        }

        rename_file(&old_path, &new_path)?;
        let new_path = canonicalize_lenient(&new_path);
        let project = Project::discover(&new_path, &self.config.project_marker);

        let buffer = self
            .buffers
            .get_mut(index)
            .ok_or(BufferError::NoCurrentBuffer)?;
        buffer.rename(new_buffer_name);
        buffer.set_file_path(Some(new_path.clone()));
        buffer.set_modified(false);

        let new_ns = match old_ns {
            Some(_) => {
                let ns = self
                    .namespace
                    .expected_ns(&new_path, project.as_ref().map(Project::root))?;
                self.namespace.update_ns(buffer, &ns)?;
                Some(ns)
            }
            None => None,
        };

        let propagation = match (&old_ns, &new_ns) {
            (Some(old), Some(new)) if old == new => Outcome::Skipped(SkipReason::Unchanged),
            (Some(old), Some(new)) => match &project {
                Some(project) => {
                    Outcome::from_result(self.replace_in_project(project.root(), old, new))
                }
                None => Outcome::Skipped(SkipReason::NoProjectRoot {
                    marker: self.config.project_marker.clone(),
                }),
            },
            _ => Outcome::Skipped(SkipReason::NoNamespace),
        };
        if let Outcome::Failed(err) = &propagation {
            log::warn!("namespace propagation failed: {}", err);
        }

        let saved = self.save_modified_buffers()?;

        let old_name = old_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let message = format!("File '{}' successfully renamed to '{}'", old_name, new_name);
        log::info!("{}", message);

        Ok(RenameReport {
            old_path,
            new_path,
            old_ns,
            new_ns,
            propagation,
            saved,
            message,
        })
    }

    /// プロジェクト内のソースファイルで `old` を `new` に置き換える
    ///
    /// 開いているファイルはバッファ上で、それ以外はディスク上で書き換える。
    /// 個々のファイルの失敗は記録して続行する
    fn replace_in_project(&mut self, root: &Path, old: &str, new: &str) -> Result<ReplaceReport> {
        let files = self.walker.source_files(root)?;
        let mut report = ReplaceReport {
            files_scanned: files.len(),
            ..ReplaceReport::default()
        };

        for file in files {
            let result = match self.buffers.find_by_path(&file) {
                Some(index) => match self.buffers.get_mut(index) {
                    Some(buffer) => replace_symbol_in_buffer(buffer, old, new),
                    None => Ok(0),
                },
                None => self.replace_in_file(&file, old, new),
            };

            match result {
                Ok(0) => {}
                Ok(count) => {
                    report.replacements += count;
                    report.files_changed.push(file);
                }
                Err(err) => {
                    log::warn!("replace in {} failed: {}", file.display(), err);
                    report.failures.push((file, err.to_string()));
                }
            }
        }

        log::info!(
            "replaced {} -> {}: {} occurrences in {} of {} files",
            old,
            new,
            report.replacements,
            report.files_changed.len(),
            report.files_scanned
        );
        Ok(report)
    }

    fn replace_in_file(&self, path: &Path, old: &str, new: &str) -> Result<usize> {
        let Some(content) = self.reader.read_file(path)? else {
            return Ok(0);
        };
        let (replaced, count) = replace_symbol(&content, old, new);
        if count > 0 {
            self.saver.save_file(path, &replaced)?;
        }
        Ok(count)
    }
}
