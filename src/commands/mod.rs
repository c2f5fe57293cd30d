//! リファクタリングコマンド
//!
//! バッファ一覧、キーマップ、差し替え可能な各機能（ファイル列挙・スニペット展開・名前空間処理）を
//! `Workspace` にまとめ、ファイルのリネーム、ns 節への追加、空ファイルへの ns 挿入を実行する

mod bootstrap;
mod rename;

pub use rename::{RenameReport, ReplaceReport};

use crate::buffer::{Buffer, BufferList};
use crate::config::CljrConfig;
use crate::error::{BufferError, InputError, Outcome, Result, SkipReason, SnippetError};
use crate::file::{canonicalize_lenient, resolve_path, FileReader, FileSaver};
use crate::input::{Command, Key, KeyLookupResult, Keymap};
use crate::namespace::{insert_in_ns, ClauseKind, ClojureNamespace, NamespaceSupport};
use crate::project::{SourceWalker, WalkdirSourceWalker};
use crate::snippet::{ExitHook, SnippetExpander, SnippetSession, SnippetState, TemplateExpander};
use std::path::{Path, PathBuf};

/// コマンド実行の結果
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    /// 実行が成功したか
    pub success: bool,
    /// 結果メッセージ
    pub message: Option<String>,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn success_with_message(message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
        }
    }
}

/// ファイルを開いた結果
#[derive(Debug, Clone)]
pub struct OpenedFile {
    /// バッファ一覧でのインデックス
    pub index: usize,
    /// ディスク上に存在しなかった
    pub created: bool,
    /// ns 宣言の自動挿入の結果（挿入した名前空間名）
    pub bootstrap: Outcome<String>,
}

/// コマンドの実行環境
pub struct Workspace {
    config: CljrConfig,
    buffers: BufferList,
    keymap: Keymap,
    walker: Box<dyn SourceWalker>,
    expander: Box<dyn SnippetExpander>,
    namespace: Box<dyn NamespaceSupport>,
    reader: FileReader,
    saver: FileSaver,
    /// 展開中のスニペットとそのバッファ
    session: Option<(usize, SnippetSession)>,
}

impl Workspace {
    /// 既定の実装で構築
    pub fn new(config: CljrConfig) -> Result<Self> {
        let walker = WalkdirSourceWalker::from_config(&config);
        let namespace = ClojureNamespace::new(config.test_suffix.clone());
        Self::with_components(
            config,
            Box::new(walker),
            Box::new(TemplateExpander),
            Box::new(namespace),
        )
    }

    /// 各機能を差し替えて構築
    pub fn with_components(
        config: CljrConfig,
        walker: Box<dyn SourceWalker>,
        expander: Box<dyn SnippetExpander>,
        namespace: Box<dyn NamespaceSupport>,
    ) -> Result<Self> {
        config.validate()?;
        let keymap = Keymap::from_style(&config.keybinding)?;
        Ok(Self {
            config,
            buffers: BufferList::new(),
            keymap,
            walker,
            expander,
            namespace,
            reader: FileReader::new(),
            saver: FileSaver::new(),
            session: None,
        })
    }

    pub fn config(&self) -> &CljrConfig {
        &self.config
    }

    pub fn buffers(&self) -> &BufferList {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut BufferList {
        &mut self.buffers
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn current_buffer(&self) -> Result<&Buffer> {
        self.buffers.current()
    }

    pub fn current_buffer_mut(&mut self) -> Result<&mut Buffer> {
        self.buffers.current_mut()
    }

    /// スニペットを展開中か
    pub fn snippet_active(&self) -> bool {
        self.session.is_some()
    }

    /// ファイルを開く（既に開いていればそのバッファへ切り替える）
    ///
    /// 新しく読み込んだバッファには空ファイル用の ns 宣言挿入を試みる
    pub fn open_file(&mut self, path: impl AsRef<Path>) -> Result<OpenedFile> {
        let cwd = std::env::current_dir()?;
        let path = canonicalize_lenient(&resolve_path(path, &cwd)?);

        if let Some(index) = self.buffers.find_by_path(&path) {
            self.buffers.switch_to_index(index)?;
            return Ok(OpenedFile {
                index,
                created: false,
                bootstrap: Outcome::Skipped(SkipReason::AlreadyOpen),
            });
        }

        let content = self.reader.read_file(&path)?;
        let created = content.is_none();
        log::debug!("open_file: {} (new file: {})", path.display(), created);

        let buffer = Buffer::visiting(path, content.as_deref().unwrap_or(""));
        let index = self.buffers.add(buffer);
        let bootstrap = self.bootstrap_blank_file();

        Ok(OpenedFile {
            index,
            created,
            bootstrap,
        })
    }

    /// ファイルを持つ変更済みバッファをすべて保存し、保存したパスを返す
    pub fn save_modified_buffers(&mut self) -> Result<Vec<PathBuf>> {
        let mut saved = Vec::new();
        for buffer in self.buffers.iter_mut() {
            if !buffer.is_modified() {
                continue;
            }
            let Some(path) = buffer.file_path().map(Path::to_path_buf) else {
                continue;
            };
            self.saver.save_file(&path, buffer.text())?;
            buffer.set_modified(false);
            saved.push(path);
        }
        Ok(saved)
    }

    /// `:require` 節に要素を追加する
    pub fn add_require(&mut self) -> Result<()> {
        self.add_to_ns(ClauseKind::Require)
    }

    /// `:use` 節に要素を追加する
    pub fn add_use(&mut self) -> Result<()> {
        self.add_to_ns(ClauseKind::Use)
    }

    /// `:import` 節に要素を追加する
    pub fn add_import(&mut self) -> Result<()> {
        self.add_to_ns(ClauseKind::Import)
    }

    /// 節への挿入位置へ移動してテンプレートを展開する
    ///
    /// 実行前のポイントをマークとして積み、スニペット終了時に戻す
    fn add_to_ns(&mut self, kind: ClauseKind) -> Result<()> {
        self.finish_pending_snippet()?;

        let index = self
            .buffers
            .current_index()
            .ok_or(BufferError::NoCurrentBuffer)?;
        let buffer = self
            .buffers
            .get_mut(index)
            .ok_or(BufferError::NoCurrentBuffer)?;

        buffer.push_mark();
        if let Err(err) = insert_in_ns(buffer, kind) {
            buffer.pop_mark()?;
            return Err(err);
        }

        let on_exit: ExitHook = Box::new(|buffer: &mut Buffer| {
            if let Err(err) = buffer.pop_mark() {
                log::warn!("could not restore point after snippet: {}", err);
            }
        });

        match self.expander.expand(buffer, kind.template(), on_exit) {
            Ok(session) => {
                if !session.is_finished() {
                    self.session = Some((index, session));
                }
                Ok(())
            }
            Err(err) => {
                if let Err(mark_err) = buffer.pop_mark() {
                    log::warn!("could not restore point after failed expansion: {}", mark_err);
                }
                Err(err)
            }
        }
    }

    /// 展開中のスニペットの現在のフィールドに入力する
    pub fn snippet_insert(&mut self, text: &str) -> Result<()> {
        self.with_session(|session, buffer| session.insert(buffer, text))
    }

    /// 次のフィールドへ移動する
    pub fn next_field(&mut self) -> Result<SnippetState> {
        self.with_session(|session, buffer| session.next_field(buffer))
    }

    /// 前のフィールドへ移動する
    pub fn previous_field(&mut self) -> Result<SnippetState> {
        self.with_session(|session, buffer| session.previous_field(buffer))
    }

    /// 展開中のスニペットを終了する
    pub fn finish_snippet(&mut self) -> Result<()> {
        self.with_session(|session, buffer| session.finish(buffer))
    }

    fn finish_pending_snippet(&mut self) -> Result<()> {
        if self.session.is_some() {
            self.finish_snippet()?;
        }
        Ok(())
    }

    fn with_session<T>(
        &mut self,
        action: impl FnOnce(&mut SnippetSession, &mut Buffer) -> Result<T>,
    ) -> Result<T> {
        let (index, session) = self.session.as_mut().ok_or(SnippetError::NoSession)?;
        let Some(buffer) = self.buffers.get_mut(*index) else {
            self.session = None;
            return Err(SnippetError::NoSession.into());
        };

        let result = action(session, buffer);
        if session.is_finished() {
            self.session = None;
        }
        result
    }

    /// キー入力をキーマップに渡す
    pub fn dispatch_key(&mut self, key: Key) -> KeyLookupResult {
        self.keymap.process_key(key)
    }

    /// コマンドを実行（リネームは新しいファイル名を引数に取る）
    pub fn execute(&mut self, command: Command, argument: Option<&str>) -> CommandResult {
        let result = match command {
            Command::RenameFile => match argument {
                Some(new_name) => self.rename_file(new_name).map(|report| Some(report.message)),
                None => Err(InputError::InvalidArgument {
                    arg: "new file name".to_string(),
                }
                .into()),
            },
            Command::AddRequire => self.add_require().map(|_| None),
            Command::AddUse => self.add_use().map(|_| None),
            Command::AddImport => self.add_import().map(|_| None),
        };

        match result {
            Ok(Some(message)) => CommandResult::success_with_message(message),
            Ok(None) => CommandResult::success(),
            Err(err) => {
                log::warn!("{} failed: {}", command.name(), err);
                CommandResult::error(err.to_string())
            }
        }
    }
}
