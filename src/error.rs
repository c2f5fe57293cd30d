//! エラーハンドリングシステム
//!
//! cljr 全体で使用される統一されたエラー型とユーティリティを定義
//! 前提条件の違反はエラーとして呼び出し元へ返し、付随的な処理（プロジェクト全体の置換や
//! 空ファイルへの ns 挿入）は `Outcome` として結果を明示する

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;

/// アプリケーション全体のエラー型
#[derive(Error, Debug, Clone)]
pub enum CljrError {
    /// ファイル操作エラー
    #[error("File operation failed: {0}")]
    File(#[from] FileError),

    /// バッファ操作エラー
    #[error("Buffer operation failed: {0}")]
    Buffer(#[from] BufferError),

    /// 入力処理エラー
    #[error("Input processing failed: {0}")]
    Input(#[from] InputError),

    /// 設定エラー
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 名前空間操作エラー
    #[error("{0}")]
    Namespace(#[from] NamespaceError),

    /// スニペット展開エラー
    #[error("Snippet error: {0}")]
    Snippet(#[from] SnippetError),

    /// コマンドの前提条件エラー
    #[error("{0}")]
    Command(#[from] CommandError),

    /// パスエラー
    #[error("Path error: {0}")]
    Path(String),
}

/// ファイル操作固有のエラー
#[derive(Error, Debug, Clone)]
pub enum FileError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("File already exists: {path}")]
    AlreadyExists { path: String },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl FileError {
    /// `std::io::Error` をパス情報付きで分類
    pub fn from_io(error: &std::io::Error, path: &std::path::Path) -> Self {
        let path = path.display().to_string();
        match error.kind() {
            std::io::ErrorKind::NotFound => FileError::NotFound { path },
            std::io::ErrorKind::PermissionDenied => FileError::PermissionDenied { path },
            std::io::ErrorKind::AlreadyExists => FileError::AlreadyExists { path },
            _ => FileError::Io {
                message: format!("{}: {}", path, error),
            },
        }
    }
}

/// バッファ操作固有のエラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BufferError {
    #[error("Invalid cursor position: {position}")]
    InvalidCursorPosition { position: usize },

    #[error("Invalid range: {start}..{end}")]
    InvalidRange { start: usize, end: usize },

    #[error("Mark ring is empty")]
    EmptyMarkRing,

    #[error("No buffer named {name}")]
    UnknownBuffer { name: String },

    #[error("No current buffer")]
    NoCurrentBuffer,
}

/// 入力処理固有のエラー
#[derive(Error, Debug, Clone)]
pub enum InputError {
    #[error("Invalid key sequence: {sequence}")]
    InvalidKeySequence { sequence: String },

    #[error("Invalid argument: {arg}")]
    InvalidArgument { arg: String },
}

/// 設定固有のエラー
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Invalid configuration file: {path}: {message}")]
    InvalidFile { path: String, message: String },

    #[error("Missing required setting: {key}")]
    MissingRequired { key: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// 名前空間操作固有のエラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NamespaceError {
    #[error("No namespace declaration found")]
    NotFound,

    #[error("Unbalanced form starting at {position}")]
    Unbalanced { position: usize },

    #[error("Cannot derive a namespace from {path}")]
    Underivable { path: String },
}

/// スニペット固有のエラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnippetError {
    #[error("Unterminated field starting at {position}")]
    UnterminatedField { position: usize },

    #[error("Invalid field index: {0}")]
    InvalidIndex(String),

    #[error("Snippet session already finished")]
    Finished,

    #[error("No active snippet session")]
    NoSession,
}

/// コマンドの前提条件エラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Buffer '{name}' is not visiting a file!")]
    NotVisitingFile { name: String },

    #[error("A buffer named '{name}' already exists!")]
    BufferExists { name: String },
}

/// プロジェクト標準のResult型
pub type Result<T> = std::result::Result<T, CljrError>;

// std::io::Error から CljrError への変換
impl From<std::io::Error> for CljrError {
    fn from(error: std::io::Error) -> Self {
        CljrError::File(FileError::Io {
            message: error.to_string(),
        })
    }
}

impl From<crate::input::keybinding::KeyParseError> for CljrError {
    fn from(error: crate::input::keybinding::KeyParseError) -> Self {
        CljrError::Input(InputError::InvalidKeySequence {
            sequence: error.to_string(),
        })
    }
}

/// 付随処理を実行しなかった理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 設定で無効化されている
    Disabled,
    /// 対象外の拡張子
    NotSourceFile { path: PathBuf },
    /// バッファが空でない
    NotBlank,
    /// プロジェクトマーカーが見つからない
    NoProjectRoot { marker: String },
    /// 名前空間宣言がない
    NoNamespace,
    /// 置換前後で名前空間が同じ
    Unchanged,
    /// 既に開いているバッファ
    AlreadyOpen,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Disabled => write!(f, "disabled by configuration"),
            SkipReason::NotSourceFile { path } => {
                write!(f, "not a source file: {}", path.display())
            }
            SkipReason::NotBlank => write!(f, "buffer is not empty"),
            SkipReason::NoProjectRoot { marker } => {
                write!(f, "no project root ({} not found)", marker)
            }
            SkipReason::NoNamespace => write!(f, "no namespace declaration"),
            SkipReason::Unchanged => write!(f, "namespace is unchanged"),
            SkipReason::AlreadyOpen => write!(f, "file is already open"),
        }
    }
}

/// 付随処理の結果
///
/// 主処理を妨げない処理の結果を握り潰さずに呼び出し元へ返す
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    Succeeded(T),
    Skipped(SkipReason),
    Failed(CljrError),
}

impl<T> Outcome<T> {
    /// `Result` から変換（エラーは `Failed` 扱い）
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Succeeded(value),
            Err(error) => Outcome::Failed(error),
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, Outcome::Succeeded(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// 成功時の値
    pub fn succeeded(&self) -> Option<&T> {
        match self {
            Outcome::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Outcome::Skipped(reason) => Some(reason),
            _ => None,
        }
    }
}

/// エラーレベル分類
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorLevel {
    Info,
    Warning,
    Error,
}

/// エラー表示情報
#[derive(Debug, Clone)]
pub struct ErrorDisplay {
    /// エラーメッセージ
    pub message: String,
    /// エラーレベル
    pub level: ErrorLevel,
    /// 表示開始時刻
    pub start_time: Instant,
    /// 表示持続時間
    pub duration: Duration,
}

impl ErrorDisplay {
    pub fn new(error: &CljrError) -> Self {
        let (message, level) = Self::format_error(error);
        Self {
            message,
            level,
            start_time: Instant::now(),
            duration: Duration::from_secs(5),
        }
    }

    fn format_error(error: &CljrError) -> (String, ErrorLevel) {
        match error {
            CljrError::Command(CommandError::NotVisitingFile { name }) => (
                format!("バッファ '{}' はファイルを開いていません", name),
                ErrorLevel::Error,
            ),
            CljrError::Command(CommandError::BufferExists { name }) => (
                format!("バッファ '{}' は既に存在します", name),
                ErrorLevel::Error,
            ),
            CljrError::Namespace(NamespaceError::NotFound) => (
                "名前空間宣言が見つかりません".to_string(),
                ErrorLevel::Error,
            ),
            CljrError::File(FileError::NotFound { path }) => {
                (format!("ファイルが見つかりません: {}", path), ErrorLevel::Error)
            }
            CljrError::File(FileError::PermissionDenied { path }) => {
                (format!("アクセス権限がありません: {}", path), ErrorLevel::Error)
            }
            CljrError::File(FileError::AlreadyExists { path }) => {
                (format!("ファイルが既に存在します: {}", path), ErrorLevel::Error)
            }
            CljrError::Config(err) => (format!("設定エラー: {}", err), ErrorLevel::Warning),
            _ => (format!("エラーが発生しました: {}", error), ErrorLevel::Error),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.start_time.elapsed() >= self.duration
    }
}
