//! cljr - Clojure namespace refactoring commands
//!
//! ファイルのリネームと名前空間の伝播、ns 節への追加とスニペット展開、
//! 空ファイルへの ns 宣言挿入、キーバインド構築を提供する

// コアモジュール
pub mod config;
pub mod error;
pub mod logging;

// データ層
pub mod buffer;
pub mod file;
pub mod project;

// ロジック層
pub mod input;
pub mod namespace;
pub mod snippet;

// コマンド層
pub mod commands;

// 公開API
pub use buffer::{Buffer, BufferList};
pub use commands::{CommandResult, OpenedFile, RenameReport, ReplaceReport, Workspace};
pub use config::{CljrConfig, KeybindingStyle};
pub use error::{CljrError, Outcome, Result, SkipReason};
pub use input::{Command, Key, KeyLookupResult, KeySequence, Keymap};
pub use namespace::{ClauseKind, ClojureNamespace, NamespaceSupport};
pub use project::{SourceWalker, StaticSourceWalker, WalkdirSourceWalker};
pub use snippet::{ExitHook, SnippetExpander, SnippetSession, SnippetState, TemplateExpander};
