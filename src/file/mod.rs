//! ファイル操作モジュール
//!
//! - バックアップなし
//! - 保存は一時ファイル経由のアトミック書き込み
//! - リネーム先が既に存在する場合は上書きしない

pub mod operations;
pub mod path;

pub use operations::{rename_file, FileReader, FileSaver};
pub use path::{canonicalize_lenient, expand_path, has_extension, normalize_path, resolve_path};
