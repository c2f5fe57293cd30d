//! ロギングシステム
//!
//! `log` ファサードのバックエンドとして、stderr と任意のファイルへ行単位で出力する

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// ロガー
#[derive(Debug, Clone)]
pub struct Logger {
    level: LevelFilter,
    output_stderr: bool,
    output_file: Option<PathBuf>,
}

impl Logger {
    /// デフォルト構築
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            output_stderr: true,
            output_file: None,
        }
    }

    /// 開発者向けロガー（`CLJR_DEBUG` 設定時は Debug、それ以外は Warn）
    pub fn for_development() -> Self {
        if std::env::var_os("CLJR_DEBUG").is_some() {
            Self::new(LevelFilter::Debug)
        } else {
            Self::new(LevelFilter::Warn)
        }
    }

    /// ログレベルを取得
    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// ログレベルを変更
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// ファイル出力を設定
    pub fn with_file_output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// 標準エラー出力を無効化（テスト向け）
    pub fn without_stderr(mut self) -> Self {
        self.output_stderr = false;
        self
    }

    fn should_log(&self, level: Level) -> bool {
        level <= self.level
    }

    fn format_line(record: &Record) -> String {
        format!("{}: [{}] {}", record.level(), record.target(), record.args())
    }

    fn write_line(&self, line: &str) {
        if self.output_stderr {
            eprintln!("{}", line);
        }

        if let Some(path) = &self.output_file {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(file, "{}", line);
            }
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.should_log(metadata.level())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.write_line(&Self::format_line(record));
        }
    }

    fn flush(&self) {}
}

/// デフォルトのログファイルパス（`~/.cljr-log/debug.log`）
pub fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".cljr-log").join("debug.log"))
}

/// ヘルパー：親ディレクトリを作成
pub(crate) fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// グローバルロガーを設定する
///
/// 二回目以降の呼び出しは何もしない
pub fn init(logger: Logger) {
    if let Some(path) = &logger.output_file {
        if let Err(err) = ensure_parent_dir(path) {
            eprintln!("WARN: log directory unavailable: {}", err);
        }
    }

    let level = logger.level;
    if LOGGER.set(logger).is_err() {
        return;
    }
    if let Some(installed) = LOGGER.get() {
        if log::set_logger(installed).is_ok() {
            log::set_max_level(level);
        }
    }
}
