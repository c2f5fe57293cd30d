//! キーバインドシステム
//!
//! Emacs の `kbd` 記法によるキーシーケンス解析と、
//! 2文字のニーモニックからリファクタリングコマンドへのキーマップ構築を管理

use crate::config::KeybindingStyle;
use crossterm::event::{KeyCode as CrosstermKeyCode, KeyEvent, KeyModifiers as CrosstermModifiers};
use std::collections::HashMap;
use std::fmt;

/// キー入力の内部表現
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    /// 修飾キー
    pub modifiers: KeyModifiers,
    /// 基本キー
    pub code: KeyCode,
}

/// 修飾キーの組み合わせ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeyModifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub super_key: bool,
}

impl KeyModifiers {
    pub const NONE: KeyModifiers = KeyModifiers {
        ctrl: false,
        alt: false,
        shift: false,
        super_key: false,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// 基本キーコード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Tab,
    Up,
    Down,
    Left,
    Right,
    F(u8),
    Esc,
    Unknown,
}

impl Key {
    pub fn new(modifiers: KeyModifiers, code: KeyCode) -> Self {
        Self { modifiers, code }
    }

    /// 修飾キーなしの文字
    pub fn plain(ch: char) -> Self {
        Self::new(KeyModifiers::NONE, KeyCode::Char(ch))
    }

    /// Ctrl+文字
    pub fn ctrl(ch: char) -> Self {
        Self::new(
            KeyModifiers {
                ctrl: true,
                ..KeyModifiers::NONE
            },
            KeyCode::Char(ch),
        )
    }

    /// Alt(Meta)+文字
    pub fn alt(ch: char) -> Self {
        Self::new(
            KeyModifiers {
                alt: true,
                ..KeyModifiers::NONE
            },
            KeyCode::Char(ch),
        )
    }
}

/// Emacs 記法での表示（`C-M-s-x`、`s-TAB` など）
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.ctrl {
            write!(f, "C-")?;
        }
        if self.modifiers.alt {
            write!(f, "M-")?;
        }
        if self.modifiers.shift {
            write!(f, "S-")?;
        }
        if self.modifiers.super_key {
            write!(f, "s-")?;
        }
        match &self.code {
            KeyCode::Char(' ') => write!(f, "SPC"),
            KeyCode::Char(c) => write!(f, "{}", c),
            KeyCode::Enter => write!(f, "RET"),
            KeyCode::Backspace => write!(f, "DEL"),
            KeyCode::Delete => write!(f, "<delete>"),
            KeyCode::Tab => write!(f, "TAB"),
            KeyCode::Up => write!(f, "<up>"),
            KeyCode::Down => write!(f, "<down>"),
            KeyCode::Left => write!(f, "<left>"),
            KeyCode::Right => write!(f, "<right>"),
            KeyCode::F(n) => write!(f, "<f{}>", n),
            KeyCode::Esc => write!(f, "ESC"),
            KeyCode::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// crossterm統合
impl From<KeyEvent> for Key {
    fn from(event: KeyEvent) -> Self {
        let modifiers = KeyModifiers {
            ctrl: event.modifiers.contains(CrosstermModifiers::CONTROL),
            alt: event.modifiers.contains(CrosstermModifiers::ALT),
            shift: event.modifiers.contains(CrosstermModifiers::SHIFT),
            super_key: event.modifiers.contains(CrosstermModifiers::SUPER),
        };

        let code = match event.code {
            CrosstermKeyCode::Char(c) => KeyCode::Char(c),
            CrosstermKeyCode::Enter => KeyCode::Enter,
            CrosstermKeyCode::Backspace => KeyCode::Backspace,
            CrosstermKeyCode::Delete => KeyCode::Delete,
            CrosstermKeyCode::Tab => KeyCode::Tab,
            CrosstermKeyCode::Up => KeyCode::Up,
            CrosstermKeyCode::Down => KeyCode::Down,
            CrosstermKeyCode::Left => KeyCode::Left,
            CrosstermKeyCode::Right => KeyCode::Right,
            CrosstermKeyCode::F(n) => KeyCode::F(n),
            CrosstermKeyCode::Esc => KeyCode::Esc,
            _ => KeyCode::Unknown,
        };

        Key { modifiers, code }
    }
}

/// キーシーケンス（連続キー対応）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySequence {
    pub keys: Vec<Key>,
}

impl KeySequence {
    /// 複数キーからシーケンスを作成
    pub fn multi(keys: Vec<Key>) -> Self {
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// 前方一致チェック
    pub fn starts_with(&self, prefix: &[Key]) -> bool {
        prefix.len() <= self.keys.len() && self.keys[..prefix.len()] == *prefix
    }

    /// `kbd` 記法の文字列表現からパース
    ///
    /// 修飾キーのない複数文字の単語は1文字ずつのキーに展開する（`"C-c rf"` は3キー）
    pub fn parse(s: &str) -> Result<Self, KeyParseError> {
        let mut keys = Vec::new();

        for part in s.split_whitespace() {
            Self::parse_word(part, &mut keys)?;
        }

        if keys.is_empty() {
            return Err(KeyParseError::EmptySequence);
        }

        Ok(Self { keys })
    }

    fn parse_word(word: &str, keys: &mut Vec<Key>) -> Result<(), KeyParseError> {
        let mut modifiers = KeyModifiers::NONE;
        let mut remaining = word;

        // 修飾キーの解析（"C--" のように修飾キーの後ろが1文字だけの場合はそれがキー）
        while remaining.len() > 2 {
            if let Some(rest) = remaining.strip_prefix("C-") {
                modifiers.ctrl = true;
                remaining = rest;
            } else if let Some(rest) = remaining.strip_prefix("M-") {
                modifiers.alt = true;
                remaining = rest;
            } else if let Some(rest) = remaining.strip_prefix("S-") {
                modifiers.shift = true;
                remaining = rest;
            } else if let Some(rest) = remaining.strip_prefix("s-") {
                modifiers.super_key = true;
                remaining = rest;
            } else {
                break;
            }
        }

        if let Some(code) = Self::named_key(remaining) {
            keys.push(Key::new(modifiers, code));
            return Ok(());
        }

        let mut chars = remaining.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                keys.push(Key::new(modifiers, KeyCode::Char(c)));
                Ok(())
            }
            (Some(_), Some(_)) if modifiers.is_empty() => {
                keys.extend(remaining.chars().map(Key::plain));
                Ok(())
            }
            (None, _) => Err(KeyParseError::InvalidFormat(word.to_string())),
            _ => Err(KeyParseError::UnknownKey(remaining.to_string())),
        }
    }

    fn named_key(name: &str) -> Option<KeyCode> {
        let code = match name {
            "RET" | "Enter" | "<return>" => KeyCode::Enter,
            "TAB" | "Tab" | "<tab>" => KeyCode::Tab,
            "SPC" => KeyCode::Char(' '),
            "ESC" | "Esc" | "<escape>" => KeyCode::Esc,
            "DEL" | "Backspace" | "<backspace>" => KeyCode::Backspace,
            "Delete" | "<delete>" => KeyCode::Delete,
            "Up" | "<up>" => KeyCode::Up,
            "Down" | "<down>" => KeyCode::Down,
            "Left" | "<left>" => KeyCode::Left,
            "Right" | "<right>" => KeyCode::Right,
            _ => return Self::function_key(name),
        };
        Some(code)
    }

    fn function_key(name: &str) -> Option<KeyCode> {
        let inner = name
            .strip_prefix("<f")
            .and_then(|rest| rest.strip_suffix('>'))
            .or_else(|| name.strip_prefix('F'))?;
        match inner.parse::<u8>() {
            Ok(n) if (1..=12).contains(&n) => Some(KeyCode::F(n)),
            _ => None,
        }
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

/// リファクタリングコマンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    RenameFile,
    AddRequire,
    AddUse,
    AddImport,
}

impl Command {
    /// ニーモニックとコマンドの固定表
    pub const ALL: [Command; 4] = [
        Command::RenameFile,
        Command::AddRequire,
        Command::AddUse,
        Command::AddImport,
    ];

    /// 2文字のニーモニック
    pub fn mnemonic(self) -> &'static str {
        match self {
            Command::RenameFile => "rf",
            Command::AddRequire => "ar",
            Command::AddUse => "au",
            Command::AddImport => "ai",
        }
    }

    /// コマンド名
    pub fn name(self) -> &'static str {
        match self {
            Command::RenameFile => "cljr-rename-file",
            Command::AddRequire => "cljr-add-require-to-ns",
            Command::AddUse => "cljr-add-use-to-ns",
            Command::AddImport => "cljr-add-import-to-ns",
        }
    }

    /// コマンド名から検索
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }
}

/// プレフィックス方式：`"<prefix> <keys>"` を1つのシーケンスとして解析
pub fn key_pairs_with_prefix(prefix: &str, keys: &str) -> Result<KeySequence, KeyParseError> {
    KeySequence::parse(&format!("{} {}", prefix, keys))
}

/// 修飾キー方式：各文字に修飾キーを付けたキーを並べて解析
pub fn key_pairs_with_modifier(modifier: &str, keys: &str) -> Result<KeySequence, KeyParseError> {
    let chords: Vec<String> = keys
        .chars()
        .map(|ch| fix_special_modifier_combinations(&format!("{}{}", modifier, ch)))
        .collect();
    KeySequence::parse(&chords.join(" "))
}

/// 端末で表現できない組み合わせを代替キーへ置き換える
fn fix_special_modifier_combinations(key: &str) -> String {
    match key {
        "C-s-i" => "s-TAB".to_string(),
        "C-s-m" => "s-RET".to_string(),
        other => other.to_string(),
    }
}

/// キーパースエラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KeyParseError {
    #[error("Invalid key sequence format: {0}")]
    InvalidFormat(String),

    #[error("Unknown key: {0}")]
    UnknownKey(String),

    #[error("Empty key sequence")]
    EmptySequence,
}

/// キーマップエラー
#[derive(Debug, thiserror::Error)]
pub enum KeyMapError {
    #[error("Key binding conflict: {0}")]
    Conflict(KeySequence),

    #[error("Invalid key sequence: {0}")]
    InvalidSequence(#[from] KeyParseError),
}

impl From<KeyMapError> for crate::error::CljrError {
    fn from(error: KeyMapError) -> Self {
        crate::error::CljrError::Input(crate::error::InputError::InvalidKeySequence {
            sequence: error.to_string(),
        })
    }
}

/// キー検索の結果
#[derive(Debug, Clone, PartialEq)]
pub enum KeyLookupResult {
    /// コマンドが見つかった
    Command(Command),
    /// プレフィックスキー（続きの入力待ち）
    Prefix,
    /// バインドされていない
    Unbound,
}

/// コマンド用キーマップ
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: HashMap<KeySequence, Command>,
    current_sequence: Vec<Key>,
}

impl Keymap {
    /// 空のキーマップ
    pub fn new() -> Self {
        Self::default()
    }

    /// 全コマンドをプレフィックス方式で登録
    pub fn with_prefix(prefix: &str) -> Result<Self, KeyMapError> {
        let mut keymap = Self::new();
        for command in Command::ALL {
            keymap.bind(key_pairs_with_prefix(prefix, command.mnemonic())?, command)?;
        }
        Ok(keymap)
    }

    /// 全コマンドを修飾キー方式で登録
    pub fn with_modifier(modifier: &str) -> Result<Self, KeyMapError> {
        let mut keymap = Self::new();
        for command in Command::ALL {
            keymap.bind(key_pairs_with_modifier(modifier, command.mnemonic())?, command)?;
        }
        Ok(keymap)
    }

    /// 設定のキーバインド方式から構築
    pub fn from_style(style: &KeybindingStyle) -> Result<Self, KeyMapError> {
        match style {
            KeybindingStyle::Prefix(prefix) => Self::with_prefix(prefix),
            KeybindingStyle::Modifier(modifier) => Self::with_modifier(modifier),
        }
    }

    /// キーシーケンスを登録
    ///
    /// 既存のシーケンスと前方一致の関係になる場合は衝突として拒否する
    pub fn bind(&mut self, sequence: KeySequence, command: Command) -> Result<(), KeyMapError> {
        let conflicts = self.bindings.iter().any(|(existing, bound)| {
            let overlapping =
                existing.starts_with(&sequence.keys) || sequence.starts_with(&existing.keys);
            overlapping && !(existing == &sequence && *bound == command)
        });
        if conflicts {
            return Err(KeyMapError::Conflict(sequence));
        }
        log::debug!("bind {} -> {}", sequence, command.name());
        self.bindings.insert(sequence, command);
        Ok(())
    }

    /// 完全一致で検索
    pub fn lookup(&self, sequence: &KeySequence) -> Option<Command> {
        self.bindings.get(sequence).copied()
    }

    /// コマンドに割り当てられたシーケンス
    pub fn sequence_for(&self, command: Command) -> Option<&KeySequence> {
        self.bindings
            .iter()
            .find(|(_, bound)| **bound == command)
            .map(|(sequence, _)| sequence)
    }

    /// 登録済みバインドの一覧（コマンド表の順）
    pub fn bindings(&self) -> Vec<(KeySequence, Command)> {
        Command::ALL
            .into_iter()
            .filter_map(|command| {
                self.sequence_for(command)
                    .map(|sequence| (sequence.clone(), command))
            })
            .collect()
    }

    /// キー入力を処理し、コマンドまたは状態を返す
    pub fn process_key(&mut self, key: Key) -> KeyLookupResult {
        self.current_sequence.push(key);

        let candidate = KeySequence::multi(self.current_sequence.clone());
        if let Some(command) = self.lookup(&candidate) {
            self.current_sequence.clear();
            return KeyLookupResult::Command(command);
        }

        // 前方一致をチェック（プレフィックスの可能性）
        let has_prefix = self
            .bindings
            .keys()
            .any(|sequence| sequence.starts_with(&self.current_sequence));

        if has_prefix {
            KeyLookupResult::Prefix
        } else {
            self.current_sequence.clear();
            KeyLookupResult::Unbound
        }
    }

    /// 入力途中かどうか
    pub fn is_partial_match(&self) -> bool {
        !self.current_sequence.is_empty()
    }
}
