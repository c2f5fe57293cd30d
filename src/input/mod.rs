//! 入力処理モジュール
//!
//! キーシーケンスの解析と、リファクタリングコマンドへのキーバインドを提供

pub mod keybinding;

// 公開API
pub use keybinding::{
    key_pairs_with_modifier, key_pairs_with_prefix, Command, Key, KeyCode, KeyLookupResult,
    KeyMapError, KeyModifiers, KeyParseError, KeySequence, Keymap,
};
