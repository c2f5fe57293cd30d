//! バッファ管理モジュール
//!
//! テキストデータ、ポイント（カーソル位置）、マークの管理を提供
//! 位置はすべて文字インデックス（0ベース）で扱う

pub mod list;
pub mod marks;

pub use list::BufferList;
pub use marks::MarkRing;

use crate::error::{BufferError, Result};
use std::path::{Path, PathBuf};

/// 単一のテキストバッファ
#[derive(Debug, Clone)]
pub struct Buffer {
    name: String,
    text: String,
    point: usize,
    file_path: Option<PathBuf>,
    modified: bool,
    marks: MarkRing,
}

impl Buffer {
    /// 新しい空のバッファを作成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: String::new(),
            point: 0,
            file_path: None,
            modified: false,
            marks: MarkRing::new(),
        }
    }

    /// 文字列からバッファを作成
    pub fn from_str(name: impl Into<String>, text: &str) -> Self {
        let mut buffer = Self::new(name);
        buffer.text = text.to_string();
        buffer
    }

    /// ファイル内容からバッファを作成（名前はファイル名）
    pub fn visiting(path: PathBuf, text: &str) -> Self {
        let name = buffer_name_for(&path);
        let mut buffer = Self::from_str(name, text);
        buffer.file_path = Some(path);
        buffer
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// 関連ファイルを変更
    pub fn set_file_path(&mut self, path: Option<PathBuf>) {
        self.file_path = path;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn point(&self) -> usize {
        self.point
    }

    /// ポイントを移動（範囲外はバッファ末尾に丸める）
    pub fn goto_char(&mut self, position: usize) {
        self.point = position.min(self.len_chars());
    }

    pub fn marks(&self) -> &MarkRing {
        &self.marks
    }

    /// 現在のポイントをマークリングへ追加
    pub fn push_mark(&mut self) {
        self.marks.push(self.point);
    }

    /// 最後のマークへポイントを戻す
    pub fn pop_mark(&mut self) -> Result<usize> {
        let mark = self.marks.pop().ok_or(BufferError::EmptyMarkRing)?;
        self.goto_char(mark);
        Ok(self.point)
    }

    /// 文字インデックスをバイトオフセットへ変換
    pub fn char_to_byte(&self, position: usize) -> usize {
        char_to_byte(&self.text, position)
    }

    /// バイトオフセットを文字インデックスへ変換
    pub fn byte_to_char(&self, byte: usize) -> usize {
        self.text[..byte.min(self.text.len())].chars().count()
    }

    pub fn char_at(&self, position: usize) -> Option<char> {
        self.text[self.char_to_byte(position)..].chars().next()
    }

    /// ポイント位置に挿入し、ポイントを挿入文字列の後ろへ進める
    pub fn insert(&mut self, s: &str) {
        let at = self.point;
        self.insert_raw(at, s);
        self.point = at + s.chars().count();
    }

    /// 任意位置に挿入（ポイントは後ろにある場合のみ移動）
    pub fn insert_at(&mut self, position: usize, s: &str) -> Result<()> {
        if position > self.len_chars() {
            return Err(BufferError::InvalidCursorPosition { position }.into());
        }
        let point = self.point;
        self.insert_raw(position, s);
        if point > position {
            self.point = point + s.chars().count();
        }
        Ok(())
    }

    /// 範囲削除し、削除した文字列を返す
    pub fn delete_range(&mut self, start: usize, end: usize) -> Result<String> {
        self.check_range(start, end)?;
        let start_byte = self.char_to_byte(start);
        let end_byte = self.char_to_byte(end);
        let removed: String = self.text.drain(start_byte..end_byte).collect();

        if self.point >= end {
            self.point -= end - start;
        } else if self.point > start {
            self.point = start;
        }
        self.marks.adjust_for_delete(start, end);
        if start != end {
            self.modified = true;
        }
        Ok(removed)
    }

    /// 範囲を置き換え
    pub fn replace_range(&mut self, start: usize, end: usize, replacement: &str) -> Result<()> {
        self.delete_range(start, end)?;
        self.insert_at(start, replacement)
    }

    /// `position` を含む行の先頭
    pub fn line_start(&self, position: usize) -> usize {
        let byte = self.char_to_byte(position);
        match self.text[..byte].rfind('\n') {
            Some(newline) => self.byte_to_char(newline + 1),
            None => 0,
        }
    }

    /// `position` の列番号（0ベース）
    pub fn column_at(&self, position: usize) -> usize {
        position - self.line_start(position)
    }

    fn insert_raw(&mut self, position: usize, s: &str) {
        if s.is_empty() {
            return;
        }
        let byte = self.char_to_byte(position);
        self.text.insert_str(byte, s);
        self.marks.adjust_for_insert(position, s.chars().count());
        self.modified = true;
    }

    fn check_range(&self, start: usize, end: usize) -> Result<()> {
        if start > end || end > self.len_chars() {
            return Err(BufferError::InvalidRange { start, end }.into());
        }
        Ok(())
    }
}

/// パスからバッファ名を決める（ファイル名部分）
pub fn buffer_name_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// 文字インデックスをバイトオフセットへ変換（範囲外は末尾）
pub(crate) fn char_to_byte(text: &str, position: usize) -> usize {
    text.char_indices()
        .nth(position)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}
