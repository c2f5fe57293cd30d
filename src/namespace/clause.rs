//! ns 節への挿入位置決め
//!
//! 既存の節があればその末尾に新しい要素を書く位置へ、
//! なければ空の節を1つ作ってその内側へポイントを移動する

use super::sexp::{is_symbol_char, CodeMap};
use super::find_ns_form;
use crate::buffer::Buffer;
use crate::error::{NamespaceError, Result};

/// ns 宣言内の節の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    Require,
    Use,
    Import,
}

impl ClauseKind {
    /// 節のキーワード
    pub fn keyword(self) -> &'static str {
        match self {
            ClauseKind::Require => ":require",
            ClauseKind::Use => ":use",
            ClauseKind::Import => ":import",
        }
    }

    /// 挿入後に展開するスニペットテンプレート
    pub fn template(self) -> &'static str {
        match self {
            ClauseKind::Require => "[$1 :as $2]",
            ClauseKind::Use => "[$1 :refer ${2:[$3]}]",
            ClauseKind::Import => "$1",
        }
    }
}

/// 節の中で新しい要素を書き始める位置へポイントを移動する
pub fn insert_in_ns(buffer: &mut Buffer, kind: ClauseKind) -> Result<()> {
    let form = find_ns_form(buffer.text()).ok_or(NamespaceError::NotFound)?;
    let map = CodeMap::new(buffer.text());
    let ns_close = map.matching_close(form.start)?;

    match find_clause(&map, kind, form.start + 1, ns_close) {
        Some(clause_open) => {
            let clause_close = map.matching_close(clause_open)?;
            let body_start = clause_open + 1 + kind.keyword().chars().count();
            let first_entry = (body_start..clause_close)
                .find(|&pos| map.is_code(pos) && !map.chars()[pos].is_whitespace());

            match first_entry {
                None => {
                    buffer.goto_char(clause_close);
                    buffer.insert(" ");
                }
                Some(entry) => {
                    let indent = buffer.column_at(entry);
                    newline_and_indent_at(buffer, clause_close, indent);
                }
            }
        }
        None => {
            let indent = buffer.column_at(form.start) + 2;
            newline_and_indent_at(buffer, ns_close, indent);
            buffer.insert(&format!("({} )", kind.keyword()));
            let point = buffer.point();
            buffer.goto_char(point - 1);
        }
    }

    log::debug!("insert_in_ns {} at {}", kind.keyword(), buffer.point());
    Ok(())
}

/// `(` + キーワードで始まる節を `from..to` の範囲から探す
fn find_clause(map: &CodeMap, kind: ClauseKind, from: usize, to: usize) -> Option<usize> {
    let needle = format!("({}", kind.keyword());
    let needle_len = needle.chars().count();
    let mut cursor = from;

    while let Some(pos) = map.find_in_code(&needle, cursor, to) {
        let next = map.chars().get(pos + needle_len).copied();
        match next {
            Some(ch) if is_symbol_char(ch) => cursor = pos + 1,
            _ => return Some(pos),
        }
    }
    None
}

/// `position` 直前の空白を除いてから改行とインデントを挿入する
fn newline_and_indent_at(buffer: &mut Buffer, position: usize, indent: usize) {
    let mut start = position;
    while start > 0 && matches!(buffer.char_at(start - 1), Some(' ') | Some('\t')) {
        start -= 1;
    }
    if start < position {
        if let Err(err) = buffer.delete_range(start, position) {
            log::warn!("could not trim whitespace before {}: {}", position, err);
        }
    }
    buffer.goto_char(start);
    buffer.insert(&format!("\n{}", " ".repeat(indent)));
}
