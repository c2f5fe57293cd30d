//! S式の境界検出
//!
//! 文字列・コメント・文字リテラルを除外した上で括弧の対応をとる

use crate::error::NamespaceError;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScanState {
    Code,
    Str,
    Comment,
}

/// テキストの各文字がコード部分かどうかを記録した表
#[derive(Debug, Clone)]
pub struct CodeMap {
    chars: Vec<char>,
    code: Vec<bool>,
}

impl CodeMap {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut code = vec![false; chars.len()];
        let mut state = ScanState::Code;
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            match state {
                ScanState::Code => match ch {
                    '"' => state = ScanState::Str,
                    ';' => state = ScanState::Comment,
                    // 文字リテラル（\( など）は次の1文字まで読み飛ばす
                    '\\' => i += 1,
                    _ => code[i] = true,
                },
                ScanState::Str => match ch {
                    '\\' => i += 1,
                    '"' => state = ScanState::Code,
                    _ => {}
                },
                ScanState::Comment => {
                    if ch == '\n' {
                        state = ScanState::Code;
                        code[i] = true;
                    }
                }
            }
            i += 1;
        }

        Self { chars, code }
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// `position` が文字列・コメントの外にあるか
    pub fn is_code(&self, position: usize) -> bool {
        self.code.get(position).copied().unwrap_or(false)
    }

    /// `open` の開き括弧に対応する閉じ括弧の位置
    pub fn matching_close(&self, open: usize) -> Result<usize, NamespaceError> {
        if !self.is_code(open) || !is_open(self.chars[open]) {
            return Err(NamespaceError::Unbalanced { position: open });
        }

        let mut stack = Vec::new();
        for pos in open..self.chars.len() {
            if !self.code[pos] {
                continue;
            }
            let ch = self.chars[pos];
            if is_open(ch) {
                stack.push(closing_for(ch));
            } else if is_close(ch) {
                if stack.pop() != Some(ch) {
                    return Err(NamespaceError::Unbalanced { position: open });
                }
                if stack.is_empty() {
                    return Ok(pos);
                }
            }
        }

        Err(NamespaceError::Unbalanced { position: open })
    }

    /// `from..to` の範囲でコード部分の `needle` を探す
    pub fn find_in_code(&self, needle: &str, from: usize, to: usize) -> Option<usize> {
        let needle: Vec<char> = needle.chars().collect();
        if needle.is_empty() || to > self.chars.len() || from + needle.len() > to {
            return None;
        }
        (from..=to - needle.len())
            .find(|&pos| self.is_code(pos) && self.chars[pos..pos + needle.len()] == needle[..])
    }
}

fn is_open(ch: char) -> bool {
    matches!(ch, '(' | '[' | '{')
}

fn is_close(ch: char) -> bool {
    matches!(ch, ')' | ']' | '}')
}

fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Clojure シンボルを構成する文字か
pub fn is_symbol_char(ch: char) -> bool {
    ch.is_alphanumeric() || "*+!-_'?<>=/.:#$%&|".contains(ch)
}

/// シンボルの前に付くリーダーマクロ文字か
pub fn is_reader_prefix_char(ch: char) -> bool {
    matches!(ch, '\'' | '#' | '`' | '~' | '@' | '^' | ':')
}
