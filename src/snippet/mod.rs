//! スニペット展開
//!
//! テンプレートをポイント位置に展開し、フィールド間を移動しながら入力を受け付ける。
//! 展開終了時の処理はグローバルなフックではなく、展開ごとに渡す継続として保持する

pub mod template;

pub use template::SnippetTemplate;

use crate::buffer::Buffer;
use crate::error::{Result, SnippetError};

/// 展開終了時に一度だけ呼ばれる継続
pub type ExitHook = Box<dyn FnOnce(&mut Buffer)>;

/// スニペット展開の差し替え口
pub trait SnippetExpander {
    /// `template` をポイント位置に展開する
    fn expand(&self, buffer: &mut Buffer, template: &str, on_exit: ExitHook) -> Result<SnippetSession>;
}

/// 既定のテンプレート展開
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateExpander;

impl SnippetExpander for TemplateExpander {
    fn expand(&self, buffer: &mut Buffer, template: &str, on_exit: ExitHook) -> Result<SnippetSession> {
        let parsed = SnippetTemplate::parse(template)?;
        let (text, rendered) = parsed.render();

        let origin = buffer.point();
        buffer.insert(&text);

        let fields: Vec<FieldSpan> = rendered
            .into_iter()
            .map(|field| FieldSpan {
                index: field.index,
                start: origin + field.start,
                end: origin + field.end,
                parent: field.parent,
                modified: false,
                removed: false,
            })
            .collect();

        let mut session = SnippetSession::new(origin, buffer.point(), fields, on_exit);
        log::debug!(
            "expanded snippet {:?} at {} with {} fields",
            template,
            origin,
            session.order.len()
        );

        if session.order.is_empty() {
            session.finish(buffer)?;
        } else {
            session.enter_field(buffer, 0);
        }
        Ok(session)
    }
}

#[derive(Debug, Clone)]
struct FieldSpan {
    index: usize,
    start: usize,
    end: usize,
    parent: Option<usize>,
    modified: bool,
    removed: bool,
}

/// フィールド移動の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetState {
    /// 指定インデックスのフィールドに移動した
    Field(usize),
    /// 展開が終了した
    Finished,
}

/// 展開中のスニペット
pub struct SnippetSession {
    start: usize,
    end: usize,
    fields: Vec<FieldSpan>,
    /// 移動順（フィールド番号順、`$0` は含まない）
    order: Vec<usize>,
    current: Option<usize>,
    on_exit: Option<ExitHook>,
    finished: bool,
}

impl std::fmt::Debug for SnippetSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnippetSession")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("current", &self.current_field())
            .field("finished", &self.finished)
            .finish()
    }
}

impl SnippetSession {
    fn new(start: usize, end: usize, fields: Vec<FieldSpan>, on_exit: ExitHook) -> Self {
        // 同じ番号が複数ある場合は最初の出現だけを移動先にする
        let mut order: Vec<usize> = Vec::new();
        for (slot, field) in fields.iter().enumerate() {
            if field.index != 0 && !order.iter().any(|&s| fields[s].index == field.index) {
                order.push(slot);
            }
        }
        order.sort_by_key(|&slot| fields[slot].index);

        Self {
            start,
            end,
            fields,
            order,
            current: None,
            on_exit: Some(on_exit),
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 現在のフィールド番号
    pub fn current_field(&self) -> Option<usize> {
        self.current
            .and_then(|i| self.order.get(i))
            .map(|&slot| self.fields[slot].index)
    }

    /// 展開範囲（文字インデックス）
    pub fn region(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// フィールドの現在の範囲
    pub fn field_range(&self, index: usize) -> Option<(usize, usize)> {
        self.order
            .iter()
            .map(|&slot| &self.fields[slot])
            .find(|field| field.index == index && !field.removed)
            .map(|field| (field.start, field.end))
    }

    /// 現在のフィールドに文字列を入力する
    ///
    /// 既定値を持つフィールドへの最初の入力は既定値（と入れ子フィールド）を置き換える
    pub fn insert(&mut self, buffer: &mut Buffer, text: &str) -> Result<()> {
        let slot = self.current_slot()?;

        if !self.fields[slot].modified && self.fields[slot].end > self.fields[slot].start {
            let (start, end) = (self.fields[slot].start, self.fields[slot].end);
            buffer.delete_range(start, end)?;
            self.apply_delete(slot, start, end);
            buffer.goto_char(start);
        }
        self.fields[slot].modified = true;

        let (start, end) = (self.fields[slot].start, self.fields[slot].end);
        if buffer.point() < start || buffer.point() > end {
            buffer.goto_char(end);
        }
        let at = buffer.point();
        buffer.insert(text);
        self.apply_insert(slot, at, text.chars().count());
        Ok(())
    }

    /// 次のフィールドへ移動（最後のフィールドの次で終了）
    pub fn next_field(&mut self, buffer: &mut Buffer) -> Result<SnippetState> {
        self.ensure_active()?;
        let mut next = self.current.map(|i| i + 1).unwrap_or(0);
        while next < self.order.len() && self.fields[self.order[next]].removed {
            next += 1;
        }
        if next >= self.order.len() {
            self.finish(buffer)?;
            return Ok(SnippetState::Finished);
        }
        self.enter_field(buffer, next);
        Ok(SnippetState::Field(self.fields[self.order[next]].index))
    }

    /// 前のフィールドへ移動（先頭ではそのまま）
    pub fn previous_field(&mut self, buffer: &mut Buffer) -> Result<SnippetState> {
        self.ensure_active()?;
        let mut target = self.current.unwrap_or(0);
        while target > 0 {
            target -= 1;
            if !self.fields[self.order[target]].removed {
                self.enter_field(buffer, target);
                break;
            }
        }
        let slot = self.current_slot()?;
        Ok(SnippetState::Field(self.fields[slot].index))
    }

    /// 展開を終了する
    ///
    /// `$0` があればそこへポイントを移動し、その後で終了時の継続を実行する
    pub fn finish(&mut self, buffer: &mut Buffer) -> Result<()> {
        self.ensure_active()?;
        self.finished = true;
        self.current = None;

        let exit = self
            .fields
            .iter()
            .find(|field| field.index == 0 && !field.removed)
            .map(|field| field.start)
            .unwrap_or(self.end);
        buffer.goto_char(exit);

        if let Some(hook) = self.on_exit.take() {
            hook(buffer);
        }
        Ok(())
    }

    fn enter_field(&mut self, buffer: &mut Buffer, order_index: usize) {
        self.current = Some(order_index);
        let field = &self.fields[self.order[order_index]];
        buffer.goto_char(field.start);
    }

    fn ensure_active(&self) -> Result<()> {
        if self.finished {
            return Err(SnippetError::Finished.into());
        }
        Ok(())
    }

    fn current_slot(&self) -> Result<usize> {
        self.ensure_active()?;
        self.current
            .and_then(|i| self.order.get(i).copied())
            .ok_or_else(|| SnippetError::Finished.into())
    }

    fn is_ancestor(&self, ancestor: usize, mut slot: usize) -> bool {
        while let Some(parent) = self.fields[slot].parent {
            if parent == ancestor {
                return true;
            }
            slot = parent;
        }
        false
    }

    fn apply_delete(&mut self, slot: usize, start: usize, end: usize) {
        let removed = end - start;
        for other in 0..self.fields.len() {
            if other == slot || self.fields[other].removed {
                continue;
            }
            if self.is_ancestor(slot, other) {
                self.fields[other].removed = true;
            } else if self.fields[other].start >= end {
                self.fields[other].start -= removed;
                self.fields[other].end -= removed;
            } else if self.fields[other].end >= end {
                self.fields[other].end -= removed;
            }
        }
        self.fields[slot].end = start;
        self.end -= removed;
    }

    fn apply_insert(&mut self, slot: usize, at: usize, len: usize) {
        for other in 0..self.fields.len() {
            if self.fields[other].removed {
                continue;
            }
            if other == slot || self.is_ancestor(other, slot) {
                self.fields[other].end += len;
            } else if self.fields[other].start >= at {
                self.fields[other].start += len;
                self.fields[other].end += len;
            }
        }
        self.end += len;
    }
}
