//! マークリング
//!
//! 編集に追従するマーク位置を保持する。マーク位置への挿入ではマークは移動しない

/// マークリングの最大サイズ
pub const MARK_RING_MAX: usize = 16;

/// マークリング
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkRing {
    marks: Vec<usize>,
}

impl MarkRing {
    pub fn new() -> Self {
        Self { marks: Vec::new() }
    }

    /// マークを追加（上限を超えた古いマークは捨てる）
    pub fn push(&mut self, position: usize) {
        if self.marks.len() == MARK_RING_MAX {
            self.marks.remove(0);
        }
        self.marks.push(position);
    }

    /// 最後に追加したマークを取り出す
    pub fn pop(&mut self) -> Option<usize> {
        self.marks.pop()
    }

    /// 最後に追加したマーク
    pub fn peek(&self) -> Option<usize> {
        self.marks.last().copied()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// `position` への `len` 文字の挿入を反映
    pub fn adjust_for_insert(&mut self, position: usize, len: usize) {
        for mark in &mut self.marks {
            if *mark > position {
                *mark += len;
            }
        }
    }

    /// `start..end` の削除を反映
    pub fn adjust_for_delete(&mut self, start: usize, end: usize) {
        let removed = end - start;
        for mark in &mut self.marks {
            if *mark >= end {
                *mark -= removed;
            } else if *mark > start {
                *mark = start;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_follow_edits_before_them() {
        let mut ring = MarkRing::new();
        ring.push(10);
        ring.adjust_for_insert(3, 4);
        assert_eq!(ring.peek(), Some(14));

        ring.adjust_for_delete(0, 2);
        assert_eq!(ring.peek(), Some(12));
    }

    #[test]
    fn insertion_at_mark_leaves_it_in_place() {
        let mut ring = MarkRing::new();
        ring.push(5);
        ring.adjust_for_insert(5, 3);
        assert_eq!(ring.pop(), Some(5));
        assert!(ring.is_empty());
    }

    #[test]
    fn deletion_spanning_mark_collapses_to_start() {
        let mut ring = MarkRing::new();
        ring.push(6);
        ring.adjust_for_delete(4, 9);
        assert_eq!(ring.peek(), Some(4));
    }

    #[test]
    fn ring_is_bounded() {
        let mut ring = MarkRing::new();
        for pos in 0..(MARK_RING_MAX + 3) {
            ring.push(pos);
        }
        assert_eq!(ring.len(), MARK_RING_MAX);
        assert_eq!(ring.peek(), Some(MARK_RING_MAX + 2));
    }
}
