//! バッファ一覧
//!
//! 開いているバッファと現在のバッファを管理する

use super::Buffer;
use crate::error::{BufferError, Result};
use std::path::Path;

/// 複数のバッファを管理する構造体
#[derive(Debug, Clone, Default)]
pub struct BufferList {
    buffers: Vec<Buffer>,
    current: Option<usize>,
}

impl BufferList {
    pub fn new() -> Self {
        Self {
            buffers: Vec::new(),
            current: None,
        }
    }

    /// バッファを追加して現在のバッファにする
    ///
    /// 同名のバッファがあれば `name<2>` 形式で一意にする
    pub fn add(&mut self, mut buffer: Buffer) -> usize {
        let unique = self.unique_name(buffer.name());
        buffer.rename(unique);
        self.buffers.push(buffer);
        let index = self.buffers.len() - 1;
        self.current = Some(index);
        index
    }

    /// 一意なバッファ名を生成
    pub fn unique_name(&self, base: &str) -> String {
        if self.find_by_name(base).is_none() {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}<{}>", base, n);
            if self.find_by_name(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// バッファ名の一覧
    pub fn names(&self) -> Vec<String> {
        self.buffers.iter().map(|b| b.name().to_string()).collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.buffers.iter().position(|b| b.name() == name)
    }

    /// 指定ファイルを開いているバッファ
    pub fn find_by_path(&self, path: &Path) -> Option<usize> {
        self.buffers
            .iter()
            .position(|b| b.file_path().map(|p| p == path).unwrap_or(false))
    }

    pub fn get(&self, index: usize) -> Option<&Buffer> {
        self.buffers.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Buffer> {
        self.buffers.get_mut(index)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Result<&Buffer> {
        self.current
            .and_then(|index| self.buffers.get(index))
            .ok_or_else(|| BufferError::NoCurrentBuffer.into())
    }

    pub fn current_mut(&mut self) -> Result<&mut Buffer> {
        self.current
            .and_then(|index| self.buffers.get_mut(index))
            .ok_or_else(|| BufferError::NoCurrentBuffer.into())
    }

    /// 名前でバッファを切り替え
    pub fn switch_to(&mut self, name: &str) -> Result<()> {
        let index = self
            .find_by_name(name)
            .ok_or_else(|| BufferError::UnknownBuffer {
                name: name.to_string(),
            })?;
        self.current = Some(index);
        Ok(())
    }

    /// インデックスでバッファを切り替え
    pub fn switch_to_index(&mut self, index: usize) -> Result<()> {
        if index >= self.buffers.len() {
            return Err(BufferError::UnknownBuffer {
                name: format!("#{}", index),
            }
            .into());
        }
        self.current = Some(index);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Buffer> {
        self.buffers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Buffer> {
        self.buffers.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn added_buffer_becomes_current() {
        let mut list = BufferList::new();
        assert!(list.current().is_err());

        list.add(Buffer::new("*scratch*"));
        list.add(Buffer::visiting(PathBuf::from("/p/src/a.clj"), "(ns a)"));

        assert_eq!(list.current().unwrap().name(), "a.clj");
        list.switch_to("*scratch*").unwrap();
        assert_eq!(list.current().unwrap().name(), "*scratch*");
    }

    #[test]
    fn duplicate_names_are_numbered() {
        let mut list = BufferList::new();
        list.add(Buffer::visiting(PathBuf::from("/p/src/core.clj"), ""));
        list.add(Buffer::visiting(PathBuf::from("/p/test/core.clj"), ""));
        assert_eq!(list.names(), vec!["core.clj", "core.clj<2>"]);
        assert_eq!(list.find_by_path(Path::new("/p/test/core.clj")), Some(1));
    }

    #[test]
    fn switching_to_unknown_buffer_fails() {
        let mut list = BufferList::new();
        assert!(list.switch_to("missing").is_err());
        assert!(list.switch_to_index(3).is_err());
    }
}
