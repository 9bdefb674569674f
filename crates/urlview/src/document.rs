use clickable_urls::DocumentId;
use ropey::Rope;
use std::ops::Range;
use std::path::PathBuf;

use crate::syntax::ScopeMap;

/// An open file: its text, selection and scope map.
#[derive(Debug, Clone)]
pub struct Buffer {
    pub id: DocumentId,
    pub path: PathBuf,
    pub content: Rope,
    pub selection: Range<usize>,
    pub scopes: ScopeMap,
}

impl Buffer {
    pub fn new(id: DocumentId, path: PathBuf, content: &str, scopes: ScopeMap) -> Self {
        Self {
            id,
            path,
            content: Rope::from_str(content),
            selection: 0..0,
            scopes,
        }
    }

    pub fn text(&self) -> String {
        self.content.to_string()
    }

    /// Byte offset of a zero-based line and character column. Columns past
    /// the end of the line are rejected.
    pub fn position_to_offset(&self, line: usize, column: usize) -> Option<usize> {
        if line >= self.content.len_lines() {
            return None;
        }

        let line_slice = self.content.line(line);
        let mut max_column = line_slice.len_chars();
        let mut chars = line_slice.chars_at(line_slice.len_chars()).reversed();
        if chars.next() == Some('\n') {
            max_column -= 1;
            if chars.next() == Some('\r') {
                max_column -= 1;
            }
        }
        if column > max_column {
            return None;
        }

        let char_idx = self.content.line_to_char(line) + column;
        Some(self.content.char_to_byte(char_idx))
    }

    /// Zero-based line and character column of a byte offset.
    pub fn offset_to_position(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.content.len_bytes());
        let char_idx = self.content.byte_to_char(offset);
        let line = self.content.char_to_line(char_idx);
        let column = char_idx - self.content.line_to_char(line);
        (line, column)
    }

    /// Parses `"<line>:<col>"` with one-based numbers, as printed by
    /// compilers and grep, into a byte offset.
    pub fn parse_position(&self, position: &str) -> Option<usize> {
        let (line, column) = position.split_once(':')?;
        let line: usize = line.trim().parse().ok()?;
        let column: usize = column.trim().parse().ok()?;
        if line == 0 || column == 0 {
            return None;
        }
        self.position_to_offset(line - 1, column - 1)
    }

    pub fn set_cursor(&mut self, offset: usize) {
        let offset = offset.min(self.content.len_bytes());
        self.selection = offset..offset;
    }
}
