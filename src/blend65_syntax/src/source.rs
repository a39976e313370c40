use crate::span::{Position, SourceLocation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a registered source file.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub u32);

/// One registered source text with a precomputed line index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    fn new(name: String, text: String) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self { name, text, line_starts }
    }

    /// Position for a byte offset. Offsets past the end clamp to the last line.
    pub fn position(&self, offset: u32) -> Position {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line_idx];
        Position {
            line: line_idx as u32 + 1,
            column: offset - line_start + 1,
            offset,
        }
    }

    /// Text of the given 1-based line, without the trailing newline.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let idx = line.checked_sub(1)? as usize;
        let start = *self.line_starts.get(idx)? as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&n| n as usize - 1)
            .unwrap_or(self.text.len());
        self.text.get(start..end)
    }
}

/// Registry of the source texts a compilation consumed. Diagnostics carry
/// locations only; renderers come back here for snippet text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceRegistry {
    files: Vec<SourceFile>,
    by_name: HashMap<String, FileId>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source text. Re-registering a name replaces its text.
    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) -> FileId {
        let name = name.into();
        let file = SourceFile::new(name.clone(), text.into());
        if let Some(&id) = self.by_name.get(&name) {
            self.files[id.0 as usize] = file;
            return id;
        }
        let id = FileId(self.files.len() as u32);
        self.files.push(file);
        self.by_name.insert(name, id);
        id
    }

    pub fn get(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0 as usize)
    }

    pub fn by_name(&self, name: &str) -> Option<&SourceFile> {
        self.by_name.get(name).and_then(|&id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Build a location from byte offsets within a registered file.
    pub fn location(&self, id: FileId, start: u32, end: u32) -> Option<SourceLocation> {
        let file = self.get(id)?;
        Some(SourceLocation {
            file: Some(file.name.clone()),
            start: file.position(start),
            end: file.position(end),
        })
    }

    /// Source line under a location, for diagnostic snippets.
    pub fn snippet(&self, location: &SourceLocation) -> Option<&str> {
        let file = self.by_name(location.file.as_deref()?)?;
        file.line_text(location.start.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_accounts_for_newlines() {
        let mut reg = SourceRegistry::new();
        let id = reg.add("main.b65", "module T\nlet x: byte = 1\n");
        let file = reg.get(id).unwrap();
        assert_eq!(file.position(0), Position::new(1, 1, 0));
        assert_eq!(file.position(9), Position::new(2, 1, 9));
        assert_eq!(file.position(13), Position::new(2, 5, 13));
    }

    #[test]
    fn snippet_returns_the_line() {
        let mut reg = SourceRegistry::new();
        let id = reg.add("main.b65", "module T\nlet x: byte = 1\n");
        let loc = reg.location(id, 13, 14).unwrap();
        assert_eq!(reg.snippet(&loc), Some("let x: byte = 1"));
    }

    #[test]
    fn re_adding_a_name_replaces_text() {
        let mut reg = SourceRegistry::new();
        let a = reg.add("main.b65", "one");
        let b = reg.add("main.b65", "two");
        assert_eq!(a, b);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.by_name("main.b65").unwrap().text, "two");
    }
}
