//! Registry of source files with line/column lookup.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::span::{SourceId, Span};

/// A resolved source position, as shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// Display name of the file.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column, counted in characters.
    pub column: u32,
    /// Byte offset from the start of the file.
    pub offset: u32,
    /// Length of the span in bytes.
    pub length: u32,
}

/// One registered source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    id: SourceId,
    name: String,
    path: Option<PathBuf>,
    text: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    fn new(id: SourceId, name: String, path: Option<PathBuf>, text: String) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| u32::try_from(i + 1).unwrap_or(u32::MAX)),
        );
        Self {
            id,
            name,
            path,
            text,
            line_starts,
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filesystem path, if the source was loaded from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Full-file span.
    pub fn span(&self) -> Span {
        Span::from_range(self.id, 0..self.text.len())
    }

    /// 1-based (line, column) of a byte offset. Columns count characters.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let offset = offset.min(u32::try_from(self.text.len()).unwrap_or(u32::MAX));
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line_idx] as usize;
        let end = (offset as usize).min(self.text.len());
        let column = self
            .text
            .get(line_start..end)
            .map_or(end - line_start, |s| s.chars().count());
        (
            u32::try_from(line_idx + 1).unwrap_or(u32::MAX),
            u32::try_from(column + 1).unwrap_or(u32::MAX),
        )
    }

    /// Character offset of a byte offset (renderers index by characters).
    pub fn char_offset(&self, offset: u32) -> usize {
        let end = (offset as usize).min(self.text.len());
        self.text
            .get(..end)
            .map_or(end, |prefix| prefix.chars().count())
    }

    /// Number of lines in the file.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// All sources that take part in one compilation.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-memory source.
    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) -> SourceId {
        self.insert(name.into(), None, text.into())
    }

    /// Register a source loaded from `path`.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> SourceId {
        let path = path.into();
        let name = path.display().to_string();
        self.insert(name, Some(path), text.into())
    }

    fn insert(&mut self, name: String, path: Option<PathBuf>, text: String) -> SourceId {
        let id = SourceId::from(self.files.len());
        self.files.push(SourceFile::new(id, name, path, text));
        id
    }

    pub fn get(&self, id: SourceId) -> Option<&SourceFile> {
        self.files.get(id.0 as usize)
    }

    /// Source text for `id`, or the empty string for an unknown id.
    pub fn text(&self, id: SourceId) -> &str {
        self.get(id).map_or("", SourceFile::text)
    }

    /// Slice of source text covered by `span`.
    pub fn snippet(&self, span: Span) -> Option<&str> {
        self.get(span.source)?.text().get(span.range())
    }

    /// Find an already registered file by path.
    pub fn find_path(&self, path: &Path) -> Option<SourceId> {
        self.files
            .iter()
            .find(|f| f.path.as_deref() == Some(path))
            .map(SourceFile::id)
    }

    pub fn location(&self, span: Span) -> Option<Location> {
        let file = self.get(span.source)?;
        let (line, column) = file.line_col(span.start);
        Some(Location {
            file: file.name.clone(),
            line,
            column,
            offset: span.start,
            length: span.len(),
        })
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_lookup() {
        let mut map = SourceMap::new();
        let id = map.add("main.qasm", "qubit q;\nh q;\n  x q;");
        let file = map.get(id).unwrap();

        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(9), (2, 1));
        assert_eq!(file.line_col(11), (2, 3));
        assert_eq!(file.line_col(16), (3, 3));
        assert_eq!(file.line_count(), 3);
    }

    #[test]
    fn test_columns_count_characters() {
        let mut map = SourceMap::new();
        let id = map.add("u.qasm", "angle θ = π;");
        let file = map.get(id).unwrap();
        // 'π' starts at byte 11 but is the 11th character.
        let pi = file.text().find('π').unwrap();
        assert_eq!(file.line_col(u32::try_from(pi).unwrap()), (1, 11));
        assert_eq!(file.char_offset(u32::try_from(pi).unwrap()), 10);
    }

    #[test]
    fn test_location_and_snippet() {
        let mut map = SourceMap::new();
        let _first = map.add("a.qasm", "");
        let id = map.add_file("/tmp/b.qasm", "bit c;");
        let span = Span::new(id, 4, 5);

        let loc = map.location(span).unwrap();
        assert_eq!(loc.file, "/tmp/b.qasm");
        assert_eq!((loc.line, loc.column, loc.length), (1, 5, 1));
        assert_eq!(map.snippet(span), Some("c"));
        assert_eq!(map.find_path(Path::new("/tmp/b.qasm")), Some(id));
    }
}
