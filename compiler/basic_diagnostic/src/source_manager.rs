//! Source file registry.
//!
//! Maps `file_id` to a canonical path and (optionally) an in-memory buffer,
//! and resolves byte offsets to 1-based line/column pairs. Ids are handed
//! out monotonically starting at 1 and are never recycled; id 0 is the
//! sentinel for "identifier space exhausted", which the driver reports as
//! `B0005`.

#[derive(Debug, Default)]
struct FileEntry {
    path: String,
    source: Option<String>,
}

/// Registry of source files known to the current compilation.
#[derive(Debug, Default)]
pub struct SourceManager {
    files: Vec<FileEntry>,
}

impl SourceManager {
    pub fn new() -> Self {
        SourceManager::default()
    }

    /// Register a file path and return its id.
    ///
    /// Returns 0 when the id space is exhausted.
    pub fn add_file(&mut self, path: impl Into<String>) -> u32 {
        let Ok(next) = u32::try_from(self.files.len() + 1) else {
            return 0;
        };
        if next == u32::MAX {
            return 0;
        }
        self.files.push(FileEntry {
            path: path.into(),
            source: None,
        });
        next
    }

    /// Attach the source buffer for a registered file.
    pub fn set_source(&mut self, file_id: u32, source: impl Into<String>) {
        if let Some(entry) = self.entry_mut(file_id) {
            entry.source = Some(source.into());
        }
    }

    /// Canonical path for a file id, if registered.
    pub fn path(&self, file_id: u32) -> Option<&str> {
        self.entry(file_id).map(|e| e.path.as_str())
    }

    /// In-memory buffer for a file id, when one was attached.
    pub fn source(&self, file_id: u32) -> Option<&str> {
        self.entry(file_id).and_then(|e| e.source.as_deref())
    }

    /// Resolve a byte offset in `text` to a 1-based (line, column) pair.
    ///
    /// Columns count bytes; the lexer guarantees token spans start at
    /// character boundaries.
    pub fn line_col(text: &str, offset: u32) -> (u32, u32) {
        let offset = (offset as usize).min(text.len());
        let mut line = 1u32;
        let mut line_start = 0usize;
        for (pos, byte) in text.as_bytes()[..offset].iter().enumerate() {
            if *byte == b'\n' {
                line += 1;
                line_start = pos + 1;
            }
        }
        let col = u32::try_from(offset - line_start).unwrap_or(u32::MAX - 1) + 1;
        (line, col)
    }

    /// The full text of the 1-based line `line` in `text`, without the
    /// trailing newline.
    pub fn line_text(text: &str, line: u32) -> &str {
        text.split('\n')
            .nth(line.saturating_sub(1) as usize)
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .unwrap_or("")
    }

    fn entry(&self, file_id: u32) -> Option<&FileEntry> {
        if file_id == 0 {
            return None;
        }
        self.files.get(file_id as usize - 1)
    }

    fn entry_mut(&mut self, file_id: u32) -> Option<&mut FileEntry> {
        if file_id == 0 {
            return None;
        }
        self.files.get_mut(file_id as usize - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ids_are_monotone_from_one() {
        let mut sm = SourceManager::new();
        assert_eq!(sm.add_file("a.bas"), 1);
        assert_eq!(sm.add_file("b.bas"), 2);
        assert_eq!(sm.path(1), Some("a.bas"));
        assert_eq!(sm.path(2), Some("b.bas"));
        assert_eq!(sm.path(0), None);
        assert_eq!(sm.path(3), None);
    }

    #[test]
    fn test_line_col_resolution() {
        let text = "10 PRINT 1\n20 CASE\n30 END\n";
        assert_eq!(SourceManager::line_col(text, 0), (1, 1));
        assert_eq!(SourceManager::line_col(text, 3), (1, 4));
        // Offset of "CASE" on line 2.
        let case_at = text.find("CASE").map(|o| o as u32);
        assert_eq!(SourceManager::line_col(text, case_at.unwrap_or(0)), (2, 4));
    }

    #[test]
    fn test_line_text() {
        let text = "10 PRINT 1\n20 CASE\n";
        assert_eq!(SourceManager::line_text(text, 1), "10 PRINT 1");
        assert_eq!(SourceManager::line_text(text, 2), "20 CASE");
        assert_eq!(SourceManager::line_text(text, 9), "");
    }
}
