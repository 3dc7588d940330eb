// source.rs — Source inputs for one compilation run
//
// Expands configured source roots into an ordered list of `.src` files.
// Directories are walked recursively; entries are sorted so that file IDs
// (and therefore every downstream artifact) are deterministic.
//
// Failure modes: unreadable roots or files (I/O error).
// Side effects: reads the filesystem.

use std::io;
use std::path::{Path, PathBuf};

use crate::id::FileId;

/// Extension recognised when expanding a directory root.
pub const SOURCE_EXTENSION: &str = "src";

/// A loaded source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: FileId,
    pub path: PathBuf,
    pub text: String,
}

impl SourceFile {
    /// Build an in-memory source (used by tests and benchmarks).
    pub fn new(id: FileId, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            text: text.into(),
        }
    }

    /// 1-based line and column for a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let before = &self.text[..offset];
        let line = before.matches('\n').count() + 1;
        let col = match before.rfind('\n') {
            Some(nl) => before[nl + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        (line, col)
    }
}

/// Load every source reachable from `roots`, in order.
///
/// A root naming a file is loaded as-is regardless of extension; a root
/// naming a directory contributes its `*.src` files in sorted path order.
pub fn load_sources(roots: &[PathBuf]) -> io::Result<Vec<SourceFile>> {
    let mut paths = Vec::new();
    for root in roots {
        if root.is_dir() {
            let mut found = Vec::new();
            collect_dir(root, &mut found)?;
            found.sort();
            paths.extend(found);
        } else {
            paths.push(root.clone());
        }
    }

    let mut files = Vec::with_capacity(paths.len());
    for (i, path) in paths.into_iter().enumerate() {
        let text = std::fs::read_to_string(&path)
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))?;
        files.push(SourceFile {
            id: FileId(i as u32),
            path,
            text,
        });
    }
    Ok(files)
}

fn collect_dir(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_dir(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_counts_from_one() {
        let file = SourceFile::new(FileId(0), "a.src", "fun main() {\n  print 1;\n}\n");
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(15), (2, 3));
    }

    #[test]
    fn directory_roots_expand_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.src"), "val b: Int = 2;").unwrap();
        std::fs::write(dir.path().join("a.src"), "val a: Int = 1;").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/c.src"), "val c: Int = 3;").unwrap();

        let files = load_sources(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.src"),
                PathBuf::from("b.src"),
                PathBuf::from("nested/c.src")
            ]
        );
        assert_eq!(files[2].id, FileId(2));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_sources(&[PathBuf::from("/definitely/not/here.src")]).unwrap_err();
        assert!(err.to_string().contains("here.src"));
    }
}
