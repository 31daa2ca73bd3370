//! Source discovery: list the Markdown files a batch will convert.
//!
//! Enumeration is non-recursive and only considers the file name, matched
//! against a small glob language (`*`, `?`, literals). Patterns compile to an
//! anchored byte [`Regex`] so matching is a single call per directory entry
//! and, on unix, names that are not valid UTF-8 still match.

use crate::config::FileOrder;
use crate::error::BatchError;
use regex::bytes::{Regex, RegexBuilder};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A compiled file-name pattern such as `*.md`.
#[derive(Debug, Clone)]
pub struct SourcePattern {
    raw: String,
    regex: Regex,
}

impl SourcePattern {
    /// Compile a glob pattern.
    ///
    /// Patterns apply to file names only, so a path separator is rejected.
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self, BatchError> {
        if pattern.is_empty() {
            return Err(BatchError::InvalidPattern {
                pattern: pattern.to_string(),
                detail: "pattern is empty".into(),
            });
        }
        if pattern.contains('/') || pattern.contains(std::path::MAIN_SEPARATOR) {
            return Err(BatchError::InvalidPattern {
                pattern: pattern.to_string(),
                detail: "patterns match file names only and cannot contain a path separator"
                    .into(),
            });
        }

        let regex = RegexBuilder::new(&glob_to_regex(pattern))
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| BatchError::InvalidPattern {
                pattern: pattern.to_string(),
                detail: e.to_string(),
            })?;

        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name.as_bytes())
    }

    /// Match a raw directory-entry name.
    #[cfg(unix)]
    pub fn matches_os(&self, file_name: &OsStr) -> bool {
        use std::os::unix::ffi::OsStrExt;
        self.regex.is_match(file_name.as_bytes())
    }

    /// Match a raw directory-entry name. Names that are not valid Unicode
    /// never match.
    #[cfg(not(unix))]
    pub fn matches_os(&self, file_name: &OsStr) -> bool {
        file_name.to_str().is_some_and(|n| self.matches(n))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Translate `*` and `?` into regex syntax, escaping everything else.
///
/// `*` matches any bytes. `?` matches one character, or a single byte of a
/// name that is not valid UTF-8.
fn glob_to_regex(pattern: &str) -> String {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            '*' | '?' => {
                re.push_str(&regex::escape(&literal));
                literal.clear();
                re.push_str(if ch == '*' {
                    "(?s-u:.)*"
                } else {
                    "(?:(?s:.)|(?s-u:.))"
                });
            }
            c => literal.push(c),
        }
    }
    re.push_str(&regex::escape(&literal));
    re.push('$');
    re
}

/// List regular files in `dir` whose names match `pattern`.
///
/// Symlinks are followed; entries that are directories (even if their name
/// matches) and dangling links are skipped. With [`FileOrder::Filesystem`]
/// the result keeps the order the directory listing produced.
pub async fn list_source_files(
    dir: &Path,
    pattern: &SourcePattern,
    order: FileOrder,
) -> Result<Vec<PathBuf>, BatchError> {
    check_source_dir(dir).await?;

    let read_err = |source: std::io::Error| BatchError::ReadDirFailed {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            BatchError::PermissionDenied {
                path: dir.to_path_buf(),
            }
        } else {
            read_err(e)
        }
    })?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        if !pattern.matches_os(&entry.file_name()) {
            continue;
        }

        let path = entry.path();
        if path.to_str().is_none() {
            warn!("File name is not valid UTF-8: {}", path.display());
        }
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => debug!("Skipping non-file match: {}", path.display()),
            Err(e) => debug!("Skipping unreadable entry {}: {}", path.display(), e),
        }
    }

    if order == FileOrder::Name {
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    }

    debug!(
        "Matched {} file(s) with '{}' in {}",
        files.len(),
        pattern.as_str(),
        dir.display()
    );
    Ok(files)
}

/// Fail unless `dir` exists and is a readable directory.
pub async fn check_source_dir(dir: &Path) -> Result<(), BatchError> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(BatchError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(BatchError::SourceDirNotFound {
            path: dir.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(BatchError::PermissionDenied {
                path: dir.to_path_buf(),
            })
        }
        Err(e) => Err(BatchError::ReadDirFailed {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(paths: &[PathBuf]) -> Vec<String> {
        let mut v: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        v.sort();
        v
    }

    fn md() -> SourcePattern {
        SourcePattern::new("*.md", false).unwrap()
    }

    #[test]
    fn star_matches_extension() {
        let p = md();
        assert!(p.matches("a.md"));
        assert!(p.matches("release.notes.md"));
        assert!(p.matches(".md"));
        assert!(!p.matches("a.markdown"));
        assert!(!p.matches("a.md.bak"));
        assert!(!p.matches("amd"));
    }

    #[test]
    fn case_sensitive_by_default() {
        assert!(!md().matches("notes.MD"));
        assert!(SourcePattern::new("*.md", true).unwrap().matches("notes.MD"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        let p = SourcePattern::new("ch?.md", false).unwrap();
        assert!(p.matches("ch1.md"));
        assert!(!p.matches("ch10.md"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let p = SourcePattern::new("notes(1)+.md", false).unwrap();
        assert!(p.matches("notes(1)+.md"));
        assert!(!p.matches("notes1.md"));
    }

    #[test]
    fn separator_is_rejected() {
        let err = SourcePattern::new("docs/*.md", false).unwrap_err();
        assert!(matches!(err, BatchError::InvalidPattern { .. }));
    }

    #[test]
    fn question_mark_matches_one_multibyte_char() {
        let p = SourcePattern::new("caf?.md", false).unwrap();
        assert!(p.matches("café.md"));
        assert!(!p.matches("caf.md"));
    }

    #[cfg(unix)]
    #[test]
    fn raw_bytes_match() {
        use std::os::unix::ffi::OsStrExt;
        let latin1 = OsStr::from_bytes(b"caf\xe9.md");
        assert!(md().matches_os(latin1));
        assert!(SourcePattern::new("caf?.md", false).unwrap().matches_os(latin1));
        assert!(!md().matches_os(OsStr::from_bytes(b"caf\xe9.txt")));
    }

    // Linux filesystems accept arbitrary bytes in names; APFS does not.
    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn lists_non_utf8_names() {
        use std::os::unix::ffi::OsStrExt;
        let dir = TempDir::new().unwrap();
        let name = OsStr::from_bytes(b"caf\xe9.md");
        std::fs::write(dir.path().join(name), "# C").unwrap();
        std::fs::write(dir.path().join("a.md"), "# A").unwrap();

        let files = list_source_files(dir.path(), &md(), FileOrder::Name)
            .await
            .unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.file_name() == Some(name)));
    }

    #[tokio::test]
    async fn lists_only_matching_regular_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "# A").unwrap();
        std::fs::write(dir.path().join("b.md"), "# B").unwrap();
        std::fs::write(dir.path().join("c.txt"), "c").unwrap();
        std::fs::write(dir.path().join("notes.MD"), "n").unwrap();
        std::fs::create_dir(dir.path().join("folder.md")).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/nested.md"), "n").unwrap();

        let files = list_source_files(dir.path(), &md(), FileOrder::Filesystem)
            .await
            .unwrap();
        assert_eq!(names(&files), vec!["a.md", "b.md"]);
        assert!(files.iter().all(|f| f.parent() == Some(dir.path())));
    }

    #[tokio::test]
    async fn name_order_sorts() {
        let dir = TempDir::new().unwrap();
        for n in ["c.md", "a.md", "b.md"] {
            std::fs::write(dir.path().join(n), n).unwrap();
        }
        let files = list_source_files(dir.path(), &md(), FileOrder::Name)
            .await
            .unwrap();
        let ordered: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(ordered, vec!["a.md", "b.md", "c.md"]);
    }

    #[tokio::test]
    async fn empty_directory_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let files = list_source_files(dir.path(), &md(), FileOrder::Filesystem)
            .await
            .unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn missing_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = list_source_files(&missing, &md(), FileOrder::Filesystem)
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::SourceDirNotFound { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn file_as_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.md");
        std::fs::write(&file, "# A").unwrap();
        let err = list_source_files(&file, &md(), FileOrder::Filesystem)
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::NotADirectory { .. }), "{err:?}");
    }
}
