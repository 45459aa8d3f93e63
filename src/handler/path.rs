//! Request path translation
//!
//! Maps a URL path onto the served directory. Normalization is purely
//! lexical: `..` can never climb above the root, but symlinks inside the
//! root are followed by the later filesystem calls.

use std::path::{Path, PathBuf};

/// Filesystem location for a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub fs_path: PathBuf,
    /// The raw URL path ended in `/`
    pub trailing_slash: bool,
}

/// Translate a raw (still percent-encoded) URL path under `root`.
///
/// Returns `None` when a segment can never name a file (embedded NUL, or a
/// backslash on platforms where it is a separator).
///
/// # Examples
/// ```
/// use cors_server::handler::path::translate_path;
/// use std::path::Path;
///
/// let resolved = translate_path(Path::new("/srv"), "/a/../../etc/%70asswd").unwrap();
/// assert_eq!(resolved.fs_path, Path::new("/srv/etc/passwd"));
/// assert!(!resolved.trailing_slash);
///
/// assert!(translate_path(Path::new("/srv"), "/hello.txt%00").is_none());
/// ```
pub fn translate_path(root: &Path, raw_path: &str) -> Option<ResolvedPath> {
    // Query and fragment never reach the filesystem
    let raw_path = raw_path
        .split_once(['?', '#'])
        .map_or(raw_path, |(path, _)| path);
    let trailing_slash = raw_path.trim_end().ends_with('/');

    let decoded_bytes = urlencoding::decode_binary(raw_path.as_bytes());
    let decoded = String::from_utf8_lossy(&decoded_bytes);

    let mut fs_path = root.to_path_buf();
    for segment in normalize_segments(&decoded)? {
        fs_path.push(segment);
    }

    Some(ResolvedPath {
        fs_path,
        trailing_slash,
    })
}

/// Collapse `.`/`..`/empty segments; `None` if a segment is not a plain name
fn normalize_segments(path: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s if !is_plain_name(s) => return None,
            s => segments.push(s),
        }
    }
    Some(segments)
}

#[cfg(unix)]
fn is_plain_name(segment: &str) -> bool {
    !segment.contains('\0')
}

#[cfg(not(unix))]
fn is_plain_name(segment: &str) -> bool {
    !segment.contains(['\0', '\\', ':'])
}

/// Percent-encode a path for use in an `href`, keeping `/` separators
pub fn quote_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
