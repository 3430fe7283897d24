//! Lexical path normalization for path-valued document fields.
//!
//! Nothing here touches the filesystem: `..` is resolved against the text of
//! the path, not against symlinks.

use unicode_normalization::UnicodeNormalization;

/// A normalized path plus the file name and parent directory derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    pub path: String,
    pub file_name: String,
    pub directory: String,
}

/// Normalize `raw` and, when it lies under `base`, make it relative to `base`.
pub fn normalize_path(raw: &str, base: Option<&str>) -> NormalizedPath {
    let mut path = lexical_clean(raw);
    if let Some(base) = base.map(lexical_clean).filter(|b| b != ".") {
        if path == base {
            path = ".".to_string();
        } else if let Some(rest) = strip_dir_prefix(&path, &base) {
            path = rest.to_string();
        }
    }

    let (directory, file_name) = match path.rfind('/') {
        Some(0) => ("/".to_string(), path[1..].to_string()),
        Some(idx) => (path[..idx].to_string(), path[idx + 1..].to_string()),
        None if path == "." => (".".to_string(), String::new()),
        None => (".".to_string(), path.clone()),
    };

    NormalizedPath {
        path,
        file_name,
        directory,
    }
}

fn strip_dir_prefix<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return path.strip_prefix('/').filter(|rest| !rest.is_empty());
    }
    path.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
}

/// NFC, forward slashes, no empty or `.` segments, `..` folded where possible.
fn lexical_clean(raw: &str) -> String {
    let text: String = raw.trim().nfc().collect::<String>().replace('\\', "/");
    let absolute = text.starts_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for segment in text.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}
