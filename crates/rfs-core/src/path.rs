//! Remote path helpers.
//!
//! Remote backends speak POSIX paths regardless of the host platform,
//! so these helpers operate on plain strings rather than OS path types.
//! Backslashes are accepted on input (Windows-originated configuration)
//! and normalized to forward slashes.

/// Normalizes a remote path.
///
/// Collapses repeated separators, converts backslashes, resolves `.`
/// and `..` segments, and strips trailing slashes unless the result is
/// the root. An empty input normalizes to `"."`.
///
/// # Examples
///
/// ```
/// use rfs_core::path::normalize;
///
/// assert_eq!(normalize("/a//b\\c/"), "/a/b/c");
/// assert_eq!(normalize("a/./b/../c"), "a/c");
/// assert_eq!(normalize("///"), "/");
/// assert_eq!(normalize(""), ".");
/// ```
#[must_use]
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/') || path.starts_with('\\');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|&s| s != "..") {
                    segments.pop();
                } else if !absolute {
                    // Leading ".." in a relative path is preserved.
                    segments.push("..");
                }
                // ".." above an absolute root is dropped.
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (absolute, joined.is_empty()) {
        (true, true) => "/".to_owned(),
        (true, false) => format!("/{joined}"),
        (false, true) => ".".to_owned(),
        (false, false) => joined,
    }
}

/// Joins a directory and a child name, normalizing the result.
///
/// # Examples
///
/// ```
/// use rfs_core::path::join;
///
/// assert_eq!(join("/data", "reports"), "/data/reports");
/// assert_eq!(join("/data/", "a/b"), "/data/a/b");
/// assert_eq!(join(".", "file.txt"), "file.txt");
/// ```
#[must_use]
pub fn join(dir: &str, name: &str) -> String {
    normalize(&format!("{dir}/{name}"))
}

/// Returns the parent directory of a normalized path.
///
/// # Examples
///
/// ```
/// use rfs_core::path::parent;
///
/// assert_eq!(parent("/a/b/c"), "/a/b");
/// assert_eq!(parent("/a"), "/");
/// assert_eq!(parent("a"), ".");
/// assert_eq!(parent("/"), "/");
/// ```
#[must_use]
pub fn parent(path: &str) -> &str {
    if path == "/" {
        return "/";
    }
    match path.rfind('/') {
        None => ".",
        Some(0) => "/",
        Some(i) => &path[..i],
    }
}

/// Returns `true` if the watch root adds no prefix to listing paths.
///
/// A root of `.`, `/`, `./`, or the empty string matches listing paths
/// directly; any other root prefixes them.
#[must_use]
pub fn is_bare_root(root: &str) -> bool {
    matches!(root, "." | "/" | "./" | "")
}

/// Derives the filename relative to the watch root.
///
/// For a bare root (see [`is_bare_root`]) the listing path is returned
/// unchanged; otherwise `root + "/"` is stripped from the front.
///
/// # Examples
///
/// ```
/// use rfs_core::path::relative_filename;
///
/// assert_eq!(relative_filename("/data", "/data/a/b.txt"), "a/b.txt");
/// assert_eq!(relative_filename("/", "/a.txt"), "/a.txt");
/// assert_eq!(relative_filename(".", "a.txt"), "a.txt");
/// ```
#[must_use]
pub fn relative_filename<'a>(root: &str, uri: &'a str) -> &'a str {
    if is_bare_root(root) {
        return uri;
    }
    uri.strip_prefix(root)
        .map_or(uri, |rest| rest.strip_prefix('/').unwrap_or(rest))
}
