/// Error types for tagscout.
///
/// Only configuration problems are errors here. A file that cannot be read or
/// decoded is not an error at all: the extractor counts it, logs it and moves
/// on, so the types below describe failures that abort a scan before the
/// background worker is ever started.
///
/// ```rust,ignore
/// match Extractor::new(&config, targets, counter) {
///     Ok(extractor) => // hand it to a ScanWorker,
///     Err(ScanError::InvalidPattern { pattern, .. }) => // report the bad regex,
///     Err(e) => // other configuration problem
/// }
/// ```
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while preparing or running a scan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ScanError {
    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source: Box::new(source),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

/// Most symlinks followed while resolving one path
const MAX_LINK_HOPS: usize = 40;

/// Resolves `original` to an absolute, symlink-free path.
///
/// Existing paths are canonicalized. Anything else (a dangling symlink, a
/// file that vanished) is resolved component by component: every link that
/// can be read is followed, and components that do not exist are kept as
/// they are. Two dangling links to the same missing target therefore unify
/// to the same path.
pub fn unify_path(original: &Path) -> PathBuf {
    match original.canonicalize() {
        Ok(canonical) => strip_unc_prefix(&canonical),
        Err(_) => {
            let absolute =
                std::path::absolute(original).unwrap_or_else(|_| original.to_path_buf());
            strip_unc_prefix(&resolve_links(&absolute))
        }
    }
}

/// Follows symlinks through `path` without requiring its target to exist
fn resolve_links(path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    let mut pending = Vec::new();
    push_components(&mut pending, &mut resolved, path);

    let mut hops = 0;
    while let Some(part) = pending.pop() {
        if part == ".." {
            resolved.pop();
            continue;
        }

        let candidate = resolved.join(&part);
        match fs::read_link(&candidate) {
            Ok(target) if hops < MAX_LINK_HOPS => {
                hops += 1;
                push_components(&mut pending, &mut resolved, &target);
            }
            _ => resolved = candidate,
        }
    }
    resolved
}

/// Queues the components of `path` so they pop in order. A rooted path
/// restarts resolution from its root.
fn push_components(pending: &mut Vec<OsString>, resolved: &mut PathBuf, path: &Path) {
    if path.has_root() {
        if let Some(root) = path.ancestors().last() {
            *resolved = root.to_path_buf();
        }
    }
    let parts: Vec<OsString> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_os_string()),
            Component::ParentDir => Some(OsString::from("..")),
            _ => None,
        })
        .collect();
    pending.extend(parts.into_iter().rev());
}

/// Strips the Windows UNC prefix (\\?\) from a path if present
fn strip_unc_prefix(p: &Path) -> PathBuf {
    let s = p.display().to_string();
    if let Some(stripped) = s.strip_prefix(r"\\?\") {
        PathBuf::from(stripped)
    } else {
        p.to_path_buf()
    }
}
