use ignore::{DirEntry, Walk, WalkBuilder};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::errors::unify_path;

/// Lazy, deduplicating sequence of candidate files.
///
/// Explicit files come first, in the order given, followed by every file
/// found beneath each root directory. Subdirectories whose bare name is in
/// the exclusion set are pruned before the walk descends into them. Each
/// yielded path is canonical, and a single seen-set spans the whole
/// enumeration, so a file named explicitly and also reached through a walk
/// is produced once.
///
/// The sequence is single-pass: build a new enumerator to scan again.
pub struct PathEnumerator {
    explicit: std::vec::IntoIter<PathBuf>,
    roots: std::vec::IntoIter<PathBuf>,
    excluded_dirs: Arc<HashSet<OsString>>,
    walk: Option<Walk>,
    seen: HashSet<PathBuf>,
}

impl PathEnumerator {
    pub fn new<I, S>(explicit_paths: Vec<PathBuf>, root_dirs: Vec<PathBuf>, excluded_dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            explicit: explicit_paths.into_iter(),
            roots: root_dirs.into_iter(),
            excluded_dirs: Arc::new(excluded_dirs.into_iter().map(Into::into).collect()),
            walk: None,
            seen: HashSet::new(),
        }
    }

    fn walk_root(&self, root: &Path) -> Walk {
        let excluded = Arc::clone(&self.excluded_dirs);
        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                !(entry.depth() > 0 && is_dir && excluded.contains(entry.file_name()))
            });
        builder.build()
    }

    /// Canonicalizes `path`, returning it only the first time it is seen
    fn first_visit(&mut self, path: &Path) -> Option<PathBuf> {
        let canonical = unify_path(path);
        if self.seen.insert(canonical.clone()) {
            Some(canonical)
        } else {
            debug!("Already enumerated: {}", canonical.display());
            None
        }
    }
}

impl Iterator for PathEnumerator {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        while let Some(path) = self.explicit.next() {
            if let Some(canonical) = self.first_visit(&path) {
                return Some(canonical);
            }
        }

        loop {
            if self.walk.is_none() {
                let root = self.roots.next()?;
                let root = std::path::absolute(&root).unwrap_or(root);
                debug!("Walking {}", root.display());
                self.walk = Some(self.walk_root(&root));
            }

            let entry = match self.walk.as_mut().and_then(|walk| walk.next()) {
                None => {
                    self.walk = None;
                    continue;
                }
                Some(Err(err)) => {
                    debug!("Skipping unreadable entry: {}", err);
                    continue;
                }
                Some(Ok(entry)) => entry,
            };

            if is_walked_file(&entry) {
                if let Some(canonical) = self.first_visit(entry.path()) {
                    return Some(canonical);
                }
            }
        }
    }
}

/// Regular files, links to files and dangling links are scanned. Symlinked
/// directories are listed by the walk but never followed.
fn is_walked_file(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    match entry.file_type() {
        Some(ft) if ft.is_file() => true,
        Some(ft) if ft.is_symlink() => !entry.path().is_dir(),
        _ => false,
    }
}
