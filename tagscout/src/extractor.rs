use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::config::ScanConfig;
use crate::counter::FileCounter;
use crate::errors::{ScanError, ScanResult};
use crate::filters::PathFilter;
use crate::results::MatchRecord;
use crate::walker::PathEnumerator;

/// Where to look: files named explicitly plus directories to recurse into
#[derive(Debug, Clone, Default)]
pub struct ScanTargets {
    pub files: Vec<PathBuf>,
    pub dirs: Vec<PathBuf>,
}

impl ScanTargets {
    pub fn new(files: Vec<PathBuf>, dirs: Vec<PathBuf>) -> Self {
        Self { files, dirs }
    }

    /// Sorts mixed command-line paths into files and directories
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let (dirs, files): (Vec<PathBuf>, Vec<PathBuf>) =
            paths.into_iter().partition(|p| p.is_dir());
        Self { files, dirs }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }
}

/// Pulls tagged messages out of every candidate file.
///
/// All tag patterns are alternated into one regex so each line is scanned
/// once. Every named group in that regex is a tag: when a group captures
/// non-empty text the extractor emits a [`MatchRecord`] carrying the group
/// name, the captured text, the file and the 1-based line number.
///
/// Files that cannot be opened or are not valid UTF-8 are skipped without
/// producing records. Either way the file counter goes up by exactly one for
/// every path that reaches the read step.
#[derive(Debug)]
pub struct Extractor {
    pattern: Regex,
    /// (group index, group name) for every named group, in definition order
    groups: Vec<(usize, String)>,
    targets: ScanTargets,
    ignored_dirs: Vec<String>,
    filter: PathFilter,
    counter: FileCounter,
    cancelled: Arc<AtomicBool>,
}

impl Extractor {
    /// Compiles the combined tag pattern and the exclusion filter.
    ///
    /// Fails with [`ScanError::InvalidPattern`] if any configured regex is
    /// malformed, so a bad configuration never reaches the worker.
    pub fn new(config: &ScanConfig, targets: ScanTargets, counter: FileCounter) -> ScanResult<Self> {
        if config.patterns.is_empty() {
            return Err(ScanError::config_error("no tag patterns configured"));
        }

        let combined = config.combined_pattern();
        let pattern = RegexBuilder::new(&combined)
            .case_insensitive(!config.case_sensitive)
            .build()
            .map_err(|e| ScanError::invalid_pattern(&combined, e))?;

        let groups: Vec<(usize, String)> = pattern
            .capture_names()
            .enumerate()
            .filter_map(|(index, name)| name.map(|n| (index, n.to_string())))
            .collect();
        if groups.is_empty() {
            warn!("Tag patterns define no named groups, the report will be empty");
        }

        let filter = PathFilter::new(config.exclusion_regexes())?;

        Ok(Self {
            pattern,
            groups,
            targets,
            ignored_dirs: config.folder_exclude_patterns.clone(),
            filter,
            counter,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn counter(&self) -> &FileCounter {
        &self.counter
    }

    /// Flag that stops extraction before the next file once set
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Tag names in the order their groups appear in the combined pattern
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(_, name)| name.as_str())
    }

    /// Filtered, deduplicated paths that will be read
    pub fn search_targets(&self) -> impl Iterator<Item = PathBuf> + '_ {
        let paths = PathEnumerator::new(
            self.targets.files.clone(),
            self.targets.dirs.clone(),
            self.ignored_dirs.iter().cloned(),
        );
        self.filter.filter(paths)
    }

    /// Lazily extracts records, one file at a time.
    ///
    /// Within a file, records come out in line order and left to right within
    /// a line. Across files the order follows the walk.
    pub fn extract(&self) -> impl Iterator<Item = MatchRecord> + '_ {
        self.search_targets()
            .take_while(move |_| {
                let cancelled = self.cancelled.load(Ordering::Relaxed);
                if cancelled {
                    debug!("Extraction cancelled");
                }
                !cancelled
            })
            .flat_map(move |path| self.extract_file(&path))
    }

    fn extract_file(&self, path: &Path) -> Vec<MatchRecord> {
        trace!("Scanning {}", path.display());
        let records = match fs::read_to_string(path) {
            Ok(contents) => self.scan_text(path, &contents),
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                Vec::new()
            }
        };
        self.counter.increment();
        records
    }

    /// Applies the combined pattern to every line of `contents`
    pub fn scan_text(&self, path: &Path, contents: &str) -> Vec<MatchRecord> {
        let mut records = Vec::new();
        for (index, line) in split_lines(contents).enumerate() {
            for caps in self.pattern.captures_iter(line) {
                for (group, tag) in &self.groups {
                    if let Some(m) = caps.get(*group).filter(|m| !m.as_str().is_empty()) {
                        records.push(MatchRecord::new(path, index + 1, tag.as_str(), m.as_str()));
                    }
                }
            }
        }
        records
    }
}

/// Splits on `\n`, `\r\n` and a lone `\r`. A trailing terminator does not
/// start an extra empty line.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let (line, next) = match rest.find(|c: char| c == '\r' || c == '\n') {
            Some(end) if rest[end..].starts_with("\r\n") => (&rest[..end], &rest[end + 2..]),
            Some(end) => (&rest[..end], &rest[end + 1..]),
            None => (rest, ""),
        };
        rest = next;
        Some(line)
    })
}
