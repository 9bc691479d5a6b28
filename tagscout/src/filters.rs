/// File exclusion for the scan pipeline.
///
/// Exclusions are plain regular expressions searched anywhere inside the
/// path string. Shell-style globs from the configuration are translated
/// first with [`translate_glob`], which anchors only the end of the pattern,
/// so `*.log` drops every path ending in `.log` and `build/out.txt` drops
/// any path ending with that suffix, whatever the directory prefix.
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::errors::{ScanError, ScanResult};

/// Drops paths matching any of a list of exclusion regexes
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    excludes: Vec<Regex>,
}

impl PathFilter {
    /// Compiles each exclusion pattern once
    pub fn new<I, S>(patterns: I) -> ScanResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excludes = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|e| ScanError::invalid_pattern(pattern, e))
            })
            .collect::<ScanResult<Vec<_>>>()?;
        Ok(Self { excludes })
    }

    /// Checks whether any exclusion matches somewhere in the path
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.excludes.iter().any(|re| re.is_match(&path_str))
    }

    /// Lazily yields the paths that survive the exclusions, in input order
    pub fn filter<'a, I>(&'a self, paths: I) -> impl Iterator<Item = PathBuf> + 'a
    where
        I: IntoIterator<Item = PathBuf>,
        I::IntoIter: 'a,
    {
        paths.into_iter().filter(move |path| !self.is_excluded(path))
    }
}

/// Translates a shell-style glob into an equivalent regex string.
///
/// `*` matches any run of characters (separators included), `?` a single
/// character, and `[seq]` / `[!seq]` a character class. A `[` without a
/// closing bracket is taken literally.
pub fn translate_glob(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::with_capacity(glob.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '*' => {
                while chars.get(i) == Some(&'*') {
                    i += 1;
                }
                out.push_str(".*");
            }
            '?' => out.push('.'),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push_str(&translate_class(&chars[i..end]));
                    i = end + 1;
                }
                None => out.push_str(r"\["),
            },
            _ => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }

    format!(r"(?s:{out})\z")
}

/// Index of the `]` closing a class whose body starts at `start`
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    // a leading `]` is part of the class
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    while j < chars.len() && chars[j] != ']' {
        j += 1;
    }
    (j < chars.len()).then_some(j)
}

fn translate_class(body: &[char]) -> String {
    let (negated, body) = match body.split_first() {
        Some(('!', rest)) => (true, rest),
        _ => (false, body),
    };

    let mut class = String::from("[");
    if negated {
        class.push('^');
    }
    for &c in body {
        if matches!(c, '\\' | '[' | ']' | '&' | '~' | '^') {
            class.push('\\');
        }
        class.push(c);
    }
    class.push(']');
    class
}
