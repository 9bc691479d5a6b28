use config::{Config as ConfigBuilder, File};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{ScanError, ScanResult};
use crate::filters::translate_glob;

/// Settings for one scan invocation.
///
/// # Configuration Locations
///
/// Loaded from up to three YAML files, later ones overriding earlier ones:
/// 1. Global `$HOME/.config/tagscout/config.yaml`
/// 2. Local `.tagscout.yaml` in the current directory
/// 3. Custom config file specified via `--config` (must exist)
///
/// Every field has a default, so an empty configuration scans for the
/// built-in TODO/FIXME/XXX/NOTE tags.
///
/// # Configuration Format
///
/// ```yaml
/// # Tag patterns. Each regex must define a named group; the group name is
/// # the tag reported for whatever it captures.
/// patterns:
///   todo: "TODO[\\s]*?:+(?P<todo>.*)$"
///   hack: "HACK:(?P<hack>.*)$"
///
/// # Directory names pruned from the walk
/// folder_exclude_patterns: [".git", "node_modules"]
///
/// # File globs excluded from scanning
/// file_exclude_patterns: ["*.min.js"]
/// binary_file_patterns: ["*.png", "*.zip"]
///
/// case_sensitive: false
/// log_level: "warn"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Tag name to regex, joined with `|` in declaration order into one
    /// combined pattern. Earlier patterns win when two match at the same spot.
    pub patterns: IndexMap<String, String>,

    /// Bare directory names that are never descended into
    pub folder_exclude_patterns: Vec<String>,

    /// Glob patterns for files to skip
    pub file_exclude_patterns: Vec<String>,

    /// Glob patterns for binary files to skip, kept apart so users can
    /// override one list without repeating the other
    pub binary_file_patterns: Vec<String>,

    /// Whether tag patterns are matched case-sensitively
    pub case_sensitive: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Status text shown while the scan runs
    pub progress_message: String,

    /// Status text shown once the scan delivered a report
    pub success_message: String,
}

fn default_patterns() -> IndexMap<String, String> {
    [
        ("fixme", r"FIX ?ME[\s]*?:+(?P<fixme>.*)$"),
        ("note", r"NOTE[\s]*?:+(?P<note>.*)$"),
        ("todo", r"TODO(?:[\s]*?\([^)]*\))?[\s]*?:+(?P<todo>.*)$"),
        ("xxx", r"XXX[\s]*?:+(?P<xxx>.*)$"),
    ]
    .into_iter()
    .map(|(tag, pattern)| (tag.to_string(), pattern.to_string()))
    .collect()
}

fn default_folder_excludes() -> Vec<String> {
    [".git", ".svn", ".hg", "CVS", "node_modules", "target"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_binary_patterns() -> Vec<String> {
    [
        "*.jpg", "*.jpeg", "*.png", "*.gif", "*.ttf", "*.tga", "*.dds", "*.ico", "*.eot",
        "*.pdf", "*.swf", "*.jar", "*.zip", "*.gz", "*.7z", "*.exe", "*.dll", "*.so",
        "*.dylib", "*.o", "*.obj", "*.class", "*.pyc",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
            folder_exclude_patterns: default_folder_excludes(),
            file_exclude_patterns: Vec::new(),
            binary_file_patterns: default_binary_patterns(),
            case_sensitive: false,
            log_level: "warn".to_string(),
            progress_message: "Finding TODOs".to_string(),
            success_message: String::new(),
        }
    }
}

/// Values supplied on the command line, applied on top of the file config
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Replaces the configured patterns when non-empty
    pub patterns: IndexMap<String, String>,
    /// Appended to `folder_exclude_patterns`
    pub exclude_dirs: Vec<String>,
    /// Appended to `file_exclude_patterns`
    pub exclude_files: Vec<String>,
    pub case_sensitive: bool,
    pub log_level: Option<String>,
}

impl ScanConfig {
    /// Loads configuration, layering `config_path` over the default locations
    pub fn load_from(config_path: Option<&Path>) -> ScanResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let default_files = [
            dirs::config_dir().map(|p| p.join("tagscout/config.yaml")),
            Some(PathBuf::from(".tagscout.yaml")),
        ];
        for path in default_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ScanError::config_error(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if !cli.patterns.is_empty() {
            self.patterns = cli.patterns;
        }
        self.folder_exclude_patterns.extend(cli.exclude_dirs);
        self.file_exclude_patterns.extend(cli.exclude_files);
        if cli.case_sensitive {
            self.case_sensitive = true;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }

    /// File and binary globs translated into the regexes the path filter uses
    pub fn exclusion_regexes(&self) -> Vec<String> {
        self.file_exclude_patterns
            .iter()
            .chain(&self.binary_file_patterns)
            .map(|glob| translate_glob(glob))
            .collect()
    }

    /// Tag patterns joined into one alternation, in declaration order
    pub fn combined_pattern(&self) -> String {
        self.patterns
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("|")
    }
}
