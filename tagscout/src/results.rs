use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One tagged hit: the named group that matched and the text it captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Name of the capture group, e.g. `todo`
    pub tag: String,
    /// Text captured by the group
    pub message: String,
}

/// A match located in a file, as produced by the extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Canonical path of the scanned file
    pub filepath: PathBuf,
    /// 1-based line number
    pub linenum: usize,
    #[serde(rename = "match")]
    pub found: Match,
}

impl MatchRecord {
    pub fn new(
        filepath: impl Into<PathBuf>,
        linenum: usize,
        tag: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            filepath: filepath.into(),
            linenum,
            found: Match {
                tag: tag.into(),
                message: message.into(),
            },
        }
    }

    pub fn tag(&self) -> &str {
        &self.found.tag
    }

    /// File name with the directory stripped
    pub fn basename(&self) -> String {
        self.filepath
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.filepath.display().to_string())
    }

    pub fn path(&self) -> &Path {
        &self.filepath
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creation() {
        let record = MatchRecord::new("/src/lib.rs", 42, "todo", " wire up config");

        assert_eq!(record.linenum, 42);
        assert_eq!(record.tag(), "todo");
        assert_eq!(record.found.message, " wire up config");
        assert_eq!(record.path(), Path::new("/src/lib.rs"));
        assert_eq!(record.basename(), "lib.rs");
    }

    #[test]
    fn test_record_serializes_match_field() {
        let record = MatchRecord::new("/a.txt", 1, "fixme", " leak");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["linenum"], 1);
        assert_eq!(json["match"]["tag"], "fixme");
        assert_eq!(json["match"]["message"], " leak");
    }
}
