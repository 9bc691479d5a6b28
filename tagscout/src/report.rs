use itertools::Itertools;
use tracing::warn;

use crate::results::MatchRecord;

/// How the worker renders the records it collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Grouped task list, one header per tag
    #[default]
    Text,
    /// One JSON object per record, in report order
    JsonLines,
}

impl ReportFormat {
    pub fn render<I>(self, records: I) -> Vec<String>
    where
        I: IntoIterator<Item = MatchRecord>,
    {
        match self {
            ReportFormat::Text => format_report(records).collect(),
            ReportFormat::JsonLines => format_json_lines(records),
        }
    }
}

/// Sorts records by tag, keeping discovery order within a tag, and groups them
pub fn group_by_tag<I>(records: I) -> Vec<(String, Vec<MatchRecord>)>
where
    I: IntoIterator<Item = MatchRecord>,
{
    let mut records: Vec<_> = records.into_iter().collect();
    records.sort_by(|a, b| a.tag().cmp(b.tag()));

    records
        .into_iter()
        .group_by(|r| r.found.tag.clone())
        .into_iter()
        .map(|(tag, members)| (tag, members.collect::<Vec<_>>()))
        .collect()
}

/// Renders the task report.
///
/// Every group starts with a blank line and a `TAG (count)` header, followed
/// by one checkbox line per record:
///
/// ```text
///
/// TODO (1)
///   ☐ .\a.txt:1" fix bug"
/// ```
pub fn format_report<I>(records: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = MatchRecord>,
{
    group_by_tag(records)
        .into_iter()
        .flat_map(|(tag, members)| {
            let header = format!("\n{} ({})", tag.to_uppercase(), members.len());
            std::iter::once(header).chain(members.into_iter().map(|r| format_line(&r)))
        })
}

/// One report line for a record
pub fn format_line(record: &MatchRecord) -> String {
    format!(
        "  ☐ .\\{}:{}\"{}\"",
        record.basename(),
        record.linenum,
        record.found.message
    )
}

/// Records serialized one per line, sorted the same way as the text report
pub fn format_json_lines<I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = MatchRecord>,
{
    group_by_tag(records)
        .into_iter()
        .flat_map(|(_, members)| members)
        .filter_map(|record| match serde_json::to_string(&record) {
            Ok(line) => Some(line),
            Err(e) => {
                warn!("Failed to serialize record from {}: {}", record.filepath.display(), e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(file: &str, line: usize, tag: &str, msg: &str) -> MatchRecord {
        MatchRecord::new(format!("/project/src/{}", file), line, tag, msg)
    }

    #[test]
    fn test_groups_sorted_by_tag() {
        let records = vec![
            record("a.rs", 1, "todo", " one"),
            record("b.rs", 2, "fixme", " leak"),
            record("a.rs", 5, "todo", " two"),
            record("c.rs", 9, "todo", " three"),
        ];

        let lines: Vec<String> = format_report(records).collect();
        assert_eq!(
            lines,
            vec![
                "\nFIXME (1)".to_string(),
                "  ☐ .\\b.rs:2\" leak\"".to_string(),
                "\nTODO (3)".to_string(),
                "  ☐ .\\a.rs:1\" one\"".to_string(),
                "  ☐ .\\a.rs:5\" two\"".to_string(),
                "  ☐ .\\c.rs:9\" three\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_header_counts() {
        let mut records: Vec<_> = (1..=3)
            .map(|i| record("x.rs", i, "todo", " t"))
            .collect();
        records.push(record("y.rs", 4, "fixme", " f"));

        let lines: Vec<String> = format_report(records).collect();
        let headers: Vec<_> = lines.iter().filter(|l| l.starts_with('\n')).collect();
        assert_eq!(headers, vec!["\nFIXME (1)", "\nTODO (3)"]);
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_stable_within_tag() {
        let records = vec![
            record("z.rs", 10, "note", " first"),
            record("a.rs", 1, "note", " second"),
        ];
        let groups = group_by_tag(records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].1[0].found.message, " first");
        assert_eq!(groups[0].1[1].found.message, " second");
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        assert_eq!(format_report(Vec::new()).count(), 0);
        assert!(ReportFormat::JsonLines.render(Vec::new()).is_empty());
    }

    #[test]
    fn test_json_lines_follow_report_order() {
        let records = vec![
            record("a.rs", 1, "todo", " later"),
            record("b.rs", 2, "fixme", " sooner"),
        ];

        let lines = ReportFormat::JsonLines.render(records);
        assert_eq!(lines.len(), 2);
        let first: MatchRecord = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first.tag(), "fixme");
        assert_eq!(first.linenum, 2);
    }
}
