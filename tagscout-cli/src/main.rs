use anyhow::{anyhow, Context};
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};
use tagscout::{
    run_scan, CliOverrides, FileCounter, IndicatifStatus, NullStatus, ReportFormat, ScanConfig,
    ScanTargets, StatusSink,
};
use tracing::debug;

type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(author, version, about = "Collect TODO/FIXME style tags into a task report", long_about = None)]
struct Cli {
    /// Files and directories to scan
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Configuration file layered over the global and local ones
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tag pattern as TAG=REGEX; the regex must define a group named TAG
    /// (can be specified multiple times, replaces configured patterns)
    #[arg(short = 'p', long = "pattern", value_parser = parse_tag_pattern)]
    patterns: Vec<(String, String)>,

    /// Directory name to skip while walking (can be specified multiple times)
    #[arg(short = 'x', long = "exclude-dir")]
    exclude_dirs: Vec<String>,

    /// File glob to skip (can be specified multiple times)
    #[arg(short = 'e', long = "exclude-file")]
    exclude_files: Vec<String>,

    /// Match tag patterns case-sensitively
    #[arg(short = 's', long)]
    case_sensitive: bool,

    /// Scan only the files named on the command line, ignoring directories
    #[arg(long)]
    files_only: bool,

    /// Print one JSON object per match instead of the grouped report
    #[arg(long)]
    json: bool,

    /// Insert the report into FILE before the 1-based LINE instead of printing it
    #[arg(long, value_name = "FILE:LINE", value_parser = parse_insert_target)]
    insert: Option<(PathBuf, usize)>,

    /// Hide the progress line
    #[arg(short, long)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_tag_pattern(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((tag, regex)) if !tag.is_empty() && !regex.is_empty() => {
            Ok((tag.to_string(), regex.to_string()))
        }
        _ => Err(format!("expected TAG=REGEX, got '{}'", s)),
    }
}

fn parse_insert_target(s: &str) -> std::result::Result<(PathBuf, usize), String> {
    let (file, line) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected FILE:LINE, got '{}'", s))?;
    let line: usize = line
        .parse()
        .map_err(|e| format!("invalid line number '{}': {}", line, e))?;
    if file.is_empty() || line == 0 {
        return Err(format!("expected FILE:LINE with LINE >= 1, got '{}'", s));
    }
    Ok((PathBuf::from(file), line))
}

fn init_tracing(default_level: &str) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = ScanConfig::load_from(cli.config.as_deref())?.merge_with_cli(CliOverrides {
        patterns: cli.patterns.into_iter().collect(),
        exclude_dirs: cli.exclude_dirs,
        exclude_files: cli.exclude_files,
        case_sensitive: cli.case_sensitive,
        log_level: cli.log_level,
    });
    init_tracing(&config.log_level);

    let mut targets = ScanTargets::from_paths(cli.paths);
    if cli.files_only {
        debug!("Ignoring {} directory arguments", targets.dirs.len());
        targets.dirs.clear();
    }

    let format = if cli.json {
        ReportFormat::JsonLines
    } else {
        ReportFormat::Text
    };
    let status: Arc<dyn StatusSink> = if cli.quiet {
        Arc::new(NullStatus)
    } else {
        Arc::new(IndicatifStatus::new())
    };

    let report: Arc<Mutex<Option<(Vec<String>, FileCounter)>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&report);
    run_scan(&config, targets, format, status, move |lines, counter| {
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some((lines, counter));
    })?;

    let (lines, counter) = report
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
        .ok_or_else(|| anyhow!("scan worker terminated without a report"))?;

    match cli.insert {
        Some((file, line)) => {
            let contents = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            fs::write(&file, insert_lines(&contents, line, &lines))
                .with_context(|| format!("failed to write {}", file.display()))?;
            eprintln!(
                "{} {} report lines into {}",
                "Inserted".green(),
                lines.len(),
                file.display()
            );
        }
        None => print_report(&lines),
    }

    eprintln!("{} files scanned", counter.read());
    Ok(())
}

fn print_report(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

/// Returns `contents` with `report` inserted before the 1-based `line`.
/// A line past the end appends the report.
fn insert_lines(contents: &str, line: usize, report: &[String]) -> String {
    if report.is_empty() {
        return contents.to_string();
    }

    let mut block = report.join("\n");
    block.push('\n');

    let mut existing = contents.split_inclusive('\n');
    let mut out = String::with_capacity(contents.len() + block.len() + 1);
    for _ in 1..line {
        match existing.next() {
            Some(l) => out.push_str(l),
            None => break,
        }
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&block);
    out.extend(existing);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> Vec<String> {
        vec!["\nTODO (1)".to_string(), "  ☐ .\\a.txt:1\" x\"".to_string()]
    }

    #[test]
    fn test_insert_before_line() {
        let result = insert_lines("one\ntwo\nthree\n", 2, &report());
        assert_eq!(result, "one\n\nTODO (1)\n  ☐ .\\a.txt:1\" x\"\ntwo\nthree\n");
    }

    #[test]
    fn test_insert_at_first_line() {
        let result = insert_lines("one\n", 1, &report());
        assert_eq!(result, "\nTODO (1)\n  ☐ .\\a.txt:1\" x\"\none\n");
    }

    #[test]
    fn test_insert_past_end_appends() {
        let result = insert_lines("one\ntwo", 10, &report());
        assert_eq!(result, "one\ntwo\n\nTODO (1)\n  ☐ .\\a.txt:1\" x\"\n");
    }

    #[test]
    fn test_insert_empty_report_is_noop() {
        assert_eq!(insert_lines("one\n", 1, &[]), "one\n");
    }

    #[test]
    fn test_parse_tag_pattern() {
        assert_eq!(
            parse_tag_pattern("hack=HACK:(?P<hack>.*)").unwrap(),
            ("hack".to_string(), "HACK:(?P<hack>.*)".to_string())
        );
        // only the first '=' separates the tag
        assert_eq!(parse_tag_pattern("eq=a=(?P<eq>b)").unwrap().1, "a=(?P<eq>b)");
        assert!(parse_tag_pattern("no-separator").is_err());
        assert!(parse_tag_pattern("=regex").is_err());
    }

    #[test]
    fn test_parse_insert_target() {
        assert_eq!(
            parse_insert_target("notes/tasks.md:3").unwrap(),
            (PathBuf::from("notes/tasks.md"), 3)
        );
        assert!(parse_insert_target("tasks.md").is_err());
        assert!(parse_insert_target("tasks.md:0").is_err());
        assert!(parse_insert_target("tasks.md:x").is_err());
    }
}
