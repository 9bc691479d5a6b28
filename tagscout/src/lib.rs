pub mod config;
pub mod counter;
pub mod errors;
pub mod event_loop;
pub mod extractor;
pub mod filters;
pub mod progress;
pub mod report;
pub mod results;
pub mod scan;
pub mod walker;
pub mod worker;

pub use config::{CliOverrides, ScanConfig};
pub use counter::FileCounter;
pub use errors::{ScanError, ScanResult};
pub use event_loop::{EventLoop, LoopHandle};
pub use extractor::{Extractor, ScanTargets};
pub use filters::{translate_glob, PathFilter};
pub use progress::{IndicatifStatus, NullStatus, ProgressReporter, StatusSink};
pub use report::{format_report, ReportFormat};
pub use results::{Match, MatchRecord};
pub use scan::run_scan;
pub use walker::PathEnumerator;
pub use worker::{ScanHandle, ScanWorker};
