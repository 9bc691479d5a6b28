use std::sync::Arc;
use tracing::info;

use crate::config::ScanConfig;
use crate::counter::FileCounter;
use crate::errors::ScanResult;
use crate::event_loop::EventLoop;
use crate::extractor::{Extractor, ScanTargets};
use crate::progress::{ProgressReporter, StatusSink};
use crate::report::ReportFormat;
use crate::worker::ScanWorker;

/// Runs one complete scan from the calling thread.
///
/// Patterns are compiled up front, so configuration errors are returned
/// before any thread starts. The scan itself runs on a worker while this
/// thread drives an event loop that animates `status` and, once the worker
/// is done, invokes `on_report` with the formatted lines and the final file
/// counter. Returns after `on_report` has run, or after the status was
/// cleared if the worker died.
pub fn run_scan<F>(
    config: &ScanConfig,
    targets: ScanTargets,
    format: ReportFormat,
    status: Arc<dyn StatusSink>,
    on_report: F,
) -> ScanResult<()>
where
    F: FnOnce(Vec<String>, FileCounter) + Send + 'static,
{
    let mut event_loop = EventLoop::new();
    let extractor = Extractor::new(config, targets, FileCounter::new())?;
    info!(
        "Starting scan for tags: {:?}",
        extractor.tags().collect::<Vec<_>>()
    );

    let worker = ScanWorker::spawn(extractor, format, event_loop.handle(), on_report)?;
    ProgressReporter::new(
        worker,
        status,
        config.progress_message.as_str(),
        config.success_message.as_str(),
    )
    .start(event_loop.handle());

    event_loop.run_until_idle();
    Ok(())
}
