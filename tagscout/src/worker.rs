use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{info, warn};

use crate::counter::FileCounter;
use crate::errors::ScanResult;
use crate::event_loop::LoopHandle;
use crate::extractor::Extractor;
use crate::report::ReportFormat;

/// Runs a scan on its own thread and hands the finished report back to the
/// caller's event loop.
///
/// The worker extracts, then formats, then posts `callback(lines, counter)`
/// to the loop. The callback runs exactly once, on the loop's thread, with
/// the complete report. Nothing is streamed.
pub struct ScanWorker;

impl ScanWorker {
    pub fn spawn<F>(
        extractor: Extractor,
        format: ReportFormat,
        loop_handle: LoopHandle,
        callback: F,
    ) -> ScanResult<ScanHandle>
    where
        F: FnOnce(Vec<String>, FileCounter) + Send + 'static,
    {
        let counter = extractor.counter().clone();
        let cancel = extractor.cancel_flag();

        let thread = thread::Builder::new()
            .name("tagscout-scan".to_string())
            .spawn(move || {
                let started = Instant::now();
                let lines = format.render(extractor.extract());
                let counter = extractor.counter().clone();
                info!(
                    "Scan complete. {} report lines from {} files in {:?}",
                    lines.len(),
                    counter,
                    started.elapsed()
                );

                let delivered = !lines.is_empty();
                loop_handle.post(move || callback(lines, counter));
                delivered
            })?;

        Ok(ScanHandle {
            thread,
            counter,
            cancel,
        })
    }
}

/// Caller-side view of a running scan
#[derive(Debug)]
pub struct ScanHandle {
    thread: JoinHandle<bool>,
    counter: FileCounter,
    cancel: Arc<AtomicBool>,
}

impl ScanHandle {
    /// Wraps an already running thread. The thread's return value says
    /// whether it delivered a non-empty result.
    pub fn from_thread(thread: JoinHandle<bool>, counter: FileCounter) -> Self {
        Self {
            thread,
            counter,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Live count of files scanned so far
    pub fn counter(&self) -> &FileCounter {
        &self.counter
    }

    /// Asks the worker to stop before its next file
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Waits for the worker and reports whether it delivered a non-empty
    /// result. A worker that panicked delivered nothing.
    pub fn join(self) -> bool {
        match self.thread.join() {
            Ok(delivered) => delivered,
            Err(_) => {
                warn!("Scan worker terminated without producing a result");
                false
            }
        }
    }
}
