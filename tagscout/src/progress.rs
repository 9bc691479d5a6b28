//! Status-line animation while a scan runs.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

use crate::event_loop::LoopHandle;
use crate::worker::ScanHandle;

/// Delay between progress polls
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Width of the bouncing indicator window
const WINDOW: usize = 8;

/// Write-only status line owned by the host
pub trait StatusSink: Send + Sync {
    /// Replaces the current status text
    fn set_status(&self, message: &str);

    /// Removes the status text
    fn clear(&self) {
        self.set_status("");
    }

    /// Shows the final status once the scan is over
    fn finish(&self, message: &str) {
        self.set_status(message);
    }
}

/// Status line drawn as an `indicatif` spinner on stderr
pub struct IndicatifStatus {
    bar: ProgressBar,
}

impl IndicatifStatus {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { bar }
    }
}

impl Default for IndicatifStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for IndicatifStatus {
    fn set_status(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn clear(&self) {
        self.bar.finish_and_clear();
    }

    fn finish(&self, message: &str) {
        if message.is_empty() {
            self.bar.finish_and_clear();
        } else {
            self.bar.finish_with_message(message.to_string());
        }
    }
}

/// Discards every status update
#[derive(Debug, Default)]
pub struct NullStatus;

impl StatusSink for NullStatus {
    fn set_status(&self, _message: &str) {}
}

/// Reporter lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    Running,
    Done,
}

/// Polls a scan worker from the caller's event loop.
///
/// Every [`TICK_INTERVAL`] it checks whether the worker is still alive. While
/// it is, the status shows an indicator bouncing across an eight-wide window
/// and the live file count. Once the worker is gone the status becomes the
/// success message if a non-empty report was delivered, and is cleared
/// otherwise. No tick is scheduled after that.
pub struct ProgressReporter {
    worker: Option<ScanHandle>,
    sink: Arc<dyn StatusSink>,
    message: String,
    success_message: String,
    position: usize,
    forward: bool,
    state: ReporterState,
}

impl ProgressReporter {
    pub fn new(
        worker: ScanHandle,
        sink: Arc<dyn StatusSink>,
        message: impl Into<String>,
        success_message: impl Into<String>,
    ) -> Self {
        Self {
            worker: Some(worker),
            sink,
            message: message.into(),
            success_message: success_message.into(),
            position: 0,
            forward: true,
            state: ReporterState::Running,
        }
    }

    /// Schedules the first poll one interval from now
    pub fn start(self, loop_handle: LoopHandle) {
        let next = loop_handle.clone();
        loop_handle.set_timeout(TICK_INTERVAL, move || self.run(next));
    }

    fn run(mut self, loop_handle: LoopHandle) {
        if self.tick() == ReporterState::Running {
            let next = loop_handle.clone();
            loop_handle.set_timeout(TICK_INTERVAL, move || self.run(next));
        }
    }

    /// One poll of the worker. Returns the state after the poll.
    pub fn tick(&mut self) -> ReporterState {
        let Some(worker) = self.worker.take() else {
            return self.state;
        };

        if !worker.is_alive() {
            if worker.join() {
                self.sink.finish(&self.success_message);
            } else {
                self.sink.clear();
            }
            trace!("Progress reporter done");
            self.state = ReporterState::Done;
            return self.state;
        }

        let frame = progress_frame(&self.message, self.position, worker.counter().read());
        self.sink.set_status(&frame);
        self.advance();
        self.worker = Some(worker);
        self.state
    }

    fn advance(&mut self) {
        let before = self.position % WINDOW;
        if before == WINDOW - 1 {
            self.forward = false;
        }
        if before == 0 {
            self.forward = true;
        }
        if self.forward {
            self.position += 1;
        } else {
            self.position -= 1;
        }
    }
}

/// Status text for one animation frame, e.g. `Finding TODOs [  =     ] (12 files scanned)`
pub fn progress_frame(message: &str, position: usize, files_scanned: u64) -> String {
    let before = position % WINDOW;
    let after = (WINDOW - 1) - before;
    format!(
        "{} [{}={}] ({} files scanned)",
        message,
        " ".repeat(before),
        " ".repeat(after),
        files_scanned
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::FileCounter;
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::thread;

    #[derive(Default)]
    struct RecordingStatus {
        messages: Mutex<Vec<String>>,
    }

    impl StatusSink for RecordingStatus {
        fn set_status(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    /// A worker that runs until told to stop, returning `result`
    fn gated_worker(result: bool) -> (ScanHandle, mpsc::Sender<()>, FileCounter) {
        let (tx, rx) = mpsc::channel::<()>();
        let counter = FileCounter::new();
        let thread = thread::spawn(move || {
            let _ = rx.recv();
            result
        });
        (ScanHandle::from_thread(thread, counter.clone()), tx, counter)
    }

    fn wait_for_exit(reporter: &ProgressReporter) {
        while reporter.worker.as_ref().is_some_and(ScanHandle::is_alive) {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_progress_frame() {
        assert_eq!(
            progress_frame("Finding TODOs", 0, 3),
            "Finding TODOs [=       ] (3 files scanned)"
        );
        assert_eq!(
            progress_frame("Finding TODOs", 7, 10),
            "Finding TODOs [       =] (10 files scanned)"
        );
    }

    #[test]
    fn test_indicator_bounces() {
        let (worker, stop, _) = gated_worker(true);
        let sink = Arc::new(RecordingStatus::default());
        let mut reporter = ProgressReporter::new(worker, sink.clone(), "Scan", "");

        let mut positions = Vec::new();
        for _ in 0..16 {
            positions.push(reporter.position);
            assert_eq!(reporter.tick(), ReporterState::Running);
        }
        assert_eq!(
            positions,
            vec![0, 1, 2, 3, 4, 5, 6, 7, 6, 5, 4, 3, 2, 1, 0, 1]
        );
        drop(stop);
    }

    #[test]
    fn test_reports_live_counter() {
        let (worker, stop, counter) = gated_worker(true);
        let sink = Arc::new(RecordingStatus::default());
        let mut reporter = ProgressReporter::new(worker, sink.clone(), "Scan", "");

        counter.increment();
        counter.increment();
        reporter.tick();
        assert!(sink.messages.lock().unwrap()[0].ends_with("(2 files scanned)"));
        drop(stop);
    }

    #[test]
    fn test_success_message_when_result_delivered() {
        let (worker, stop, _) = gated_worker(true);
        let sink = Arc::new(RecordingStatus::default());
        let mut reporter = ProgressReporter::new(worker, sink.clone(), "Scan", "Done");

        assert_eq!(reporter.tick(), ReporterState::Running);
        stop.send(()).unwrap();
        wait_for_exit(&reporter);

        assert_eq!(reporter.tick(), ReporterState::Done);
        assert_eq!(sink.messages.lock().unwrap().last().unwrap(), "Done");

        // terminal: further polls change nothing
        let seen = sink.messages.lock().unwrap().len();
        assert_eq!(reporter.tick(), ReporterState::Done);
        assert_eq!(sink.messages.lock().unwrap().len(), seen);
    }

    #[test]
    fn test_clears_status_without_result() {
        let (worker, stop, _) = gated_worker(false);
        let sink = Arc::new(RecordingStatus::default());
        let mut reporter = ProgressReporter::new(worker, sink.clone(), "Scan", "Done");

        stop.send(()).unwrap();
        wait_for_exit(&reporter);

        assert_eq!(reporter.tick(), ReporterState::Done);
        assert_eq!(*sink.messages.lock().unwrap(), vec![String::new()]);
    }

    #[test]
    fn test_clears_status_when_worker_panics() {
        let thread = thread::spawn(|| -> bool { panic!("worker died") });
        let handle = ScanHandle::from_thread(thread, FileCounter::new());
        let sink = Arc::new(RecordingStatus::default());
        let mut reporter = ProgressReporter::new(handle, sink.clone(), "Scan", "Done");
        wait_for_exit(&reporter);

        assert_eq!(reporter.tick(), ReporterState::Done);
        assert_eq!(*sink.messages.lock().unwrap(), vec![String::new()]);
    }
}
