use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedReceiver};
use image::DynamicImage;

use super::{ExportReport, ExportTarget, Naming, SlicePlan, export_slices};
use crate::error::ExportError;
use crate::event::ExportProgress;

/// What the worker thread sends back.
#[derive(Debug)]
pub enum ExportMessage {
    Progress(ExportProgress),
    Finished(Result<ExportReport, ExportError>),
}

/// An export running on a background thread.
///
/// The owner drains messages with [`ExportJob::poll`] (non-blocking, once per frame)
/// or [`ExportJob::wait`] (blocking). Dropping the job detaches the thread; it still
/// finishes the current slice and stops at the next checkpoint if cancelled.
#[derive(Debug)]
pub struct ExportJob {
    receiver: UnboundedReceiver<ExportMessage>,
    cancel: Arc<AtomicBool>,
    progress: ExportProgress,
    finished: bool,
}

impl ExportJob {
    pub fn spawn(
        image: Arc<DynamicImage>,
        plan: SlicePlan,
        target: ExportTarget,
        naming: Naming,
        directory: PathBuf,
    ) -> Result<Self, ExportError> {
        let (sender, receiver) = mpsc::unbounded();
        let cancel = Arc::new(AtomicBool::new(false));
        let progress = ExportProgress {
            done: 0,
            total: plan.len(),
        };

        let worker_cancel = Arc::clone(&cancel);
        thread::Builder::new()
            .name("slice-export".to_owned())
            .spawn(move || {
                let progress_sender = sender.clone();
                let result = export_slices(
                    &image,
                    &plan,
                    &target,
                    &naming,
                    &directory,
                    &worker_cancel,
                    |progress| {
                        // The receiver may be gone if the owner dropped the job
                        let _ = progress_sender.unbounded_send(ExportMessage::Progress(progress));
                    },
                );
                let _ = sender.unbounded_send(ExportMessage::Finished(result));
            })
            .map_err(ExportError::Spawn)?;

        Ok(Self {
            receiver,
            cancel,
            progress,
            finished: false,
        })
    }

    /// Requests a stop at the next between-slice checkpoint.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Latest progress seen by `poll`/`wait`
    pub fn progress(&self) -> ExportProgress {
        self.progress
    }

    /// True once a `Finished` message has been handed out
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns every message that has arrived so far without blocking.
    pub fn poll(&mut self) -> Vec<ExportMessage> {
        let mut messages = Vec::new();
        loop {
            match self.receiver.try_next() {
                Ok(Some(message)) => messages.push(message),
                Ok(None) => {
                    // Every sender is gone
                    self.report_lost(&mut messages);
                    break;
                }
                // Nothing pending right now
                Err(_) => break,
            }
        }
        self.track(&messages);
        messages
    }

    /// Blocks until the worker finishes and returns all remaining messages.
    ///
    /// If the thread died without reporting, a `Finished(Err(WorkerLost))` is appended.
    /// `poll` does the same once it sees the channel close.
    pub fn wait(&mut self) -> Vec<ExportMessage> {
        let mut messages: Vec<ExportMessage> =
            futures::executor::block_on(self.receiver.by_ref().collect());
        self.report_lost(&mut messages);
        self.track(&messages);
        messages
    }

    fn report_lost(&self, messages: &mut Vec<ExportMessage>) {
        let reported = messages
            .iter()
            .any(|m| matches!(m, ExportMessage::Finished(_)));
        if !self.finished && !reported {
            log::error!("Export worker exited without a result");
            messages.push(ExportMessage::Finished(Err(ExportError::WorkerLost)));
        }
    }

    fn track(&mut self, messages: &[ExportMessage]) {
        for message in messages {
            match message {
                ExportMessage::Progress(progress) => self.progress = *progress,
                ExportMessage::Finished(_) => self.finished = true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::compute_slices;
    use image::RgbaImage;

    #[test]
    fn test_background_export_reports_progress_then_result() {
        let dir = tempfile::tempdir().unwrap();
        let image = Arc::new(DynamicImage::ImageRgba8(RgbaImage::new(3, 30)));
        let plan = compute_slices(30, &[10.0, 20.0]);

        let mut job = ExportJob::spawn(
            image,
            plan,
            ExportTarget::png(),
            Naming::default(),
            dir.path().to_path_buf(),
        )
        .unwrap();

        let messages = job.wait();
        let progress: Vec<usize> = messages
            .iter()
            .filter_map(|m| match m {
                ExportMessage::Progress(p) => Some(p.done),
                ExportMessage::Finished(_) => None,
            })
            .collect();
        assert_eq!(progress, vec![1, 2, 3]);
        assert_eq!(job.progress().done, 3);
        assert!(job.is_finished());
        // Drained and finished: nothing more, and no spurious loss report
        assert!(job.poll().is_empty());

        match messages.last() {
            Some(ExportMessage::Finished(Ok(report))) => assert_eq!(report.written.len(), 3),
            other => panic!("unexpected final message: {other:?}"),
        }
    }
}
