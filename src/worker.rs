pub mod backoff;

use crate::capture::interface::ScreenCapture;
use crate::classifier::interface::{Classification, ImageClassifier};
use crate::config::Config;
use crate::library::logger::interface::Logger;
use crate::region::SharedRegion;
use chrono::{DateTime, Local};
use image::DynamicImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Posted from the capture thread to the UI thread.
pub enum WorkerEvent {
    Frame {
        preview: DynamicImage,
        predictions: Vec<Classification>,
        captured_at: DateTime<Local>,
    },
    Recovering {
        failures: u32,
    },
}

/// Background capture-classify loop.
///
/// The thread polls the running flag every iteration; stopping is
/// cooperative and bounded by the longest backoff sleep. All results go
/// through the event channel, never into UI state directly.
pub struct CaptureWorker {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        config: Config,
        logger: Arc<dyn Logger + Send + Sync>,
        capture: Arc<dyn ScreenCapture + Send + Sync>,
        classifier: Arc<dyn ImageClassifier + Send + Sync>,
        region: Arc<SharedRegion>,
        events: Sender<WorkerEvent>,
        wake: Arc<dyn Fn() + Send + Sync>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let logger = logger.with_namespace("worker");
        let handle = std::thread::spawn(move || {
            run_loop(&config, logger, capture, classifier, region, events, wake, &flag)
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Signal the thread and wait for it to finish its current iteration.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[allow(clippy::too_many_arguments)]
fn run_loop(
    config: &Config,
    logger: Arc<dyn Logger + Send + Sync>,
    capture: Arc<dyn ScreenCapture + Send + Sync>,
    classifier: Arc<dyn ImageClassifier + Send + Sync>,
    region: Arc<SharedRegion>,
    events: Sender<WorkerEvent>,
    wake: Arc<dyn Fn() + Send + Sync>,
    running: &AtomicBool,
) {
    let mut failures = 0u32;

    while running.load(Ordering::Relaxed) {
        match run_iteration(config, &capture, &classifier, &region, &events, &wake) {
            Ok(()) => {
                failures = 0;
                std::thread::sleep(config.frame_interval());
            }
            Err(e) => {
                let attempt = failures + 1;
                let _ = logger.error(&format!("capture error #{}: {}", attempt, e));

                let (next, action) =
                    backoff::register_failure(failures, config.max_consecutive_failures);
                failures = next;

                if action == backoff::FailureAction::Recover {
                    let _ = logger.info("too many consecutive errors, recovering...");
                    if events.send(WorkerEvent::Recovering { failures: attempt }).is_ok() {
                        wake();
                    }
                }
                std::thread::sleep(backoff::sleep_for(
                    action,
                    config.failure_backoff(),
                    config.recovery_backoff(),
                ));
            }
        }
    }
}

fn run_iteration(
    config: &Config,
    capture: &Arc<dyn ScreenCapture + Send + Sync>,
    classifier: &Arc<dyn ImageClassifier + Send + Sync>,
    region: &SharedRegion,
    events: &Sender<WorkerEvent>,
    wake: &Arc<dyn Fn() + Send + Sync>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let region = region.snapshot();
    let frame = capture.capture(&region)?;
    let predictions = classifier.classify(&frame)?;

    let preview = frame.resize_exact(
        config.preview_width,
        config.preview_height,
        image::imageops::FilterType::Triangle,
    );

    let event = WorkerEvent::Frame {
        preview,
        predictions,
        captured_at: Local::now(),
    };
    // A closed channel means the UI is gone; the running flag stops us.
    if events.send(event).is_ok() {
        wake();
    }
    Ok(())
}
