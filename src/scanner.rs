//! Capture loop and its controller.
//!
//! The [`CaptureLoop`] polls the capture region: every tick it grabs a frame,
//! recognizes its text and runs the field extractors. The first tick that
//! yields a complete record hands off to the browser URL resolver, emits the
//! composite message and ends the run. The [`ScanController`] owns at most one
//! running loop and toggles it on and off.

use crate::browser::BrowserUrlResolver;
use crate::capture::{CaptureService, PlatformGrabber, RawFrame, ScreenGrabber};
use crate::config::Config;
use crate::extractors::FieldExtractors;
use crate::recognizer::{TesseractRecognizer, TextRecognizer};
use crate::types::{CaptureError, CompositeMessage, ExtractedRecord, ScanEvent, WorkerState};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Fixed notification sent alongside a result
pub const SUCCESS_NOTICE: &str = "All information gathered successfully!";

/// Capacity of the controller's event channel
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Services the capture loop depends on
#[derive(Clone)]
pub struct ScanServices {
    pub grabber: Arc<dyn ScreenGrabber>,
    pub recognizer: Arc<dyn TextRecognizer>,
    pub extractors: Arc<FieldExtractors>,
    pub resolver: Arc<BrowserUrlResolver>,
}

impl ScanServices {
    /// Production services: platform capture, Tesseract, UI automation
    pub fn platform(config: &Config) -> Self {
        Self {
            grabber: Arc::new(PlatformGrabber::new()),
            recognizer: Arc::new(TesseractRecognizer::from_config(&config.ocr)),
            extractors: Arc::new(FieldExtractors::new(&config.extraction)),
            resolver: Arc::new(BrowserUrlResolver::platform(&config.browser)),
        }
    }
}

/// Worker state shared between the loop and its controller
#[derive(Debug, Clone, Default)]
pub struct StateHandle(Arc<AtomicU8>);

impl StateHandle {
    pub fn get(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::SeqCst))
    }

    fn set(&self, state: WorkerState) -> WorkerState {
        WorkerState::from_u8(self.0.swap(state.as_u8(), Ordering::SeqCst))
    }
}

/// Result of a single tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Capture or recognition failed; nothing was extracted
    NoText,
    /// Some fields are still missing
    Incomplete(ExtractedRecord),
    /// Every field was found in this tick
    Complete(ExtractedRecord),
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A message was emitted
    Completed(CompositeMessage),
    /// A complete record was found but the browser URL could not be read
    ResolverFailed(ExtractedRecord),
    /// Stopped before completion
    Cancelled,
}

/// The polling worker for one run
pub struct CaptureLoop {
    capture: Arc<CaptureService>,
    services: ScanServices,
    interval: Duration,
    events: mpsc::Sender<ScanEvent>,
    state: StateHandle,
    consecutive_failures: u32,
}

impl CaptureLoop {
    pub fn new(
        config: &Config,
        services: ScanServices,
        events: mpsc::Sender<ScanEvent>,
        state: StateHandle,
    ) -> Self {
        let capture = CaptureService::new(
            config.capture.region,
            config.capture.resolved_artifact_path(),
        );

        Self {
            capture: Arc::new(capture),
            services,
            interval: config.capture.interval(),
            events,
            state,
            consecutive_failures: 0,
        }
    }

    /// Poll until a complete record is handled or the token is cancelled
    pub async fn run(mut self, cancel: CancellationToken) -> RunOutcome {
        self.transition(WorkerState::Running).await;
        info!(
            "Scanning region {:?} every {:?}",
            self.capture.region(),
            self.interval
        );

        let mut tick_count: u64 = 0;
        let outcome = loop {
            if cancel.is_cancelled() {
                break RunOutcome::Cancelled;
            }

            tick_count += 1;
            trace!("Tick {}", tick_count);

            if let TickOutcome::Complete(record) = self.tick().await {
                info!("Complete record found after {} ticks", tick_count);
                self.transition(WorkerState::Stopping).await;
                break self.finish(record).await;
            }

            let cancelled = tokio::select! {
                _ = tokio::time::sleep(self.interval) => false,
                _ = cancel.cancelled() => true,
            };
            if cancelled {
                break RunOutcome::Cancelled;
            }
        };

        if outcome == RunOutcome::Cancelled {
            info!("Scan cancelled after {} ticks", tick_count);
            self.transition(WorkerState::Stopping).await;
        }
        self.transition(WorkerState::Idle).await;
        outcome
    }

    /// One capture, recognition and extraction pass
    pub async fn tick(&mut self) -> TickOutcome {
        let frame = match self.grab_frame().await {
            Some(frame) => frame,
            None => return TickOutcome::NoText,
        };

        let gray = frame.to_grayscale();
        drop(frame);

        let text = match self.services.recognizer.recognize(&gray).await {
            Ok(text) => {
                self.consecutive_failures = 0;
                text
            }
            Err(e) => {
                self.report_failure(format_args!("Error during OCR processing: {}", e));
                return TickOutcome::NoText;
            }
        };
        trace!("Recognized text: {:?}", text);

        let record = self.services.extractors.extract(&text);
        if record.is_complete() {
            TickOutcome::Complete(record)
        } else {
            TickOutcome::Incomplete(record)
        }
    }

    async fn grab_frame(&mut self) -> Option<RawFrame> {
        let capture = self.capture.clone();
        let grabber = self.services.grabber.clone();

        let result = tokio::task::spawn_blocking(move || -> Result<RawFrame, CaptureError> {
            let frame = capture.capture(grabber.as_ref())?;
            capture.persist_artifact(&frame);
            Ok(frame)
        })
        .await;

        match result {
            Ok(Ok(frame)) => Some(frame),
            Ok(Err(e)) => {
                self.report_failure(format_args!("Screen capture failed: {}", e));
                None
            }
            Err(e) => {
                error!("Capture worker join failed: {}", e);
                None
            }
        }
    }

    /// Warn on the first failure in a row, then drop to debug
    fn report_failure(&mut self, message: std::fmt::Arguments<'_>) {
        if self.consecutive_failures == 0 {
            warn!("{}", message);
        } else {
            debug!("{} (repeated {} times)", message, self.consecutive_failures + 1);
        }
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    async fn finish(&self, record: ExtractedRecord) -> RunOutcome {
        let resolver = self.services.resolver.clone();
        let browser_link = match tokio::task::spawn_blocking(move || resolver.resolve()).await {
            Ok(link) => link,
            Err(e) => {
                error!("Browser resolver join failed: {}", e);
                None
            }
        };

        let message = browser_link.and_then(|link| CompositeMessage::assemble(&record, link));
        match message {
            Some(message) => {
                info!("Report ready: {}", message);
                self.emit(ScanEvent::Result(message.clone())).await;
                self.emit(ScanEvent::Notify(SUCCESS_NOTICE.to_string())).await;
                RunOutcome::Completed(message)
            }
            None => {
                warn!("Complete record discarded: no browser URL available");
                self.emit(ScanEvent::ResolverFailed(record.clone())).await;
                RunOutcome::ResolverFailed(record)
            }
        }
    }

    async fn transition(&self, state: WorkerState) {
        if self.state.set(state) != state {
            debug!("Worker state -> {}", state.as_str());
            self.emit(ScanEvent::State(state)).await;
        }
    }

    async fn emit(&self, event: ScanEvent) {
        if self.events.send(event).await.is_err() {
            trace!("Event receiver dropped");
        }
    }
}

struct Worker {
    handle: JoinHandle<RunOutcome>,
    cancel: CancellationToken,
}

/// Starts and stops capture runs; at most one run is active at a time
pub struct ScanController {
    config: Config,
    services: ScanServices,
    events_tx: mpsc::Sender<ScanEvent>,
    state: StateHandle,
    worker: Option<Worker>,
}

impl ScanController {
    /// Create a controller and the receiver for its events
    pub fn new(config: Config, services: ScanServices) -> (Self, mpsc::Receiver<ScanEvent>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let controller = Self {
            config,
            services,
            events_tx,
            state: StateHandle::default(),
            worker: None,
        };
        (controller, events_rx)
    }

    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    /// Whether a run is in progress
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map(|w| !w.handle.is_finished())
            .unwrap_or(false)
    }

    /// Start a run. Returns false if one is already in progress.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            debug!("Scan already running, ignoring start");
            return false;
        }

        let cancel = CancellationToken::new();
        let capture_loop = CaptureLoop::new(
            &self.config,
            self.services.clone(),
            self.events_tx.clone(),
            self.state.clone(),
        );
        let handle = tokio::spawn(capture_loop.run(cancel.clone()));

        info!("Scan started");
        self.worker = Some(Worker { handle, cancel });
        true
    }

    /// Request cancellation and wait for the worker to exit.
    /// Returns the outcome of the run that was stopped, if any.
    pub async fn stop(&mut self) -> Option<RunOutcome> {
        let worker = self.worker.take()?;
        worker.cancel.cancel();

        match worker.handle.await {
            Ok(outcome) => {
                info!("Scan stopped");
                Some(outcome)
            }
            Err(e) => {
                error!("Capture worker panicked: {}", e);
                self.state.set(WorkerState::Idle);
                None
            }
        }
    }

    /// Stop the running scan, or start a new one when idle.
    /// Returns true if a scan was started.
    pub async fn toggle(&mut self) -> bool {
        if self.is_running() {
            self.stop().await;
            false
        } else {
            // Reap a run that ended on its own
            self.stop().await;
            self.start()
        }
    }
}
