//! # Scan Session
//!
//! The scanner state machine: camera acquisition, the poll-decode loop,
//! single-shot gallery scans and teardown.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Scanner Lifecycle                               │
//! │                                                                         │
//! │  start_camera()                                                         │
//! │    Idle ──► Acquiring ──open()──► wait_ready() ──► Scanning             │
//! │                 │                      │              │                 │
//! │                 └── AcquireError ──────┴──► Failed    │ tick (t=0)      │
//! │                                              │        ▼                 │
//! │                                              │   ready? ──no──┐         │
//! │                                              │     │yes       │         │
//! │                                              │   decode       │         │
//! │                                              │     │none      │         │
//! │                                              │     └──► sleep(500ms) ─┐ │
//! │                                              │     │some          ▲   │ │
//! │                                              │     ▼              └───┘ │
//! │                                              │   Found                  │
//! │                                              ▼     │                    │
//! │                                            Idle ◄──┘                    │
//! │                                                                         │
//! │  scan_image(upload)                                                    │
//! │    Idle ──► Acquiring ──validate──read──normalize──decode──► Found      │
//! │                 └───────────── any failure ─────────────► Failed        │
//! │                                                                         │
//! │  stop_camera(): bump generation, abort poll, stop device (including a  │
//! │                 device still waiting for video), clear surface, Idle.  │
//! │                 Safe to call at any time.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//!
//! The device handle and the poll task handle live only inside the session
//! core. Every exit from `Acquiring` or `Scanning` goes through one release
//! path, so at most one device and one poll task exist at any time.
//!
//! A poll tick re-checks the session generation under the lock before it
//! touches the device; a tick that races a stop sees a stale generation and
//! does nothing.
//!
//! While a session is acquiring, the core holds the device's [`LiveFlag`]
//! and the sending half of a stop channel. Releasing the session clears the
//! flag and wakes the acquiring call, which drops the device and returns
//! `ScanError::Cancelled`. If the caller drops that call instead, its
//! `SessionScope` returns the scanner to `Idle`.

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use payscan_core::validation::validate_upload;
use payscan_core::{DecodedPayload, Dimensions, ScanMode, ScanState, Severity};

use crate::config::ScannerConfig;
use crate::decoder::Decoder;
use crate::device::{
    CameraBackend, CaptureConstraints, CaptureDevice, LiveFlag, UnsupportedBackend,
};
use crate::error::{ScanError, ScanResult};
use crate::form::{HostForm, SharedForm};
use crate::normalizer::ImageNormalizer;
use crate::notify::{NoOpSink, NotificationSink};

/// Notification text for a decoded code.
pub const SUCCESS_MESSAGE: &str = "QR code scanned successfully!";

// =============================================================================
// Events and Status
// =============================================================================

/// Broadcast to hosts that render scanner state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    StateChanged { from: ScanState, to: ScanState },
    Decoded(DecodedPayload),
}

/// Snapshot of the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanStatus {
    pub state: ScanState,
    pub mode: Option<ScanMode>,
    pub session_id: Option<Uuid>,
    /// Poll ticks run in the current (or last) camera session.
    pub ticks: u64,
    /// Working surface size of the last grabbed frame; cleared on stop.
    pub surface: Option<Dimensions>,
    pub last_error: Option<String>,
    /// `Found` or `Failed` for the last finished session.
    pub last_outcome: Option<ScanState>,
    pub device_live: bool,
    pub polling: bool,
}

/// Status as sent to the browser page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScanStatusDto {
    pub state: ScanState,
    pub mode: Option<ScanMode>,
    pub session_id: Option<String>,
    pub ticks: u64,
    pub surface: Option<Dimensions>,
    pub last_error: Option<String>,
    pub last_outcome: Option<ScanState>,
    pub device_live: bool,
    pub polling: bool,
}

impl From<&ScanStatus> for ScanStatusDto {
    fn from(status: &ScanStatus) -> Self {
        ScanStatusDto {
            state: status.state,
            mode: status.mode,
            session_id: status.session_id.map(|id| id.to_string()),
            ticks: status.ticks,
            surface: status.surface,
            last_error: status.last_error.clone(),
            last_outcome: status.last_outcome,
            device_live: status.device_live,
            polling: status.polling,
        }
    }
}

// =============================================================================
// Uploads
// =============================================================================

/// Where an upload's bytes come from.
#[derive(Debug, Clone)]
pub enum UploadSource {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// An image picked from the gallery.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Declared MIME type.
    pub mime_type: String,
    /// Declared size in bytes; `None` is looked up when the scan runs.
    pub size: Option<u64>,
    pub source: UploadSource,
}

impl ImageUpload {
    pub fn new(mime_type: impl Into<String>, size: u64, source: UploadSource) -> Self {
        ImageUpload {
            mime_type: mime_type.into(),
            size: Some(size),
            source,
        }
    }

    /// Upload held in memory; the size is the buffer length.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        ImageUpload::new(mime_type, size, UploadSource::Bytes(bytes))
    }

    /// Upload backed by a file. Its size is read from the file's metadata
    /// during the scan, so a missing file fails the session like any other
    /// read error.
    pub fn from_path(mime_type: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        ImageUpload {
            mime_type: mime_type.into(),
            size: None,
            source: UploadSource::Path(path.into()),
        }
    }

    async fn resolve_size(&self) -> ScanResult<u64> {
        if let Some(size) = self.size {
            return Ok(size);
        }

        match &self.source {
            UploadSource::Bytes(bytes) => Ok(bytes.len() as u64),
            UploadSource::Path(path) => tokio::fs::metadata(path)
                .await
                .map(|metadata| metadata.len())
                .map_err(|e| ScanError::FileRead(e.to_string())),
        }
    }

    async fn read(self) -> ScanResult<Vec<u8>> {
        match self.source {
            UploadSource::Bytes(bytes) => Ok(bytes),
            UploadSource::Path(path) => tokio::fs::read(&path)
                .await
                .map_err(|e| ScanError::FileRead(e.to_string())),
        }
    }
}

// =============================================================================
// Session Core
// =============================================================================

#[derive(Default)]
struct SessionCore {
    state: ScanState,
    mode: Option<ScanMode>,
    session_id: Option<Uuid>,
    /// Bumped on every release; stale ticks and acquisitions compare against it.
    generation: u64,
    device: Option<Box<dyn CaptureDevice>>,
    acquiring: Option<PendingAcquire>,
    poll: Option<JoinHandle<()>>,
    surface: Option<Dimensions>,
    ticks: u64,
    last_error: Option<String>,
    last_outcome: Option<ScanState>,
}

impl SessionCore {
    /// Stops the poll task and the device. Returns the new generation.
    fn release(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);

        if let Some(poll) = self.poll.take() {
            poll.abort();
        }

        if let Some(pending) = self.acquiring.take() {
            if pending.live.as_ref().is_some_and(LiveFlag::stop) {
                debug!(session_id = ?self.session_id, "Acquiring device released");
            }
            // Wakes the acquiring call; dropping the sender would too.
            let _ = pending.stop_tx.try_send(());
        }

        if let Some(mut device) = self.device.take() {
            device.stop();
            debug!(session_id = ?self.session_id, "Capture device released");
        }

        self.surface = None;
        self.generation
    }

    fn owns_resources(&self) -> bool {
        self.state.is_active()
            || self.device.is_some()
            || self.acquiring.is_some()
            || self.poll.is_some()
    }

    fn device_live(&self) -> bool {
        let held = self.device.as_ref().is_some_and(|d| d.is_live());
        let acquiring = self
            .acquiring
            .as_ref()
            .and_then(|pending| pending.live.as_ref())
            .is_some_and(LiveFlag::is_live);
        held || acquiring
    }
}

/// The parts of an in-flight acquisition a stop must reach.
struct PendingAcquire {
    /// Set once the backend has handed over a device.
    live: Option<LiveFlag>,
    stop_tx: mpsc::Sender<()>,
}

/// A started session, held by the call that started it.
///
/// Dropping the scope while its session is still `Acquiring` (the host
/// dropped the `start_camera` or `scan_image` future) releases the session
/// and returns the scanner to `Idle`.
struct SessionScope<'a> {
    shared: &'a Shared,
    generation: u64,
    session_id: Uuid,
    stopped: mpsc::Receiver<()>,
}

impl SessionScope<'_> {
    /// Runs `work` unless the session is stopped or replaced first.
    async fn until_stopped<F: Future>(&mut self, work: F) -> Option<F::Output> {
        tokio::select! {
            output = work => Some(output),
            _ = self.stopped.recv() => None,
        }
    }
}

impl Drop for SessionScope<'_> {
    fn drop(&mut self) {
        let mut core = self.shared.lock();
        if core.generation == self.generation && core.state == ScanState::Acquiring {
            core.release();
            self.shared.transition(&mut core, ScanState::Idle);
            info!(session_id = %self.session_id, "Scan abandoned by caller");
        }
    }
}

/// Stops a device that never made it into the session core.
struct DeviceGuard(Option<Box<dyn CaptureDevice>>);

impl DeviceGuard {
    fn device(&mut self) -> Option<&mut Box<dyn CaptureDevice>> {
        self.0.as_mut()
    }

    fn into_inner(mut self) -> Option<Box<dyn CaptureDevice>> {
        self.0.take()
    }
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        if let Some(mut device) = self.0.take() {
            device.stop();
        }
    }
}

enum TickOutcome {
    Continue,
    Done,
}

// =============================================================================
// Shared State
// =============================================================================

struct Shared {
    config: ScannerConfig,
    backend: Arc<dyn CameraBackend>,
    decoder: Arc<dyn Decoder>,
    sink: Arc<dyn NotificationSink>,
    form: Arc<dyn HostForm>,
    normalizer: ImageNormalizer,
    core: Mutex<SessionCore>,
    events: broadcast::Sender<ScanEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionCore> {
        self.core.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn transition(&self, core: &mut SessionCore, to: ScanState) {
        let from = core.state;
        if from == to {
            return;
        }
        core.state = to;
        debug!(session_id = ?core.session_id, %from, %to, "Scan state changed");
        // No subscribers is fine.
        let _ = self.events.send(ScanEvent::StateChanged { from, to });
    }

    /// Tears down whatever is running and opens a new session.
    fn begin(&self, mode: ScanMode) -> SessionScope<'_> {
        let mut core = self.lock();

        if core.owns_resources() {
            info!(
                session_id = ?core.session_id,
                state = %core.state,
                "Stopping previous scan session"
            );
            core.release();
            self.transition(&mut core, ScanState::Idle);
        }

        let generation = core.release();
        let session_id = Uuid::new_v4();
        let (stop_tx, stopped) = mpsc::channel(1);
        core.session_id = Some(session_id);
        core.mode = Some(mode);
        core.ticks = 0;
        core.last_error = None;
        core.acquiring = Some(PendingAcquire {
            live: None,
            stop_tx,
        });
        self.transition(&mut core, ScanState::Acquiring);

        info!(%session_id, %mode, "Scan session started");
        SessionScope {
            shared: self,
            generation,
            session_id,
            stopped,
        }
    }

    /// Lets a stop reach a device that is still waiting for video.
    ///
    /// Returns false if the session already ended.
    fn track_device(&self, generation: u64, live: LiveFlag) -> bool {
        let mut core = self.lock();
        if core.generation != generation {
            return false;
        }
        if let Some(pending) = core.acquiring.as_mut() {
            pending.live = Some(live);
        }
        true
    }

    /// Ends the session in `Failed`, then settles in `Idle`.
    ///
    /// A session that was already replaced or stopped is left alone and no
    /// notification is raised.
    fn fail(&self, generation: u64, err: ScanError) -> ScanError {
        let message = err.user_message();

        let settled = {
            let mut core = self.lock();
            if core.generation != generation {
                debug!(error = %err, "Ignoring failure of a stale session");
                return ScanError::Cancelled;
            }
            let settled = core.release();
            core.last_error = Some(message.clone());
            core.last_outcome = Some(ScanState::Failed);
            warn!(session_id = ?core.session_id, error = %err, "Scan failed");
            self.transition(&mut core, ScanState::Failed);
            settled
        };

        self.sink.notify(Severity::Error, &message);
        self.settle(settled, ScanState::Failed);
        err
    }

    /// Ends the session in `Found`, writes the form, then settles in `Idle`.
    ///
    /// Returns false if the session was replaced before the result landed.
    fn succeed(&self, generation: u64, payload: &DecodedPayload) -> bool {
        let settled = {
            let mut core = self.lock();
            if core.generation != generation {
                return false;
            }
            // Detach rather than abort: this may be the poll task itself.
            drop(core.poll.take());
            let settled = core.release();
            core.last_outcome = Some(ScanState::Found);
            info!(
                session_id = ?core.session_id,
                ticks = core.ticks,
                has_amount = payload.amount().is_some(),
                "QR code decoded"
            );
            self.transition(&mut core, ScanState::Found);
            settled
        };

        self.form.apply_payload(payload);
        self.sink.notify(Severity::Success, SUCCESS_MESSAGE);
        let _ = self.events.send(ScanEvent::Decoded(payload.clone()));
        self.settle(settled, ScanState::Found);
        true
    }

    fn settle(&self, generation: u64, terminal: ScanState) {
        let mut core = self.lock();
        if core.generation == generation && core.state == terminal {
            self.transition(&mut core, ScanState::Idle);
        }
    }

    // =========================================================================
    // Poll Loop
    // =========================================================================

    async fn poll_loop(self: Arc<Self>, generation: u64) {
        let interval = self.config.poll_interval();

        loop {
            if let TickOutcome::Done = self.tick(generation) {
                break;
            }
            tokio::time::sleep(interval).await;
        }

        debug!(generation, "Poll loop finished");
    }

    fn tick(&self, generation: u64) -> TickOutcome {
        let frame = {
            let mut core = self.lock();
            if core.generation != generation || core.state != ScanState::Scanning {
                return TickOutcome::Done;
            }

            core.ticks += 1;
            let tick = core.ticks;

            let Some(device) = core.device.as_mut() else {
                return TickOutcome::Done;
            };

            let ready = device.ready_state();
            if !ready.can_decode() {
                debug!(tick, ?ready, "Device not ready, skipping decode");
                return TickOutcome::Continue;
            }

            let Some(frame) = device.frame() else {
                debug!(tick, "Device returned no frame");
                return TickOutcome::Continue;
            };

            core.surface = Some(frame.dimensions());
            frame
        };

        match self.decoder.decode(&frame) {
            Some(payload) => {
                if !self.succeed(generation, &payload) {
                    debug!("Discarding decode from a stopped session");
                }
                TickOutcome::Done
            }
            None => TickOutcome::Continue,
        }
    }
}

// =============================================================================
// Scanner
// =============================================================================

/// Host-owned scan controller.
///
/// One scanner runs at most one session. Starting a session while another is
/// active stops the previous one first.
pub struct Scanner {
    shared: Arc<Shared>,
}

impl Scanner {
    /// Creates a scanner with no camera backend, a no-op sink and an
    /// in-memory form.
    pub fn new(config: ScannerConfig, decoder: Arc<dyn Decoder>) -> ScanResult<Self> {
        ScannerBuilder::new(config).with_decoder(decoder).build()
    }

    pub fn builder(config: ScannerConfig) -> ScannerBuilder {
        ScannerBuilder::new(config)
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.shared.config
    }

    /// Subscribes to state changes and decoded payloads.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.shared.events.subscribe()
    }

    /// Returns the current scanner status.
    pub fn status(&self) -> ScanStatus {
        let core = self.shared.lock();
        ScanStatus {
            state: core.state,
            mode: core.mode,
            session_id: core.session_id,
            ticks: core.ticks,
            surface: core.surface,
            last_error: core.last_error.clone(),
            last_outcome: core.last_outcome,
            device_live: core.device_live(),
            polling: core.poll.as_ref().is_some_and(|p| !p.is_finished()),
        }
    }

    /// Opens the camera and starts polling.
    ///
    /// Returns once the device is ready and the first tick is scheduled. A
    /// decoded code is delivered through the form, the sink and
    /// [`ScanEvent::Decoded`].
    ///
    /// ## Errors
    /// - `ScanError::Acquire` when the device cannot be opened or never
    ///   becomes ready (already reported to the sink)
    /// - `ScanError::Cancelled` when the session was stopped or replaced
    ///   while acquiring
    pub async fn start_camera(&self) -> ScanResult<()> {
        let mut scope = self.shared.begin(ScanMode::Camera);
        let generation = scope.generation;
        let session_id = scope.session_id;
        let constraints = CaptureConstraints::from_settings(&self.shared.config.camera);

        info!(
            %session_id,
            facing = %constraints.facing,
            ideal = %constraints.ideal_dimensions(),
            "Requesting camera"
        );

        let device = match scope.until_stopped(self.shared.backend.open(&constraints)).await {
            Some(Ok(device)) => device,
            Some(Err(cause)) => return Err(self.shared.fail(generation, cause.into())),
            None => {
                info!(%session_id, "Session stopped while requesting camera");
                return Err(ScanError::Cancelled);
            }
        };

        let live = device.live_flag();
        let mut guard = DeviceGuard(Some(device));
        if !self.shared.track_device(generation, live) {
            info!(%session_id, "Session stopped while acquiring, releasing device");
            return Err(ScanError::Cancelled);
        }

        let ready = match guard.device() {
            Some(device) => scope.until_stopped(device.wait_ready()).await,
            None => Some(Ok(())),
        };
        match ready {
            Some(Ok(())) => {}
            Some(Err(cause)) => {
                drop(guard);
                return Err(self.shared.fail(generation, cause.into()));
            }
            None => {
                info!(%session_id, "Session stopped while waiting for video, releasing device");
                return Err(ScanError::Cancelled);
            }
        }

        let mut core = self.shared.lock();
        if core.generation != generation {
            info!(%session_id, "Session stopped while acquiring, releasing device");
            return Err(ScanError::Cancelled);
        }

        core.acquiring = None;
        core.device = guard.into_inner();
        self.shared.transition(&mut core, ScanState::Scanning);
        core.poll = Some(tokio::spawn(Arc::clone(&self.shared).poll_loop(generation)));

        info!(
            %session_id,
            interval_ms = self.shared.config.scanner.poll_interval_ms,
            "Camera scanning"
        );
        Ok(())
    }

    /// Stops the camera session, if any.
    ///
    /// Cancels the pending tick, releases the device and clears the working
    /// surface before returning. A device that is still waiting for video is
    /// marked released before this returns as well. Idempotent.
    pub fn stop_camera(&self) {
        let mut core = self.shared.lock();
        if !core.owns_resources() {
            return;
        }

        core.release();
        self.shared.transition(&mut core, ScanState::Idle);
        info!(session_id = ?core.session_id, ticks = core.ticks, "Scan session stopped");
    }

    /// Scans one uploaded image.
    ///
    /// Exactly one decode attempt; no retries. Rejections happen before any
    /// read or decode.
    pub async fn scan_image(&self, upload: ImageUpload) -> ScanResult<DecodedPayload> {
        let mut scope = self.shared.begin(ScanMode::Gallery);
        let generation = scope.generation;
        let session_id = scope.session_id;

        info!(
            %session_id,
            mime_type = %upload.mime_type,
            size = ?upload.size,
            "Scanning uploaded image"
        );

        let size = match scope.until_stopped(upload.resolve_size()).await {
            Some(Ok(size)) => size,
            Some(Err(err)) => return Err(self.shared.fail(generation, err)),
            None => return Err(ScanError::Cancelled),
        };

        let limits = self.shared.config.upload_limits();
        if let Err(rejection) = validate_upload(&upload.mime_type, size, &limits) {
            return Err(self.shared.fail(generation, rejection.into()));
        }

        let bytes = match scope.until_stopped(upload.read()).await {
            Some(Ok(bytes)) => bytes,
            Some(Err(err)) => return Err(self.shared.fail(generation, err)),
            None => return Err(ScanError::Cancelled),
        };

        let normalized = match self.shared.normalizer.normalize_bytes(&bytes) {
            Ok(normalized) => normalized,
            Err(err) => return Err(self.shared.fail(generation, err)),
        };

        debug!(
            %session_id,
            source = %normalized.source_dimensions(),
            width = normalized.dimensions().width,
            height = normalized.dimensions().height,
            "Upload normalized"
        );

        match self.shared.decoder.decode(normalized.as_frame()) {
            Some(payload) => {
                if self.shared.succeed(generation, &payload) {
                    Ok(payload)
                } else {
                    Err(ScanError::Cancelled)
                }
            }
            None => Err(self.shared.fail(generation, ScanError::NoCodeFound)),
        }
    }

    /// Stops any session. The scanner stays usable.
    pub fn dispose(&self) {
        self.stop_camera();
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.stop_camera();
    }
}

// =============================================================================
// Builder Pattern
// =============================================================================

/// Builder for creating a Scanner with options.
pub struct ScannerBuilder {
    config: ScannerConfig,
    backend: Option<Arc<dyn CameraBackend>>,
    decoder: Option<Arc<dyn Decoder>>,
    sink: Option<Arc<dyn NotificationSink>>,
    form: Option<Arc<dyn HostForm>>,
}

impl ScannerBuilder {
    pub fn new(config: ScannerConfig) -> Self {
        ScannerBuilder {
            config,
            backend: None,
            decoder: None,
            sink: None,
            form: None,
        }
    }

    /// Sets the camera backend.
    pub fn with_backend(mut self, backend: Arc<dyn CameraBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the QR decoder.
    pub fn with_decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Sets the notification sink.
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the form that receives decoded payloads.
    pub fn with_form(mut self, form: Arc<dyn HostForm>) -> Self {
        self.form = Some(form);
        self
    }

    /// Builds the Scanner.
    pub fn build(self) -> ScanResult<Scanner> {
        self.config.validate()?;

        let decoder = self
            .decoder
            .ok_or_else(|| ScanError::InvalidConfig("Decoder required".into()))?;

        let (events, _) = broadcast::channel(32);
        let normalizer = ImageNormalizer::new(self.config.max_dimension());

        let shared = Shared {
            backend: self.backend.unwrap_or_else(|| Arc::new(UnsupportedBackend)),
            decoder,
            sink: self.sink.unwrap_or_else(|| Arc::new(NoOpSink)),
            form: self.form.unwrap_or_else(|| Arc::new(SharedForm::default())),
            normalizer,
            core: Mutex::new(SessionCore::default()),
            events,
            config: self.config,
        };

        Ok(Scanner {
            shared: Arc::new(shared),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
