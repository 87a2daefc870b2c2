//! Async session runtime.
//!
//! A connected session runs four tokio tasks over one shared `Monitor`:
//!
//! ```text
//! transport ──▶ ingest task ──(lines)──▶ Monitor ◀── scoring task (1 s)
//!                                          ▲  │
//!                     calibration timer ───┘  └──▶ render task ──▶ frames
//! ```
//!
//! Every task selects on a per-session shutdown signal, so disconnecting
//! interrupts a pending transport read instead of waiting for more bytes.
//! Buffers are cleared only after all tasks have been joined.

use crate::config::Config;
use crate::core::HealthAssessment;
use crate::diagnostics::{create_shared_stats, SharedIngestStats};
use crate::session::monitor::{LineDiagnostics, LineOutcome, Monitor, WaveformFrame};
use crate::session::state::{SessionState, Transition, TransitionCause};
use crate::stream::LineFramer;
use crate::transport::{Transport, TransportError, TransportStream};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Monitor shared between the session tasks and readers.
pub type SharedMonitor = Arc<RwLock<Monitor>>;

/// Output channels for the presentation layer.
struct Outputs {
    frames: watch::Sender<WaveformFrame>,
    assessments: watch::Sender<HealthAssessment>,
}

impl Outputs {
    fn publish(&self, monitor: &Monitor) {
        self.frames.send_replace(monitor.waveform_frame(Utc::now()));
        self.assessments.send_replace(monitor.assessment().clone());
    }
}

/// Handles for a connected session.
struct ActiveSession {
    id: Uuid,
    shutdown: Arc<watch::Sender<bool>>,
    tasks: Vec<JoinHandle<()>>,
}

/// Drives one transport through connect/ingest/score/disconnect cycles.
pub struct MonitorSession<T: Transport> {
    config: Config,
    transport: T,
    monitor: SharedMonitor,
    stats: SharedIngestStats,
    outputs: Arc<Outputs>,
    active: Option<ActiveSession>,
}

impl<T: Transport> MonitorSession<T> {
    pub fn new(config: Config, transport: T) -> Self {
        let monitor = Monitor::new(&config);
        let (frames, _) = watch::channel(WaveformFrame::empty());
        let (assessments, _) = watch::channel(HealthAssessment::insufficient_data());

        Self {
            config,
            transport,
            monitor: Arc::new(RwLock::new(monitor)),
            stats: create_shared_stats(),
            outputs: Arc::new(Outputs {
                frames,
                assessments,
            }),
            active: None,
        }
    }

    /// Use an existing statistics handle instead of a private one.
    pub fn with_stats(mut self, stats: SharedIngestStats) -> Self {
        self.stats = stats;
        self
    }

    /// Open the transport and start a new session.
    ///
    /// Any running session is disconnected first. On failure the session
    /// stays disconnected and the error is returned to the caller.
    pub async fn connect(&mut self) -> Result<Uuid, TransportError> {
        if self.active.is_some() {
            self.disconnect().await;
        }

        let baud_rate = self.config.transport.baud_rate;
        info!("Connecting to {} at {} baud", self.transport.describe(), baud_rate);

        let stream = match self.transport.open(baud_rate).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Connect failed: {}", e);
                return Err(e);
            }
        };

        let id = Uuid::new_v4();
        {
            let mut monitor = self.monitor.write().await;
            if let Some(transition) = monitor.begin_session(Instant::now()) {
                log_transition(id, &transition);
            }
            self.outputs.publish(&monitor);
        }
        self.stats.record_session_started();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shutdown = Arc::new(shutdown_tx);
        let timing = &self.config.timing;

        let tasks = vec![
            tokio::spawn(ingest_task(
                id,
                stream,
                self.monitor.clone(),
                self.stats.clone(),
                self.outputs.clone(),
                shutdown.clone(),
                shutdown_rx.clone(),
                timing.read_chunk_size,
            )),
            tokio::spawn(scoring_task(
                self.monitor.clone(),
                self.stats.clone(),
                self.outputs.clone(),
                shutdown_rx.clone(),
                timing.scoring_interval,
            )),
            tokio::spawn(calibration_task(
                id,
                self.monitor.clone(),
                shutdown_rx.clone(),
            )),
            tokio::spawn(render_task(
                self.monitor.clone(),
                self.outputs.clone(),
                shutdown_rx,
                timing.render_interval,
            )),
        ];

        self.active = Some(ActiveSession {
            id,
            shutdown,
            tasks,
        });
        Ok(id)
    }

    /// Stop the session tasks and discard all session data.
    pub async fn disconnect(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        active.shutdown.send_replace(true);
        for task in active.tasks {
            if let Err(e) = task.await {
                if e.is_panic() {
                    warn!(session = %active.id, "Session task panicked: {}", e);
                }
            }
        }

        {
            let mut monitor = self.monitor.write().await;
            if let Some(transition) = monitor.end_session(TransitionCause::DisconnectRequested) {
                log_transition(active.id, &transition);
            }
            self.outputs.publish(&monitor);
        }

        self.transport.close().await;
        info!(session = %active.id, "Disconnected");
    }

    /// Identifier of the running session, if any.
    ///
    /// A session ended by a transport failure no longer counts as running,
    /// even before `disconnect` has reaped its tasks.
    pub fn session_id(&self) -> Option<Uuid> {
        self.active
            .as_ref()
            .filter(|a| !*a.shutdown.borrow())
            .map(|a| a.id)
    }

    pub async fn state(&self) -> SessionState {
        self.monitor.read().await.state()
    }

    pub async fn assessment(&self) -> HealthAssessment {
        self.monitor.read().await.assessment().clone()
    }

    pub async fn diagnostics(&self) -> LineDiagnostics {
        self.monitor.read().await.diagnostics().clone()
    }

    /// Current waveform snapshot, taken on demand.
    pub async fn frame(&self) -> WaveformFrame {
        self.monitor.read().await.waveform_frame(Utc::now())
    }

    /// Frames published by the render task.
    pub fn subscribe_frames(&self) -> watch::Receiver<WaveformFrame> {
        self.outputs.frames.subscribe()
    }

    /// Assessments published after every scoring pass.
    pub fn subscribe_assessments(&self) -> watch::Receiver<HealthAssessment> {
        self.outputs.assessments.subscribe()
    }

    pub fn monitor(&self) -> SharedMonitor {
        self.monitor.clone()
    }

    pub fn stats(&self) -> SharedIngestStats {
        self.stats.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: Transport> Drop for MonitorSession<T> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.shutdown.send_replace(true);
        }
    }
}

/// Read chunks, frame them and feed lines to the monitor.
///
/// `shutdown_rx` must be created before the task is spawned so a disconnect
/// that happens before its first poll is still observed.
#[allow(clippy::too_many_arguments)]
async fn ingest_task(
    id: Uuid,
    mut stream: TransportStream,
    monitor: SharedMonitor,
    stats: SharedIngestStats,
    outputs: Arc<Outputs>,
    shutdown: Arc<watch::Sender<bool>>,
    mut shutdown_rx: watch::Receiver<bool>,
    chunk_size: usize,
) {
    let mut framer = LineFramer::new();
    let mut buf = vec![0u8; chunk_size.max(1)];

    loop {
        let read = tokio::select! {
            _ = shutdown_rx.changed() => break,
            read = stream.read(&mut buf) => read,
        };

        match read {
            Ok(0) => {
                if let Some(line) = framer.finish() {
                    apply_lines(id, &monitor, &stats, &[line]).await;
                }
                info!(session = %id, "Device stream ended");
                break;
            }
            Ok(n) => {
                stats.record_chunk();
                let lines = framer.push(&buf[..n]);
                if !lines.is_empty() {
                    apply_lines(id, &monitor, &stats, &lines).await;
                }
            }
            Err(e) => {
                warn!(session = %id, "{}", TransportError::Read(e));
                let mut monitor = monitor.write().await;
                if let Some(transition) = monitor.end_session(TransitionCause::TransportFailure) {
                    log_transition(id, &transition);
                }
                outputs.publish(&monitor);
                shutdown.send_replace(true);
                break;
            }
        }
    }
}

async fn apply_lines(id: Uuid, monitor: &SharedMonitor, stats: &SharedIngestStats, lines: &[String]) {
    let mut monitor = monitor.write().await;
    for line in lines {
        match monitor.handle_line(line, Utc::now()) {
            LineOutcome::Reading { beat, transition } => {
                stats.record_reading(beat);
                if let Some(transition) = transition {
                    log_transition(id, &transition);
                }
            }
            LineOutcome::Status { transition } => {
                stats.record_status_line();
                debug!(session = %id, "Device status: {}", line.trim());
                if let Some(transition) = transition {
                    log_transition(id, &transition);
                }
            }
            LineOutcome::Dropped => {}
        }
    }
    stats.record_lines(lines.len() as u64);
}

/// Recompute the assessment on a fixed cadence.
async fn scoring_task(
    monitor: SharedMonitor,
    stats: SharedIngestStats,
    outputs: Arc<Outputs>,
    mut shutdown: watch::Receiver<bool>,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        let assessment = monitor.write().await.rescore().clone();
        stats.record_assessment();
        outputs.assessments.send_replace(assessment);
    }
}

/// Move to monitoring when the calibration window elapses.
async fn calibration_task(id: Uuid, monitor: SharedMonitor, mut shutdown: watch::Receiver<bool>) {
    let Some(deadline) = monitor.read().await.calibration_deadline() else {
        return;
    };

    tokio::select! {
        _ = shutdown.changed() => return,
        _ = tokio::time::sleep_until(deadline) => {}
    }

    if let Some(transition) = monitor.write().await.poll_calibration(Instant::now()) {
        log_transition(id, &transition);
    }
}

/// Publish read-only waveform snapshots at display rate.
async fn render_task(
    monitor: SharedMonitor,
    outputs: Arc<Outputs>,
    mut shutdown: watch::Receiver<bool>,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        let frame = monitor.read().await.waveform_frame(Utc::now());
        outputs.frames.send_replace(frame);
    }
}

fn log_transition(id: Uuid, transition: &Transition) {
    info!(
        session = %id,
        from = %transition.from,
        to = %transition.to,
        cause = ?transition.cause,
        "Session state changed"
    );
}
