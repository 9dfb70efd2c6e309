//! Core mode state machine
//!
//! Owns the single source of truth for whether recognized speech is
//! surfaced as active transcription, drives the recognition stream
//! collaborators, and schedules bounded reconnection after failures.
//! All transitions happen inside one dispatch turn of the run loop.

use std::time::SystemTime;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::events::{ControllerEvent, StateEvent, TranscriptEvent};
use crate::phrase::{normalize, PhraseMatcher};
use crate::stream::{
    ErrorClass, ErrorCode, MicPermission, MicrophoneAccess, NetworkMonitor, Platform,
    RecognitionBackend, RecognitionResult, RecognitionStream, StreamEvent,
};

use super::backoff::{self, RestartState};

/// The five possible modes of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Constructed but not yet started
    Idle,
    /// Stream is live; waiting for a wake phrase
    Listening,
    /// Wake phrase heard; speech is active transcription
    Transcribing,
    /// Explicitly stopped; only a new start call leaves this mode
    Stopped,
    /// Something failed; may be followed by retries or by Stopped
    Error,
}

impl Default for Mode {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Idle => write!(f, "Idle"),
            Mode::Listening => write!(f, "Listening"),
            Mode::Transcribing => write!(f, "Transcribing"),
            Mode::Stopped => write!(f, "Stopped"),
            Mode::Error => write!(f, "Error"),
        }
    }
}

/// Why a start call failed. Each failure is also surfaced as an
/// `Error`-mode state event, so passive observers stay consistent
/// with the imperative caller.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("speech recognition is not supported in this environment")]
    NotSupported,
    #[error("no network connectivity")]
    Offline,
    #[error("microphone access denied")]
    PermissionDenied,
    #[error("failed to start recognition stream: {0}")]
    Stream(anyhow::Error),
    #[error("controller task has shut down")]
    Closed,
}

/// Messages sent to the controller by its own spawned scheduler tasks.
///
/// Each carries the epoch it was scheduled under; the controller drops
/// anything stamped before the last cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SchedulerMsg {
    /// The backoff timer elapsed
    RetryElapsed { epoch: u64 },
    /// The one-shot network waiter saw connectivity return
    NetworkRestored { epoch: u64 },
}

/// The state machine that manages mode transitions
pub(crate) struct ModeController {
    config: Config,
    wake: PhraseMatcher,
    sleep: PhraseMatcher,
    mode: Mode,
    /// Channel for emitting transcript and state events
    events: broadcast::Sender<ControllerEvent>,
    /// Publishes the current mode for cheap synchronous reads
    mode_tx: watch::Sender<Mode>,
    backend: Box<dyn RecognitionBackend>,
    microphone: Box<dyn MicrophoneAccess>,
    network: Box<dyn NetworkMonitor>,
    /// The live stream, at most one per controller
    stream: Option<Box<dyn RecognitionStream>>,
    /// Sender handed to each opened stream
    stream_tx: mpsc::Sender<StreamEvent>,
    /// Sender handed to spawned timer/waiter tasks
    sched_tx: mpsc::Sender<SchedulerMsg>,
    restart: RestartState,
}

impl ModeController {
    pub fn new(
        config: Config,
        platform: Platform,
        events: broadcast::Sender<ControllerEvent>,
        mode_tx: watch::Sender<Mode>,
        stream_tx: mpsc::Sender<StreamEvent>,
        sched_tx: mpsc::Sender<SchedulerMsg>,
    ) -> Self {
        let wake = PhraseMatcher::compile(&config.wake_phrases());
        let sleep = PhraseMatcher::compile(&config.sleep_phrases());

        Self {
            config,
            wake,
            sleep,
            mode: Mode::Idle,
            events,
            mode_tx,
            backend: platform.backend,
            microphone: platform.microphone,
            network: platform.network,
            stream: None,
            stream_tx,
            sched_tx,
            restart: RestartState::new(),
        }
    }

    /// Get the current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Begin a listening session.
    ///
    /// No-op while already active. Checks capability, connectivity, and
    /// microphone permission before touching the stream; any failure
    /// lands in `Error` mode and is also returned to the caller.
    pub async fn start(&mut self) -> Result<(), StartError> {
        if matches!(self.mode, Mode::Listening | Mode::Transcribing) {
            warn!(mode = %self.mode, "start requested while already active");
            return Ok(());
        }

        // an explicit start supersedes any pending retry timer or waiter
        self.restart.invalidate();

        if !self.backend.is_supported() {
            return Err(self.fail(StartError::NotSupported, ErrorCode::NotSupported));
        }
        if !self.network.is_online() {
            let err = self.fail(StartError::Offline, ErrorCode::Offline);
            if self.config.auto_restart {
                self.arm_network_waiter();
                info!("offline at start; restart deferred until network returns");
                self.emit_notice("offline; waiting for network before restarting");
            }
            return Err(err);
        }
        if self.microphone.request_access().await == MicPermission::Denied {
            return Err(self.fail(StartError::PermissionDenied, ErrorCode::PermissionDenied));
        }

        if let Err(e) = self.open_and_start_stream() {
            return Err(self.fail(StartError::Stream(e), ErrorCode::RestartFailed));
        }

        self.restart.reset();
        self.transition(Mode::Listening, None, None);
        Ok(())
    }

    /// Stop the session. The single cancellation point: pending timers
    /// and waiters are invalidated, the stream is torn down, and the
    /// attempt counter is zeroed. Always succeeds; idempotent.
    pub fn stop(&mut self) {
        self.restart.reset();
        if let Some(mut stream) = self.stream.take() {
            stream.abort();
        }
        self.transition(Mode::Stopped, None, None);
    }

    /// Dispatch an event from the recognition stream.
    pub fn handle_stream_event(&mut self, event: StreamEvent) {
        if self.mode == Mode::Stopped {
            debug!(?event, "ignoring stream event after stop");
            return;
        }

        match event {
            StreamEvent::Started => self.on_stream_started(),
            StreamEvent::Result(result) => self.on_result(result),
            StreamEvent::Ended => self.on_stream_ended(),
            StreamEvent::Error(code) => self.on_stream_error(code),
        }
    }

    /// Dispatch a message from a spawned timer or network waiter.
    pub fn handle_scheduler_msg(&mut self, msg: SchedulerMsg) {
        let (epoch, reason) = match msg {
            SchedulerMsg::RetryElapsed { epoch } => (epoch, "backoff timer elapsed"),
            SchedulerMsg::NetworkRestored { epoch } => (epoch, "network restored"),
        };

        if epoch != self.restart.epoch() {
            debug!(epoch, current = self.restart.epoch(), "discarding stale scheduler message");
            return;
        }
        if self.mode == Mode::Stopped {
            debug!("scheduler message after stop; ignoring");
            return;
        }

        info!(reason, "attempting stream restart");
        self.restart.invalidate();
        self.attempt_restart();
    }

    /// The stream actually came up; the outage (if any) is over.
    fn on_stream_started(&mut self) {
        debug!("recognition stream up");
        self.restart.reset();
    }

    fn on_result(&mut self, result: RecognitionResult) {
        let Some(best) = result.best() else {
            return;
        };

        if let Some(confidence) = best.confidence {
            if confidence < self.config.wake_confidence_threshold {
                debug!(
                    confidence,
                    threshold = self.config.wake_confidence_threshold,
                    "discarding low-confidence result"
                );
                return;
            }
        }

        // Transcripts are emitted for every accepted result regardless
        // of mode, and always before any transition the result triggers.
        let transcript = best.transcript.clone();
        let confidence = best.confidence;
        self.emit(ControllerEvent::Transcript(TranscriptEvent {
            transcript: transcript.clone(),
            is_final: result.is_final,
            confidence,
            captured_at: SystemTime::now(),
        }));

        // A single result cannot both wake and sleep.
        let text = normalize(&transcript);
        match self.mode {
            Mode::Listening if self.wake.matches(&text) => {
                self.transition(
                    Mode::Transcribing,
                    Some("wake phrase detected".to_string()),
                    None,
                );
            }
            Mode::Transcribing if self.sleep.matches(&text) => {
                self.transition(
                    Mode::Listening,
                    Some("sleep phrase detected".to_string()),
                    None,
                );
            }
            _ => {}
        }
    }

    fn on_stream_ended(&mut self) {
        info!("recognition stream ended");
        self.stream = None;

        if self.config.auto_restart {
            self.schedule_restart();
        } else {
            self.transition(
                Mode::Error,
                Some("stream ended and automatic restart is disabled".to_string()),
                Some(ErrorCode::RestartDisabled),
            );
        }
    }

    fn on_stream_error(&mut self, code: ErrorCode) {
        warn!(code = %code, "recognition stream error");

        match code.class() {
            ErrorClass::Permission => {
                // Waiting cannot resolve an OS-level denial; do not retry.
                self.transition(
                    Mode::Error,
                    Some("microphone permission denied; not retrying".to_string()),
                    Some(code),
                );
            }
            ErrorClass::Policy | ErrorClass::Terminal => {
                self.transition(Mode::Error, None, Some(code));
            }
            ErrorClass::Network => {
                self.transition(Mode::Error, None, Some(code));
                if self.config.auto_restart {
                    self.schedule_restart();
                } else {
                    self.emit_notice("automatic restart is disabled");
                }
            }
        }
    }

    /// Decide if and when to attempt a restart. Consumes an attempt
    /// slot and arms the backoff timer, unless the network is down, in
    /// which case a one-shot waiter restarts as soon as connectivity
    /// returns without touching the attempt budget.
    fn schedule_restart(&mut self) {
        if self.mode == Mode::Stopped {
            return;
        }

        if !self.network.is_online() {
            self.arm_network_waiter();
            info!("offline; restart deferred until network returns");
            self.emit_notice("offline; waiting for network before restarting");
            return;
        }

        self.restart.invalidate();
        let epoch = self.restart.epoch();

        if self.restart.attempts() >= self.config.max_restart_attempts {
            self.transition(
                Mode::Error,
                Some("giving up after maximum restart attempts".to_string()),
                Some(ErrorCode::MaxAttemptsReached),
            );
            return;
        }

        let attempt = self.restart.next_attempt();
        let delay = backoff::retry_delay(attempt);
        let sched_tx = self.sched_tx.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sched_tx.send(SchedulerMsg::RetryElapsed { epoch }).await;
        });
        self.restart.set_timer(timer);

        info!(
            attempt,
            max = self.config.max_restart_attempts,
            delay_ms = delay.as_millis() as u64,
            "restart scheduled"
        );
        self.emit_notice(&format!(
            "retrying in {}ms (attempt {}/{})",
            delay.as_millis(),
            attempt,
            self.config.max_restart_attempts
        ));
    }

    /// Register the one-shot waiter that restarts once connectivity
    /// returns. Consumes no attempt slot; invalidates anything pending.
    fn arm_network_waiter(&mut self) {
        self.restart.invalidate();
        let epoch = self.restart.epoch();
        let mut online = self.network.watch();
        let sched_tx = self.sched_tx.clone();
        let waiter = tokio::spawn(async move {
            loop {
                if *online.borrow_and_update() {
                    break;
                }
                if online.changed().await.is_err() {
                    return;
                }
            }
            let _ = sched_tx.send(SchedulerMsg::NetworkRestored { epoch }).await;
        });
        self.restart.set_network_waiter(waiter);
    }

    fn attempt_restart(&mut self) {
        if let Some(mut old) = self.stream.take() {
            old.abort();
        }

        match self.open_and_start_stream() {
            Ok(()) => {
                // the attempt counter resets when Started arrives
                self.transition(
                    Mode::Listening,
                    Some("recognition stream restarted".to_string()),
                    None,
                );
            }
            Err(e) => {
                error!(error = ?e, "stream restart failed");
                self.transition(
                    Mode::Error,
                    Some(format!("restart failed: {e}")),
                    Some(ErrorCode::RestartFailed),
                );
            }
        }
    }

    fn open_and_start_stream(&mut self) -> anyhow::Result<()> {
        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => self
                .backend
                .open(&self.config.stream_settings(), self.stream_tx.clone())?,
        };
        stream.start()?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Move to `Error`, emitting the state event, and hand the typed
    /// error back to the caller.
    fn fail(&mut self, err: StartError, code: ErrorCode) -> StartError {
        self.transition(Mode::Error, Some(err.to_string()), Some(code));
        err
    }

    /// Perform a mode transition, or emit a same-mode notice when a
    /// message or code is attached.
    fn transition(&mut self, to: Mode, message: Option<String>, code: Option<ErrorCode>) {
        if to != self.mode {
            info!(from = %self.mode, to = %to, "mode transition");
            self.mode = to;
            self.mode_tx.send_replace(to);
        } else if message.is_none() && code.is_none() {
            return;
        }

        self.emit(ControllerEvent::State(StateEvent {
            mode: to,
            message,
            code,
        }));
    }

    /// Emit a sub-state notice that does not change the mode.
    fn emit_notice(&mut self, message: &str) {
        self.emit(ControllerEvent::State(StateEvent {
            mode: self.mode,
            message: Some(message.to_string()),
            code: None,
        }));
    }

    fn emit(&self, event: ControllerEvent) {
        debug!(%event, "emitting event");
        let _ = self.events.send(event);
    }
}
