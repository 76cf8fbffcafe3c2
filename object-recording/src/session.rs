use crate::{
    process_frame, FrameOutcome, ImageDecodeError, PerspectiveGrid, PerspectiveSlot,
    RecordingSettings, SaveError, SettingsError, StatusEmitter, StatusSink, SynchronizedFrame,
};
use log::*;

/// Lifecycle of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// No session has been started yet.
    Idle,
    /// Frames are routed to the slots.
    Recording,
    /// The feed is detached; the slots keep their records.
    Stopped,
}

/// The slots of one capture session together with its lifecycle state.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    state: RecordingState,
    slots: Vec<PerspectiveSlot>,
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self {
            state: RecordingState::Idle,
            slots: Vec::new(),
        }
    }
}

impl RecordingSession {
    /// A recording session with one empty slot per viewpoint of the settings.
    pub fn start(settings: &RecordingSettings) -> Self {
        let slots: Vec<PerspectiveSlot> = PerspectiveGrid::from_settings(settings)
            .perspectives()
            .map(PerspectiveSlot::new)
            .collect();
        Self {
            state: RecordingState::Recording,
            slots,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn slots(&self) -> &[PerspectiveSlot] {
        &self.slots
    }

    pub fn completed_count(&self) -> usize {
        self.slots.iter().filter(|s| s.completed()).count()
    }

    /// True if every slot holds a record.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(PerspectiveSlot::completed)
    }

    pub fn into_slots(self) -> Vec<PerspectiveSlot> {
        self.slots
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StartRecordingRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StartRecordingResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopRecordingRequest {
    /// Stop even if some viewpoints have not been recorded.
    pub stop_although_model_is_incomplete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopRecordingResponse {
    pub recording_stopped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveRecordedObjectRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveRecordedObjectResponse {
    pub saved: bool,
}

/// Persists a recorded dataset. What is written and where is up to the
/// implementation.
pub trait DatasetWriter {
    fn write(&mut self, slots: &[PerspectiveSlot]) -> Result<(), SaveError>;
}

/// A writer that keeps nothing and only logs what it was given.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardWriter;

impl DatasetWriter for DiscardWriter {
    fn write(&mut self, slots: &[PerspectiveSlot]) -> Result<(), SaveError> {
        info!(
            "discarding dataset of {} perspectives ({} recorded)",
            slots.len(),
            slots.iter().filter(|s| s.completed()).count()
        );
        Ok(())
    }
}

/// Drives capture sessions: owns the settings, the current session and the
/// status output, and routes frames into the session while it records.
///
/// All control operations and frame dispatch take `&mut self`, so a frame is
/// never processed while a session is being started or stopped.
pub struct ObjectRecorder<S> {
    settings: RecordingSettings,
    session: RecordingSession,
    emitter: StatusEmitter,
    sink: S,
}

impl<S: StatusSink> ObjectRecorder<S> {
    /// Creates an idle recorder, rejecting settings no session can be built from.
    pub fn new(settings: RecordingSettings, sink: S) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            settings,
            session: RecordingSession::default(),
            emitter: StatusEmitter::new(),
            sink,
        })
    }

    pub fn settings(&self) -> &RecordingSettings {
        &self.settings
    }

    pub fn state(&self) -> RecordingState {
        self.session.state
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn slots(&self) -> &[PerspectiveSlot] {
        &self.session.slots
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Discards any previous session, generates a fresh set of viewpoints and
    /// attaches the frame feed.
    pub fn start_recording(&mut self, _: StartRecordingRequest) -> StartRecordingResponse {
        info!("request to start recording received");
        let session = RecordingSession::start(&self.settings);
        for (ix, slot) in session.slots.iter().enumerate() {
            let perspective = slot.perspective();
            debug!(
                "perspective {}: tilt={:.4} pan={:.4}",
                ix + 1,
                perspective.tilt,
                perspective.pan
            );
        }
        info!("recording {} perspectives", session.slots.len());
        self.session = session;
        StartRecordingResponse
    }

    /// Detaches the frame feed if every viewpoint is recorded or if stopping
    /// is forced. Otherwise nothing changes and the response says so.
    pub fn stop_recording(&mut self, request: StopRecordingRequest) -> StopRecordingResponse {
        info!("request to stop recording received");
        if !request.stop_although_model_is_incomplete && !self.session.is_complete() {
            info!(
                "recording not stopped since data collection is not yet complete ({} of {})",
                self.session.completed_count(),
                self.session.slots.len()
            );
            return StopRecordingResponse {
                recording_stopped: false,
            };
        }
        if self.session.state == RecordingState::Recording {
            self.session.state = RecordingState::Stopped;
        }
        info!("stopped recording");
        StopRecordingResponse {
            recording_stopped: true,
        }
    }

    /// Hands the recorded slots to the writer.
    pub fn save_recorded_object(
        &mut self,
        _: SaveRecordedObjectRequest,
        writer: &mut impl DatasetWriter,
    ) -> SaveRecordedObjectResponse {
        info!("request to save recorded data received");
        let result = if self.session.state == RecordingState::Idle {
            Err(SaveError::NoSession)
        } else {
            writer.write(&self.session.slots)
        };
        match result {
            Ok(()) => SaveRecordedObjectResponse { saved: true },
            Err(e) => {
                error!("saving recorded data failed: {}", e);
                SaveRecordedObjectResponse { saved: false }
            }
        }
    }

    /// Routes a frame into the session.
    ///
    /// Returns `None` without looking at the frame unless recording. Frames
    /// that get matched produce a status report for the sink.
    pub fn dispatch(
        &mut self,
        frame: SynchronizedFrame,
    ) -> Option<Result<FrameOutcome, ImageDecodeError>> {
        if self.session.state != RecordingState::Recording {
            return None;
        }
        let header = frame.detections.header.clone();
        let outcome = process_frame(&mut self.session.slots, &self.settings, frame);
        match &outcome {
            Ok(FrameOutcome::NoDetections) => info!("no markers detected"),
            Ok(FrameOutcome::LowSharpness {
                sharpness,
                threshold,
            }) => warn!(
                "image quality too low, discarding image with sharpness {:.3} (threshold = {:.3})",
                sharpness, threshold
            ),
            Ok(FrameOutcome::Processed { fiducial_pose, .. }) => {
                let report = self
                    .emitter
                    .report(&header, *fiducial_pose, &self.session.slots);
                self.sink.publish(&report);
            }
            Err(e) => error!("could not convert color image: {}", e),
        }
        Some(outcome)
    }

    /// Ends the recorder, handing over the last session.
    pub fn into_session(self) -> RecordingSession {
        self.session
    }
}
