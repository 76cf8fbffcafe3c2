//! Operator feedback: after every processed frame the state of all slots is
//! rendered for a visualization sink, showing each viewpoint as a small
//! coordinate frame relative to the live sensor.

use crate::{FrameHeader, PerspectiveSlot};
use log::*;
use rec_core::nalgebra::Vector3;
use rec_core::{CameraToCamera, ObjectToCamera, Pose};
use std::time::Duration;

/// Namespace of all markers emitted by the recorder.
pub const MARKER_NAMESPACE: &str = "object_recording";

const ARROW_LENGTH: f64 = 0.2;
const SHAFT_DIAMETER: f64 = 0.01;
const HEAD_DIAMETER: f64 = 0.015;
const MARKER_LIFETIME: Duration = Duration::from_secs(1);
const ALPHA_NEEDED: f32 = 0.85;
const ALPHA_RECORDED: f32 = 0.15;

/// Status of one slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotStatus {
    pub index: usize,
    /// The viewpoint expressed in the frame of the live sensor.
    pub pose: CameraToCamera,
    /// True until the slot has recorded an observation.
    pub still_needed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerAction {
    Add,
    Delete,
}

/// One arrow of the coordinate frame drawn for a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisMarker {
    pub namespace: &'static str,
    /// `3 * slot + axis`
    pub id: usize,
    pub action: MarkerAction,
    pub pose: CameraToCamera,
    /// Arrow from the marker origin to this point, in the marker frame.
    pub end: Vector3<f64>,
    pub shaft_diameter: f64,
    pub head_diameter: f64,
    /// RGBA, each channel in `[0, 1]`.
    pub color: [f32; 4],
    pub lifetime: Duration,
}

impl AxisMarker {
    fn axis(slot: &SlotStatus, axis: usize) -> Self {
        let mut end = Vector3::zeros();
        end[axis] = ARROW_LENGTH;
        let mut color = [0.0; 4];
        color[axis] = 1.0;
        color[3] = if slot.still_needed {
            ALPHA_NEEDED
        } else {
            ALPHA_RECORDED
        };
        Self {
            namespace: MARKER_NAMESPACE,
            id: 3 * slot.index + axis,
            action: MarkerAction::Add,
            pose: slot.pose,
            end,
            shaft_diameter: SHAFT_DIAMETER,
            head_diameter: HEAD_DIAMETER,
            color,
            lifetime: MARKER_LIFETIME,
        }
    }

    fn delete(id: usize) -> Self {
        Self {
            namespace: MARKER_NAMESPACE,
            id,
            action: MarkerAction::Delete,
            pose: CameraToCamera::identity(),
            end: Vector3::zeros(),
            shaft_diameter: SHAFT_DIAMETER,
            head_diameter: HEAD_DIAMETER,
            color: [0.0; 4],
            lifetime: MARKER_LIFETIME,
        }
    }
}

/// Everything published after one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub header: FrameHeader,
    pub slots: Vec<SlotStatus>,
    pub markers: Vec<AxisMarker>,
}

impl StatusReport {
    pub fn remaining(&self) -> usize {
        self.slots.iter().filter(|s| s.still_needed).count()
    }
}

/// Receives the status after every processed frame.
pub trait StatusSink {
    fn publish(&mut self, report: &StatusReport);
}

impl<F> StatusSink for F
where
    F: FnMut(&StatusReport),
{
    fn publish(&mut self, report: &StatusReport) {
        self(report)
    }
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn publish(&mut self, _: &StatusReport) {}
}

/// Logs how many viewpoints are still missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn publish(&mut self, report: &StatusReport) {
        debug!(
            "{} of {} perspectives still needed at {} ns",
            report.remaining(),
            report.slots.len(),
            report.header.stamp_ns
        );
    }
}

/// Builds status reports, remembering how many markers the previous report
/// drew so that markers of slots that no longer exist get deleted.
#[derive(Debug, Clone, Default)]
pub struct StatusEmitter {
    previous_markers: usize,
}

impl StatusEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(
        &mut self,
        header: &FrameHeader,
        fiducial_pose: ObjectToCamera,
        slots: &[PerspectiveSlot],
    ) -> StatusReport {
        let slots: Vec<SlotStatus> = slots
            .iter()
            .enumerate()
            .map(|(index, slot)| SlotStatus {
                index,
                pose: fiducial_pose * slot.desired_pose(),
                still_needed: !slot.completed(),
            })
            .collect();
        let marker_count = 3 * slots.len();
        let mut markers: Vec<AxisMarker> = slots
            .iter()
            .flat_map(|slot| (0..3).map(move |axis| AxisMarker::axis(slot, axis)))
            .collect();
        markers.extend((marker_count..self.previous_markers).map(AxisMarker::delete));
        self.previous_markers = marker_count;
        StatusReport {
            header: header.clone(),
            slots,
            markers,
        }
    }
}
