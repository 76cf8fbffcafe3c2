use crate::{
    consensus_pose, convert_image, convert_point_cloud, mean_score, update_slots,
    ImageDecodeError, MatchTolerance, Observation, PerspectiveSlot, RecordingSettings,
    SynchronizedFrame,
};
use log::*;
use rec_core::{ObjectToCamera, Pose};
use std::sync::Arc;

/// What became of a frame that reached the recorder.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// No marker was detected, so the object pose is unknown.
    NoDetections,
    /// The mean detection score was below the sharpness threshold.
    LowSharpness { sharpness: f64, threshold: f64 },
    /// The frame was matched against every slot.
    Processed {
        sharpness: f64,
        /// Consensus pose of the object in the sensor frame.
        fiducial_pose: ObjectToCamera,
        /// Indices of the slots that now hold this frame.
        updated: Vec<usize>,
    },
}

impl FrameOutcome {
    pub fn updated(&self) -> &[usize] {
        match self {
            Self::Processed { updated, .. } => updated,
            _ => &[],
        }
    }
}

/// Runs one synchronized frame through intake, pose estimation and slot
/// matching.
///
/// Dropping a frame never touches the slots. An image that cannot be
/// converted is reported as an error so the caller can log it.
pub fn process_frame(
    slots: &mut [PerspectiveSlot],
    settings: &RecordingSettings,
    frame: SynchronizedFrame,
) -> Result<FrameOutcome, ImageDecodeError> {
    let SynchronizedFrame {
        detections,
        cloud,
        image,
    } = frame;
    let detections = detections.detections;
    let fiducial_pose = match consensus_pose(&detections) {
        Some(pose) => pose,
        None => return Ok(FrameOutcome::NoDetections),
    };

    let image = convert_image(&image)?;
    let cloud = convert_point_cloud(&cloud);

    // The list is not empty, so there is a mean.
    let sharpness = mean_score(&detections).unwrap_or(f64::NEG_INFINITY);
    if sharpness.is_nan() || sharpness < settings.sharpness_threshold {
        return Ok(FrameOutcome::LowSharpness {
            sharpness,
            threshold: settings.sharpness_threshold,
        });
    }

    let observation = Observation {
        pose: fiducial_pose.inverse(),
        sharpness,
        image: Arc::new(image),
        cloud: Arc::new(cloud),
    };
    let updated = update_slots(slots, &observation, &MatchTolerance::from_settings(settings));
    if !updated.is_empty() {
        info!(
            "frame with sharpness {:.3} recorded for perspectives {:?}",
            sharpness, updated
        );
    }
    Ok(FrameOutcome::Processed {
        sharpness,
        fiducial_pose,
        updated,
    })
}
