use crate::MarkerDetection;
use log::*;
use rec_core::nalgebra::{Quaternion, UnitQuaternion, Vector3};
use rec_core::{ObjectToCamera, Pose};

/// Norm below which an averaged quaternion has no usable direction.
const DEGENERATE_QUATERNION_NORM: f64 = 1e-6;

/// Reduces simultaneous detections of markers on the same rigid object to a
/// single object pose.
///
/// Translations are averaged, and so are the raw quaternion components, which
/// are then renormalized. Averaging quaternion components is only a good
/// approximation while the orientations are close to each other, which holds
/// for markers that sit on one object and are seen in the same image.
///
/// Returns `None` if there are no detections. A single detection is returned
/// unchanged.
pub fn consensus_pose(detections: &[MarkerDetection]) -> Option<ObjectToCamera> {
    let (first, rest) = detections.split_first()?;
    if rest.is_empty() {
        return Some(first.pose);
    }

    let count = detections.len() as f64;
    let (translation_sum, orientation_sum) = detections.iter().fold(
        (Vector3::zeros(), Quaternion::new(0.0, 0.0, 0.0, 0.0)),
        |(t, q), detection| {
            (
                t + detection.pose.translation(),
                q + detection.pose.rotation().into_inner(),
            )
        },
    );
    let translation = translation_sum / count;
    let orientation = UnitQuaternion::try_new(orientation_sum / count, DEGENERATE_QUATERNION_NORM)
        .unwrap_or_else(|| {
            warn!(
                "orientations of {} detections cancel out, keeping the orientation of marker {}",
                detections.len(),
                first.id
            );
            first.pose.rotation()
        });
    Some(ObjectToCamera::from_parts(translation, orientation))
}
