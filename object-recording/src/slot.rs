//! Per-viewpoint storage of the best observation and the policy that decides
//! when a new observation replaces it.

use crate::{Perspective, RecordingSettings};
use image::RgbImage;
use log::*;
use rec_core::{CameraToObject, PointCloud, Pose};
use std::sync::Arc;

/// How far an observation may be from a viewpoint to count for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchTolerance {
    /// Meters between the camera center and the viewpoint.
    pub translation: f64,
    /// Radians between the camera heading and the viewpoint heading.
    pub orientation: f64,
}

impl MatchTolerance {
    pub fn from_settings(settings: &RecordingSettings) -> Self {
        Self {
            translation: settings.distance_threshold_translation,
            orientation: settings.distance_threshold_orientation,
        }
    }
}

/// One frame as offered to the slots.
///
/// The image and cloud are shared so that a frame matching several
/// viewpoints is stored only once.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Where the camera was, in the object frame.
    pub pose: CameraToObject,
    pub sharpness: f64,
    pub image: Arc<RgbImage>,
    pub cloud: Arc<PointCloud>,
}

/// The observation stored for a viewpoint.
#[derive(Debug, Clone)]
pub struct SlotRecord {
    pub image: Arc<RgbImage>,
    pub cloud: Arc<PointCloud>,
    pub pose: CameraToObject,
}

/// Why an observation did not replace the record of a slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    TranslationOutOfTolerance { distance: f64 },
    OrientationOutOfTolerance { angle: f64 },
    NotCloser { distance: f64, stored: f64 },
    LessSharp { sharpness: f64, stored: f64 },
}

/// A desired viewpoint and the best observation recorded for it so far.
///
/// The slot is completed exactly when it holds a record. The stored distance
/// never increases and the stored sharpness never decreases.
#[derive(Debug, Clone)]
pub struct PerspectiveSlot {
    perspective: Perspective,
    record: Option<SlotRecord>,
    distance_to_desired: f64,
    sharpness_score: f64,
}

impl PerspectiveSlot {
    pub fn new(perspective: Perspective) -> Self {
        Self {
            perspective,
            record: None,
            distance_to_desired: f64::INFINITY,
            sharpness_score: f64::NEG_INFINITY,
        }
    }

    pub fn perspective(&self) -> &Perspective {
        &self.perspective
    }

    pub fn desired_pose(&self) -> CameraToObject {
        self.perspective.pose
    }

    pub fn record(&self) -> Option<&SlotRecord> {
        self.record.as_ref()
    }

    pub fn best_image(&self) -> Option<&RgbImage> {
        self.record.as_ref().map(|r| &*r.image)
    }

    pub fn best_pointcloud(&self) -> Option<&PointCloud> {
        self.record.as_ref().map(|r| &*r.cloud)
    }

    pub fn recorded_pose(&self) -> Option<CameraToObject> {
        self.record.as_ref().map(|r| r.pose)
    }

    /// Sum of the translational (meters) and rotational (radians) deviation of
    /// the record from the viewpoint, infinite while nothing is recorded.
    pub fn distance_to_desired(&self) -> f64 {
        self.distance_to_desired
    }

    /// Sharpness of the record, negative infinity while nothing is recorded.
    pub fn sharpness_score(&self) -> f64 {
        self.sharpness_score
    }

    pub fn completed(&self) -> bool {
        self.record.is_some()
    }

    /// Decides whether the observation would replace the record, returning
    /// the combined pose distance it would be stored with.
    ///
    /// An observation must be within both tolerances, no farther from the
    /// viewpoint than the record and at least as sharp as the record. A NaN
    /// distance, angle or sharpness never passes.
    pub fn evaluate(
        &self,
        pose: CameraToObject,
        sharpness: f64,
        tolerance: &MatchTolerance,
    ) -> Result<f64, Rejection> {
        let desired = self.perspective.pose;
        let distance = desired.translation_distance(pose);
        if distance.is_nan() || distance > tolerance.translation {
            return Err(Rejection::TranslationOutOfTolerance { distance });
        }
        let angle = desired.rotation_angle(pose);
        if angle.is_nan() || angle > tolerance.orientation {
            return Err(Rejection::OrientationOutOfTolerance { angle });
        }
        let combined = distance + angle;
        if combined.is_nan() || combined > self.distance_to_desired {
            return Err(Rejection::NotCloser {
                distance: combined,
                stored: self.distance_to_desired,
            });
        }
        if sharpness.is_nan() || sharpness < self.sharpness_score {
            return Err(Rejection::LessSharp {
                sharpness,
                stored: self.sharpness_score,
            });
        }
        Ok(combined)
    }

    /// Stores the observation if it passes [`PerspectiveSlot::evaluate`].
    /// Nothing is written on rejection.
    pub fn offer(
        &mut self,
        observation: &Observation,
        tolerance: &MatchTolerance,
    ) -> Result<f64, Rejection> {
        let distance = self.evaluate(observation.pose, observation.sharpness, tolerance)?;
        self.record = Some(SlotRecord {
            image: observation.image.clone(),
            cloud: observation.cloud.clone(),
            pose: observation.pose,
        });
        self.distance_to_desired = distance;
        self.sharpness_score = observation.sharpness;
        Ok(distance)
    }
}

/// Offers the observation to every slot and returns the indices of the slots
/// that took it.
///
/// Every slot is visited even after a match: with overlapping tolerances one
/// frame may improve several viewpoints.
pub fn update_slots(
    slots: &mut [PerspectiveSlot],
    observation: &Observation,
    tolerance: &MatchTolerance,
) -> Vec<usize> {
    slots
        .iter_mut()
        .enumerate()
        .filter_map(|(ix, slot)| match slot.offer(observation, tolerance) {
            Ok(distance) => {
                debug!(
                    "recorded perspective {} at distance {:.4} with sharpness {:.3}",
                    ix, distance, observation.sharpness
                );
                Some(ix)
            }
            Err(rejection) => {
                trace!("perspective {} rejected frame: {:?}", ix, rejection);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perspective_pose;
    use approx::assert_relative_eq;
    use rec_core::nalgebra::{UnitQuaternion, Vector3};

    fn tolerance() -> MatchTolerance {
        MatchTolerance {
            translation: 0.08,
            orientation: 8.0f64.to_radians(),
        }
    }

    fn slot_at(pan: f64, tilt: f64) -> PerspectiveSlot {
        PerspectiveSlot::new(Perspective {
            pan,
            tilt,
            pose: perspective_pose(pan, tilt, 0.8),
        })
    }

    fn observation(pose: CameraToObject, sharpness: f64) -> Observation {
        Observation {
            pose,
            sharpness,
            image: Arc::new(RgbImage::new(1, 1)),
            cloud: Arc::new(PointCloud::default()),
        }
    }

    fn shifted(pose: CameraToObject, offset: Vector3<f64>) -> CameraToObject {
        CameraToObject::from_parts(pose.translation() + offset, pose.rotation())
    }

    #[test]
    fn fresh_slot_is_empty() {
        let slot = slot_at(0.0, -0.4);
        assert!(!slot.completed());
        assert!(slot.best_image().is_none());
        assert!(slot.best_pointcloud().is_none());
        assert_eq!(slot.distance_to_desired(), f64::INFINITY);
        assert_eq!(slot.sharpness_score(), f64::NEG_INFINITY);
    }

    #[test]
    fn exact_match_is_recorded_with_zero_distance() {
        let mut slot = slot_at(0.0, -0.4);
        let pose = slot.desired_pose();
        assert_eq!(slot.offer(&observation(pose, 1.0), &tolerance()), Ok(0.0));
        assert!(slot.completed());
        assert_eq!(slot.distance_to_desired(), 0.0);
        assert_eq!(slot.sharpness_score(), 1.0);
        assert_eq!(slot.recorded_pose(), Some(pose));
    }

    #[test]
    fn tolerances_are_checked_in_order() {
        let slot = slot_at(0.0, -0.4);
        let desired = slot.desired_pose();

        let far = shifted(desired, Vector3::new(0.1, 0.0, 0.0));
        assert!(matches!(
            slot.evaluate(far, 1.0, &tolerance()),
            Err(Rejection::TranslationOutOfTolerance { .. })
        ));

        let turned = CameraToObject::from_parts(
            desired.translation(),
            desired.rotation() * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.2),
        );
        match slot.evaluate(turned, 1.0, &tolerance()) {
            Err(Rejection::OrientationOutOfTolerance { angle }) => {
                assert_relative_eq!(angle, 0.2, epsilon = 1e-9)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn distance_combines_translation_and_rotation() {
        let slot = slot_at(1.0, -0.4);
        let desired = slot.desired_pose();
        let pose = CameraToObject::from_parts(
            desired.translation() + Vector3::new(0.0, 0.03, 0.04),
            desired.rotation() * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.1),
        );
        let distance = slot.evaluate(pose, 1.0, &tolerance()).unwrap();
        assert_relative_eq!(distance, 0.05 + 0.1, epsilon = 1e-9);
    }

    #[test]
    fn farther_observation_does_not_replace() {
        let mut slot = slot_at(0.0, -0.4);
        let desired = slot.desired_pose();
        slot.offer(
            &observation(shifted(desired, Vector3::new(0.01, 0.0, 0.0)), 0.9),
            &tolerance(),
        )
        .unwrap();
        let result = slot.offer(
            &observation(shifted(desired, Vector3::new(0.02, 0.0, 0.0)), 1.0),
            &tolerance(),
        );
        assert!(matches!(result, Err(Rejection::NotCloser { .. })));
        assert_relative_eq!(slot.distance_to_desired(), 0.01, epsilon = 1e-12);
        assert_eq!(slot.sharpness_score(), 0.9);
    }

    #[test]
    fn closer_but_blurrier_observation_does_not_replace() {
        let mut slot = slot_at(0.0, -0.4);
        let desired = slot.desired_pose();
        slot.offer(
            &observation(shifted(desired, Vector3::new(0.02, 0.0, 0.0)), 0.95),
            &tolerance(),
        )
        .unwrap();
        let result = slot.offer(&observation(desired, 0.9), &tolerance());
        assert!(matches!(result, Err(Rejection::LessSharp { .. })));
        assert_relative_eq!(slot.distance_to_desired(), 0.02, epsilon = 1e-12);
    }

    #[test]
    fn equal_distance_and_sharper_replaces() {
        let mut slot = slot_at(0.0, -0.4);
        let desired = slot.desired_pose();
        slot.offer(&observation(desired, 0.85), &tolerance()).unwrap();
        assert_eq!(slot.offer(&observation(desired, 0.95), &tolerance()), Ok(0.0));
        assert_eq!(slot.sharpness_score(), 0.95);
    }

    #[test]
    fn nan_observations_are_rejected() {
        let mut slot = slot_at(0.0, -0.4);
        let desired = slot.desired_pose();
        assert!(matches!(
            slot.offer(&observation(desired, f64::NAN), &tolerance()),
            Err(Rejection::LessSharp { .. })
        ));
        let lost = shifted(desired, Vector3::new(f64::NAN, 0.0, 0.0));
        assert!(matches!(
            slot.offer(&observation(lost, 1.0), &tolerance()),
            Err(Rejection::TranslationOutOfTolerance { .. })
        ));
        let spun = CameraToObject::from_parts(
            desired.translation(),
            UnitQuaternion::new_unchecked(desired.rotation().into_inner() * f64::NAN),
        );
        assert!(matches!(
            slot.offer(&observation(spun, 1.0), &tolerance()),
            Err(Rejection::OrientationOutOfTolerance { .. })
        ));
        assert!(!slot.completed());
        assert_eq!(slot.sharpness_score(), f64::NEG_INFINITY);
    }

    #[test]
    fn one_observation_updates_every_matching_slot() {
        let tolerance = MatchTolerance {
            translation: 1.0,
            orientation: 1.0,
        };
        let mut slots = vec![slot_at(0.0, -0.4), slot_at(0.3, -0.4), slot_at(3.0, -0.4)];
        let between = perspective_pose(0.15, -0.4, 0.8);
        let updated = update_slots(&mut slots, &observation(between, 1.0), &tolerance);
        assert_eq!(updated, vec![0, 1]);
        assert!(slots[0].completed() && slots[1].completed() && !slots[2].completed());
        // Both records share the same snapshot.
        assert!(Arc::ptr_eq(
            &slots[0].record().unwrap().image,
            &slots[1].record().unwrap().image
        ));
    }
}
