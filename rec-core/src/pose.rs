use core::ops::Mul;
use derive_more::{AsMut, AsRef, From, Into};
use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// This trait is implemented by all the different poses in this library:
///
/// * [`ObjectToCamera`] - Transforms object points into the sensor (camera) frame
/// * [`CameraToObject`] - Transforms camera points into the object frame
/// * [`CameraToCamera`] - Transforms points from one camera frame into another camera frame
///
/// Rotations are stored as unit quaternions since marker detections deliver
/// their orientation in that form and the consensus of several detections is
/// computed on the quaternion components.
pub trait Pose: From<Isometry3<f64>> + Clone + Copy {
    type Inverse: Pose;

    /// Retrieve the isometry.
    fn isometry(self) -> Isometry3<f64>;

    /// Creates a pose with no change in position or orientation.
    fn identity() -> Self {
        Isometry3::identity().into()
    }

    /// Takes the inverse of the pose.
    fn inverse(self) -> Self::Inverse {
        self.isometry().inverse().into()
    }

    /// Create the pose from rotation and translation.
    fn from_parts(translation: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Isometry3::from_parts(translation.into(), rotation).into()
    }

    /// The translation component, which is the origin of the source frame
    /// expressed in the destination frame.
    fn translation(self) -> Vector3<f64> {
        self.isometry().translation.vector
    }

    /// The orientation component.
    fn rotation(self) -> UnitQuaternion<f64> {
        self.isometry().rotation
    }

    /// Euclidean distance between the origins of two poses.
    fn translation_distance(self, other: Self) -> f64 {
        (self.translation() - other.translation()).norm()
    }

    /// Shortest-arc angle in radians (within `[0, π]`) of the rotation that
    /// takes the orientation of `self` onto the orientation of `other`.
    ///
    /// Identical orientations yield exactly zero, including a quaternion
    /// compared with its negation.
    fn rotation_angle(self, other: Self) -> f64 {
        let (a, b) = (self.rotation().into_inner(), other.rotation().into_inner());
        if a == b || a == -b {
            return 0.0;
        }
        let relative = self.rotation().rotation_to(&other.rotation());
        2.0 * relative.imag().norm().atan2(relative.scalar().abs())
    }

    /// Transform a point from the source frame into the destination frame.
    fn transform_point(self, point: Point3<f64>) -> Point3<f64> {
        self.isometry() * point
    }
}

/// The pose of the object (the fiducial it carries) relative to the sensor.
///
/// This is what a marker detector reports: it maps points given in the object
/// frame into the camera frame.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ObjectToCamera(pub Isometry3<f64>);

impl Pose for ObjectToCamera {
    type Inverse = CameraToObject;

    #[inline(always)]
    fn isometry(self) -> Isometry3<f64> {
        self.into()
    }
}

/// The viewpoint of the sensor relative to the object.
///
/// Maps camera points into the object frame, so the translation is the
/// optical center of the camera in object coordinates. All recording targets
/// are expressed this way.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraToObject(pub Isometry3<f64>);

impl Pose for CameraToObject {
    type Inverse = ObjectToCamera;

    #[inline(always)]
    fn isometry(self) -> Isometry3<f64> {
        self.into()
    }
}

/// A relative pose that transforms points of one camera frame into the frame
/// of another camera, for instance a desired viewpoint expressed in the frame
/// of the live sensor.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraToCamera(pub Isometry3<f64>);

impl Pose for CameraToCamera {
    type Inverse = CameraToCamera;

    #[inline(always)]
    fn isometry(self) -> Isometry3<f64> {
        self.into()
    }
}

impl Mul<CameraToObject> for ObjectToCamera {
    type Output = CameraToCamera;

    /// Chains a viewpoint given in the object frame with the live object pose,
    /// yielding that viewpoint relative to the live sensor.
    fn mul(self, rhs: CameraToObject) -> CameraToCamera {
        (self.isometry() * rhs.isometry()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use core::f64::consts::FRAC_PI_2;

    fn object_pose() -> ObjectToCamera {
        ObjectToCamera::from_parts(
            Vector3::new(0.1, -0.2, 0.7),
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
        )
    }

    #[test]
    fn inverse_round_trips_to_identity() {
        let pose = object_pose();
        let viewpoint = pose.inverse();
        let chained: CameraToCamera = pose * viewpoint;
        assert_relative_eq!(
            chained.isometry(),
            Isometry3::identity(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn viewpoint_translation_is_camera_center_in_object_frame() {
        let pose = object_pose();
        let center = pose.inverse().translation();
        // The camera center maps to the camera origin.
        let origin = pose.transform_point(Point3::from(center));
        assert_relative_eq!(origin.coords, Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn rotation_angle_is_shortest_arc() {
        let a = CameraToObject::identity();
        let b = CameraToObject::from_parts(
            Vector3::zeros(),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
        );
        assert_relative_eq!(a.rotation_angle(b), FRAC_PI_2, epsilon = 1e-12);

        // The negated quaternion is the same orientation.
        let flipped = CameraToObject::from_parts(
            Vector3::zeros(),
            UnitQuaternion::new_unchecked(-b.rotation().into_inner()),
        );
        assert_eq!(b.rotation_angle(flipped), 0.0);
    }

    #[test]
    fn identical_orientation_has_zero_angle() {
        let viewpoint = object_pose().inverse();
        assert_eq!(viewpoint.rotation_angle(viewpoint), 0.0);
        let same = CameraToObject::from_parts(Vector3::new(1.0, 2.0, 3.0), viewpoint.rotation());
        assert_eq!(viewpoint.rotation_angle(same), 0.0);
    }

    #[test]
    fn translation_distance_ignores_rotation() {
        let a = CameraToObject::from_parts(Vector3::new(1.0, 0.0, 0.0), UnitQuaternion::identity());
        let b = CameraToObject::from_parts(
            Vector3::new(1.0, 3.0, 4.0),
            UnitQuaternion::from_euler_angles(1.0, 0.0, 0.0),
        );
        assert_relative_eq!(a.translation_distance(b), 5.0);
    }
}
