//! Generation of the viewpoints a recording session has to visit.
//!
//! Viewpoints lie on a sphere of radius `standoff_distance` around the
//! fiducial origin, on `tilt_divisions` rings of constant elevation with
//! `pan_divisions` evenly spaced azimuths each, plus one viewpoint straight
//! above the object. The first ring sits half a tilt step above the horizon so
//! that no ring falls on the pole, where azimuth is meaningless.

use crate::RecordingSettings;
use core::f64::consts::{FRAC_PI_2, TAU};
use rec_core::nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use rec_core::CameraToObject;

/// One desired viewpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
    /// Azimuth about the object z axis in radians.
    pub pan: f64,
    /// Elevation in radians; negative values look down on the object.
    pub tilt: f64,
    pub pose: CameraToObject,
}

/// The latitude/longitude grid of viewpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveGrid {
    pub pan_divisions: usize,
    pub tilt_divisions: usize,
    pub standoff_distance: f64,
}

impl PerspectiveGrid {
    pub fn new(pan_divisions: usize, tilt_divisions: usize, standoff_distance: f64) -> Self {
        Self {
            pan_divisions,
            tilt_divisions,
            standoff_distance,
        }
    }

    pub fn from_settings(settings: &RecordingSettings) -> Self {
        Self::new(
            settings.pan_divisions,
            settings.tilt_divisions,
            settings.standoff_distance,
        )
    }

    /// Number of viewpoints, including the one above the object.
    pub fn len(&self) -> usize {
        self.pan_divisions * self.tilt_divisions + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn pan_step(&self) -> f64 {
        TAU / self.pan_divisions as f64
    }

    pub fn tilt_step(&self) -> f64 {
        FRAC_PI_2 / self.tilt_divisions as f64
    }

    /// Iterates the viewpoints ring by ring, starting at the ring closest to
    /// the horizon and sweeping pan from zero, and ends with the viewpoint
    /// above the object. This order defines the slot indices.
    pub fn perspectives(&self) -> impl Iterator<Item = Perspective> + '_ {
        let pan_step = self.pan_step();
        let tilt_step = self.tilt_step();
        (0..self.tilt_divisions)
            .flat_map(move |ring| {
                let tilt = -0.5 * tilt_step - ring as f64 * tilt_step;
                (0..self.pan_divisions).map(move |column| (column as f64 * pan_step, tilt))
            })
            .chain(core::iter::once((0.0, -FRAC_PI_2)))
            .map(move |(pan, tilt)| Perspective {
                pan,
                tilt,
                pose: perspective_pose(pan, tilt, self.standoff_distance),
            })
    }
}

/// Rotation given by yaw about y, then pitch about x, then roll about z,
/// composed as `yaw * pitch * roll`.
fn yaw_pitch_roll(yaw: f64, pitch: f64, roll: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw)
        * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), pitch)
        * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), roll)
}

/// Computes the camera pose in the object frame for a viewpoint.
///
/// The camera is first pushed out along the object x axis by the standoff
/// distance and turned to look back at the origin, then tilted about y and
/// finally panned about z: `pan * tilt * standoff`.
pub fn perspective_pose(pan: f64, tilt: f64, standoff_distance: f64) -> CameraToObject {
    let standoff = Isometry3::from_parts(
        Translation3::new(standoff_distance, 0.0, 0.0),
        yaw_pitch_roll(-FRAC_PI_2, 0.0, FRAC_PI_2),
    );
    let tilt = Isometry3::from_parts(Translation3::identity(), yaw_pitch_roll(tilt, 0.0, 0.0));
    let pan = Isometry3::from_parts(Translation3::identity(), yaw_pitch_roll(0.0, 0.0, pan));
    (pan * tilt * standoff).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rec_core::Pose;

    #[test]
    fn produces_grid_plus_top_view() {
        let grid = PerspectiveGrid::new(6, 2, 0.8);
        let perspectives: Vec<_> = grid.perspectives().collect();
        assert_eq!(perspectives.len(), 13);
        assert_eq!(grid.len(), 13);

        let degenerate = PerspectiveGrid::new(1, 1, 1.0);
        assert_eq!(degenerate.perspectives().count(), 2);
    }

    #[test]
    fn sweep_order_is_ring_major() {
        let grid = PerspectiveGrid::new(6, 2, 0.8);
        let perspectives: Vec<_> = grid.perspectives().collect();
        assert_relative_eq!(perspectives[0].tilt, -(45.0f64 / 2.0).to_radians());
        assert_relative_eq!(perspectives[0].pan, 0.0);
        assert_relative_eq!(perspectives[1].pan, 60.0f64.to_radians());
        assert_relative_eq!(perspectives[6].tilt, -(45.0f64 * 1.5).to_radians());
        assert_relative_eq!(perspectives[6].pan, 0.0);
        assert_relative_eq!(perspectives[12].tilt, -FRAC_PI_2);
        assert_relative_eq!(perspectives[12].pan, 0.0);
    }

    #[test]
    fn viewpoints_lie_on_upper_hemisphere() {
        let grid = PerspectiveGrid::new(8, 3, 0.6);
        for perspective in grid.perspectives() {
            let center = perspective.pose.translation();
            assert_relative_eq!(center.norm(), 0.6, epsilon = 1e-12);
            assert!(center.z > 0.0);
        }
    }

    #[test]
    fn cameras_look_at_object_origin() {
        let grid = PerspectiveGrid::new(6, 2, 0.8);
        for perspective in grid.perspectives() {
            let heading = perspective.pose.rotation() * Vector3::z();
            let towards_origin = -perspective.pose.translation().normalize();
            assert_relative_eq!(heading, towards_origin, epsilon = 1e-12);
        }
    }

    #[test]
    fn first_viewpoint_position() {
        let pose = perspective_pose(0.0, -FRAC_PI_2 / 4.0, 0.8);
        let expected = Vector3::new(
            0.8 * (FRAC_PI_2 / 4.0).cos(),
            0.0,
            0.8 * (FRAC_PI_2 / 4.0).sin(),
        );
        assert_relative_eq!(pose.translation(), expected, epsilon = 1e-12);
    }

    #[test]
    fn top_view_is_above_origin() {
        let pose = perspective_pose(0.0, -FRAC_PI_2, 0.8);
        assert_relative_eq!(
            pose.translation(),
            Vector3::new(0.0, 0.0, 0.8),
            epsilon = 1e-12
        );
    }
}
