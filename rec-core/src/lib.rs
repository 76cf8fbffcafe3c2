//! # Recording Core
//!
//! Common types shared by the object recording crates: directed poses between
//! an observed object and the sensor looking at it, and colored point clouds.
//!
//! Two frames matter everywhere in this workspace:
//!
//! * The **object frame**, anchored at the fiducial marker attached to (or
//!   under) the object being recorded.
//! * The **camera frame** of the sensor, with positive z pointing forwards
//!   out of the optical center.
//!
//! A marker detector tells us where the object is as seen from the camera
//! ([`ObjectToCamera`]). Recording targets are stated the other way around, as
//! where the camera should be as seen from the object ([`CameraToObject`]).
//! The two are related by [`Pose::inverse`]:
//!
//! ```text
//!          camera
//!            O  ---->  optical axis
//!             \
//!              \  CameraToObject: camera center and heading in object coordinates
//!               \
//!                #  object / fiducial
//! ```

mod point;
mod pose;

pub use nalgebra;
pub use point::*;
pub use pose::*;
