//! # Object Recording
//!
//! Collects a multi-view dataset of an object that sits on (or carries) a
//! fiducial marker. A set of desired viewpoints is laid out on a sphere around
//! the object; while a sensor moves around it, every synchronized frame of
//! marker detections, color image and point cloud is turned into a camera
//! viewpoint and offered to every desired viewpoint. Each viewpoint keeps the
//! single best frame it has seen: a frame replaces the stored one only if it
//! is at least as close to the viewpoint and at least as sharp.
//!
//! The pipeline for one frame is:
//!
//! 1. Drop the frame if no marker was detected.
//! 2. Convert the image to RGB and the cloud to a [`PointCloud`](rec_core::PointCloud).
//! 3. Average the detections into one object pose ([`consensus_pose`]).
//! 4. Drop the frame if the mean detection score is below the threshold.
//! 5. Offer the inverted pose to every slot ([`update_slots`]).
//! 6. Publish the slot status ([`StatusEmitter`]).
//!
//! [`ObjectRecorder`] wraps this in the start / stop / save lifecycle.

mod consensus;
mod error;
mod feedback;
mod frame;
mod intake;
mod perspective;
mod process;
mod session;
mod settings;
mod slot;

pub use consensus::*;
pub use error::*;
pub use feedback::*;
pub use frame::*;
pub use intake::*;
pub use perspective::*;
pub use process::*;
pub use session::*;
pub use settings::*;
pub use slot::*;

pub use rec_core;
