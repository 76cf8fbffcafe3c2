use crate::SettingsError;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The settings for a recording session.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RecordingSettings {
    /// Frames whose mean detection score is below this are discarded
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_sharpness_threshold")
    )]
    pub sharpness_threshold: f64,
    /// Number of viewpoints around the object on each tilt ring
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_pan_divisions"))]
    pub pan_divisions: usize,
    /// Number of tilt rings between the horizon and the top of the object
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_tilt_divisions")
    )]
    pub tilt_divisions: usize,
    /// Distance in meters from the fiducial origin at which every viewpoint is placed
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_standoff_distance")
    )]
    pub standoff_distance: f64,
    /// Maximum distance in meters between the camera center and a viewpoint for a match
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_distance_threshold_translation")
    )]
    pub distance_threshold_translation: f64,
    /// Maximum angle in radians between the camera heading and a viewpoint for a match
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_distance_threshold_orientation")
    )]
    pub distance_threshold_orientation: f64,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            sharpness_threshold: default_sharpness_threshold(),
            pan_divisions: default_pan_divisions(),
            tilt_divisions: default_tilt_divisions(),
            standoff_distance: default_standoff_distance(),
            distance_threshold_translation: default_distance_threshold_translation(),
            distance_threshold_orientation: default_distance_threshold_orientation(),
        }
    }
}

impl RecordingSettings {
    /// Number of viewpoints a session with these settings has to record.
    pub fn perspective_count(&self) -> usize {
        self.pan_divisions * self.tilt_divisions + 1
    }

    /// Checks that a session can be built from these settings.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.pan_divisions == 0 {
            return Err(SettingsError::ZeroDivisions("pan_divisions"));
        }
        if self.tilt_divisions == 0 {
            return Err(SettingsError::ZeroDivisions("tilt_divisions"));
        }
        if !(self.standoff_distance.is_finite() && self.standoff_distance > 0.0) {
            return Err(SettingsError::InvalidStandoffDistance(
                self.standoff_distance,
            ));
        }
        for (name, value) in [
            ("sharpness_threshold", self.sharpness_threshold),
            (
                "distance_threshold_translation",
                self.distance_threshold_translation,
            ),
            (
                "distance_threshold_orientation",
                self.distance_threshold_orientation,
            ),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(SettingsError::InvalidThreshold { name, value });
            }
        }
        Ok(())
    }
}

fn default_sharpness_threshold() -> f64 {
    0.8
}

fn default_pan_divisions() -> usize {
    6
}

fn default_tilt_divisions() -> usize {
    2
}

fn default_standoff_distance() -> f64 {
    0.8
}

fn default_distance_threshold_translation() -> f64 {
    0.08
}

fn default_distance_threshold_orientation() -> f64 {
    8.0f64.to_radians()
}
