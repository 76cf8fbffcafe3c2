use crate::ImageDecodeError;
use core::fmt;
use core::str::FromStr;
use rec_core::ObjectToCamera;

/// Acquisition time and coordinate frame of a message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameHeader {
    /// Acquisition time in nanoseconds.
    pub stamp_ns: u64,
    /// Name of the sensor frame the data is expressed in.
    pub frame_id: String,
}

/// One fiducial marker found in the color image.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDetection {
    pub label: String,
    pub id: i32,
    /// The pose of the marker (and thus the object) in the sensor frame.
    ///
    /// The quaternion is kept exactly as the detector reported it, including
    /// its sign, since detections are averaged component-wise.
    pub pose: ObjectToCamera,
    /// Detector confidence, used as a proxy for image sharpness.
    pub score: f64,
}

/// Everything the marker detector found in one image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectionList {
    pub header: FrameHeader,
    pub detections: Vec<MarkerDetection>,
}

/// Pixel layouts accepted for the color image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageEncoding {
    Rgb8,
    Bgr8,
    Rgba8,
    Bgra8,
    Mono8,
    Mono16,
}

impl ImageEncoding {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::Rgba8 | Self::Bgra8 => 4,
            Self::Mono8 => 1,
            Self::Mono16 => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rgb8 => "rgb8",
            Self::Bgr8 => "bgr8",
            Self::Rgba8 => "rgba8",
            Self::Bgra8 => "bgra8",
            Self::Mono8 => "mono8",
            Self::Mono16 => "mono16",
        }
    }
}

impl fmt::Display for ImageEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageEncoding {
    type Err = ImageDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "rgb8" => Self::Rgb8,
            "bgr8" => Self::Bgr8,
            "rgba8" => Self::Rgba8,
            "bgra8" => Self::Bgra8,
            "mono8" | "8UC1" => Self::Mono8,
            "mono16" | "16UC1" => Self::Mono16,
            other => return Err(ImageDecodeError::UnsupportedEncoding(other.to_string())),
        })
    }
}

/// A color image as it arrives from the sensor driver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    /// Encoding name such as `"bgr8"`.
    pub encoding: String,
    /// Only relevant for 16-bit encodings.
    pub is_bigendian: bool,
    /// Length of a row in bytes, including any padding.
    pub step: u32,
    pub data: Vec<u8>,
}

/// A point as laid out by depth camera drivers. `rgb` holds a packed
/// `0x00RRGGBB` integer whose bits are stored in an `f32`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PackedPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rgb: f32,
}

/// A point cloud as it arrives from the sensor driver.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawPointCloud {
    pub width: u32,
    pub height: u32,
    pub points: Vec<PackedPoint>,
}

/// Detections, cloud and image taken at approximately the same time.
///
/// Aligning the three feeds is done upstream; the recorder only ever sees
/// complete tuples.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SynchronizedFrame {
    pub detections: DetectionList,
    pub cloud: RawPointCloud,
    pub image: RawImage,
}
