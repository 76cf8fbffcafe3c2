use nalgebra::Point3;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A 3d point in the sensor frame with an RGB color, as produced by a depth
/// camera. The unit of distance is meters.
///
/// Depth sensors report pixels without a depth reading as invalid points. An
/// invalid point keeps its color but all coordinates are NaN, so that it never
/// takes part in any geometric computation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ColoredPoint {
    pub position: Point3<f32>,
    pub color: [u8; 3],
}

impl ColoredPoint {
    /// Creates a point, marking it invalid if any coordinate is not finite.
    pub fn new(position: Point3<f32>, color: [u8; 3]) -> Self {
        if position.iter().all(|n| n.is_finite()) {
            Self { position, color }
        } else {
            Self::invalid(color)
        }
    }

    /// A point without a depth reading.
    pub fn invalid(color: [u8; 3]) -> Self {
        Self {
            position: Point3::new(f32::NAN, f32::NAN, f32::NAN),
            color,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.position.iter().all(|n| n.is_finite())
    }
}

/// A colored point cloud.
///
/// Organized clouds (`height > 1`) keep the row-major pixel layout of the
/// depth image they came from. Unorganized clouds have `height == 1`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PointCloud {
    pub width: u32,
    pub height: u32,
    pub points: Vec<ColoredPoint>,
}

impl PointCloud {
    pub fn unorganized(points: Vec<ColoredPoint>) -> Self {
        Self {
            width: points.len() as u32,
            height: 1,
            points,
        }
    }

    /// Creates an organized cloud. Returns `None` if the dimensions do not
    /// match the number of points.
    pub fn organized(width: u32, height: u32, points: Vec<ColoredPoint>) -> Option<Self> {
        if width as usize * height as usize == points.len() {
            Some(Self {
                width,
                height,
                points,
            })
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_organized(&self) -> bool {
        self.height > 1
    }

    /// True if there are no invalid points in the cloud.
    pub fn is_dense(&self) -> bool {
        self.points.iter().all(ColoredPoint::is_valid)
    }

    /// Retrieves the point at pixel `(u, v)` of an organized cloud.
    pub fn at(&self, u: u32, v: u32) -> Option<&ColoredPoint> {
        if u >= self.width || v >= self.height {
            return None;
        }
        self.points.get(v as usize * self.width as usize + u as usize)
    }

    /// Iterates over the points that have a depth reading.
    pub fn valid_points(&self) -> impl Iterator<Item = &ColoredPoint> + '_ {
        self.points.iter().filter(|p| p.is_valid())
    }
}
