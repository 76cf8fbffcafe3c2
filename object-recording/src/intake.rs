//! Conversion of raw sensor messages into the canonical in-memory types and
//! the quality score that decides whether a frame is worth looking at.

use crate::{ImageDecodeError, ImageEncoding, MarkerDetection, RawImage, RawPointCloud};
use image::{ImageBuffer, Rgb, RgbImage};
use log::*;
use rec_core::nalgebra::Point3;
use rec_core::{ColoredPoint, PointCloud};

/// Converts a color image of any supported encoding into 8-bit RGB.
pub fn convert_image(raw: &RawImage) -> Result<RgbImage, ImageDecodeError> {
    let encoding: ImageEncoding = raw.encoding.parse()?;
    let bpp = encoding.bytes_per_pixel() as usize;
    let step = raw.step as usize;
    let oversized = || ImageDecodeError::Oversized {
        width: raw.width,
        height: raw.height,
        step: raw.step,
    };
    let row_bytes = (raw.width as usize)
        .checked_mul(bpp)
        .ok_or_else(oversized)?;
    if step < row_bytes {
        return Err(ImageDecodeError::InvalidStep {
            step: raw.step,
            row_bytes,
        });
    }
    let expected = step
        .checked_mul(raw.height as usize)
        .ok_or_else(oversized)?;
    if raw.data.len() < expected {
        return Err(ImageDecodeError::Truncated {
            expected,
            actual: raw.data.len(),
        });
    }

    Ok(ImageBuffer::from_fn(raw.width, raw.height, |x, y| {
        let start = y as usize * step + x as usize * bpp;
        let px = &raw.data[start..start + bpp];
        match encoding {
            ImageEncoding::Rgb8 | ImageEncoding::Rgba8 => Rgb([px[0], px[1], px[2]]),
            ImageEncoding::Bgr8 | ImageEncoding::Bgra8 => Rgb([px[2], px[1], px[0]]),
            ImageEncoding::Mono8 => Rgb([px[0]; 3]),
            ImageEncoding::Mono16 => {
                let high = if raw.is_bigendian { px[0] } else { px[1] };
                Rgb([high; 3])
            }
        }
    }))
}

/// Splits a packed `0x00RRGGBB` color stored in the bits of an `f32`.
pub fn unpack_rgb(rgb: f32) -> [u8; 3] {
    let bits = rgb.to_bits();
    [(bits >> 16) as u8, (bits >> 8) as u8, bits as u8]
}

/// Inverse of [`unpack_rgb`].
pub fn pack_rgb([r, g, b]: [u8; 3]) -> f32 {
    f32::from_bits(u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b))
}

/// Converts a driver point cloud into a [`PointCloud`].
///
/// This never fails. Points with non-finite coordinates become invalid
/// points, and a cloud whose dimensions disagree with its point count is
/// kept as an unorganized cloud.
pub fn convert_point_cloud(raw: &RawPointCloud) -> PointCloud {
    let points: Vec<ColoredPoint> = raw
        .points
        .iter()
        .map(|p| ColoredPoint::new(Point3::new(p.x, p.y, p.z), unpack_rgb(p.rgb)))
        .collect();
    if raw.width as usize * raw.height as usize == points.len() {
        PointCloud {
            width: raw.width,
            height: raw.height,
            points,
        }
    } else {
        warn!(
            "point cloud claims {} x {} points but carries {}, treating it as unorganized",
            raw.width,
            raw.height,
            points.len()
        );
        PointCloud::unorganized(points)
    }
}

/// Mean detection score of a frame, or `None` if nothing was detected.
pub fn mean_score(detections: &[MarkerDetection]) -> Option<f64> {
    if detections.is_empty() {
        None
    } else {
        Some(detections.iter().map(|d| d.score).sum::<f64>() / detections.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PackedPoint;
    use rec_core::{ObjectToCamera, Pose};

    fn raw(encoding: &str, width: u32, height: u32, step: u32, data: Vec<u8>) -> RawImage {
        RawImage {
            width,
            height,
            encoding: encoding.to_string(),
            is_bigendian: false,
            step,
            data,
        }
    }

    #[test]
    fn bgr_is_swapped_to_rgb() {
        let image = convert_image(&raw("bgr8", 2, 1, 6, vec![1, 2, 3, 4, 5, 6])).unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgb([3, 2, 1]));
        assert_eq!(image.get_pixel(1, 0), &Rgb([6, 5, 4]));
    }

    #[test]
    fn row_padding_is_skipped() {
        // 1 pixel per row, 2 bytes of padding after each row.
        let data = vec![10, 20, 30, 0, 0, 40, 50, 60, 0, 0];
        let image = convert_image(&raw("rgb8", 1, 2, 5, data)).unwrap();
        assert_eq!(image.get_pixel(0, 1), &Rgb([40, 50, 60]));
    }

    #[test]
    fn mono16_keeps_high_byte() {
        let image = convert_image(&raw("mono16", 1, 1, 2, vec![0x34, 0x12])).unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgb([0x12; 3]));
    }

    #[test]
    fn rejects_unsupported_and_malformed_images() {
        assert_eq!(
            convert_image(&raw("yuv422", 1, 1, 2, vec![0, 0])).unwrap_err(),
            ImageDecodeError::UnsupportedEncoding("yuv422".to_string())
        );
        assert_eq!(
            convert_image(&raw("rgb8", 2, 1, 4, vec![0; 8])).unwrap_err(),
            ImageDecodeError::InvalidStep {
                step: 4,
                row_bytes: 6
            }
        );
        // A row this wide wraps around in 32 bits and passes a small step.
        assert_eq!(
            convert_image(&raw("rgb8", 0x5555_5556, 1, 2, vec![0, 0])).unwrap_err(),
            ImageDecodeError::InvalidStep {
                step: 2,
                row_bytes: 3 * 0x5555_5556
            }
        );
        assert_eq!(
            convert_image(&raw("rgb8", 2, 2, 6, vec![0; 8])).unwrap_err(),
            ImageDecodeError::Truncated {
                expected: 12,
                actual: 8
            }
        );
    }

    #[test]
    fn packed_colors_unpack() {
        assert_eq!(unpack_rgb(pack_rgb([200, 100, 50])), [200, 100, 50]);
        assert_eq!(unpack_rgb(f32::from_bits(0x00ff_8001)), [0xff, 0x80, 0x01]);
    }

    #[test]
    fn malformed_points_are_tolerated() {
        let cloud = convert_point_cloud(&RawPointCloud {
            width: 3,
            height: 1,
            points: vec![
                PackedPoint {
                    x: 0.0,
                    y: 0.0,
                    z: 1.0,
                    rgb: pack_rgb([1, 2, 3]),
                },
                PackedPoint {
                    x: f32::NAN,
                    y: 0.0,
                    z: 1.0,
                    rgb: 0.0,
                },
                PackedPoint {
                    x: 0.0,
                    y: f32::NEG_INFINITY,
                    z: 1.0,
                    rgb: 0.0,
                },
            ],
        });
        assert_eq!(cloud.len(), 3);
        assert_eq!(cloud.valid_points().count(), 1);
        assert_eq!(cloud.points[0].color, [1, 2, 3]);
    }

    #[test]
    fn inconsistent_dimensions_become_unorganized() {
        let cloud = convert_point_cloud(&RawPointCloud {
            width: 4,
            height: 4,
            points: vec![PackedPoint::default(); 5],
        });
        assert_eq!((cloud.width, cloud.height), (5, 1));
    }

    #[test]
    fn mean_of_scores() {
        let detection = |score| MarkerDetection {
            label: "tag".to_string(),
            id: 0,
            pose: ObjectToCamera::identity(),
            score,
        };
        assert_eq!(mean_score(&[]), None);
        assert_eq!(mean_score(&[detection(0.5), detection(1.0)]), Some(0.75));
    }
}
