//! Fixed five-point sample pattern.

use crate::error::InvalidDimensions;
use crate::types::SamplePoint;

/// Number of points in the sample pattern.
pub const SAMPLE_COUNT: usize = 5;

/// Compute the sample points for an image of the given size.
///
/// The pattern is the image centre followed by the centres of the four
/// quadrants (top-left, top-right, bottom-left, bottom-right), all using
/// floor division. The result depends on nothing but the dimensions.
pub fn compute_sample_points(
    width: u32,
    height: u32,
) -> Result<[SamplePoint; SAMPLE_COUNT], InvalidDimensions> {
    if width == 0 || height == 0 {
        return Err(InvalidDimensions { width, height });
    }

    let quarter = |n: u32| n / 4;
    // 3n can overflow u32 for very large n
    let three_quarters = |n: u32| ((3 * n as u64) / 4) as u32;

    Ok([
        SamplePoint::new(width / 2, height / 2),
        SamplePoint::new(quarter(width), quarter(height)),
        SamplePoint::new(three_quarters(width), quarter(height)),
        SamplePoint::new(quarter(width), three_quarters(height)),
        SamplePoint::new(three_quarters(width), three_quarters(height)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pattern_order() {
        let points = compute_sample_points(100, 40).unwrap();
        assert_eq!(
            points,
            [
                SamplePoint::new(50, 20),
                SamplePoint::new(25, 10),
                SamplePoint::new(75, 10),
                SamplePoint::new(25, 30),
                SamplePoint::new(75, 30),
            ]
        );
    }

    #[test]
    fn test_floor_division() {
        let points = compute_sample_points(7, 5).unwrap();
        assert_eq!(points[0], SamplePoint::new(3, 2));
        assert_eq!(points[1], SamplePoint::new(1, 1));
        assert_eq!(points[4], SamplePoint::new(5, 3));
    }

    #[test]
    fn test_points_inside_image() {
        for w in 2..40 {
            for h in 2..40 {
                for p in compute_sample_points(w, h).unwrap() {
                    assert!(p.x < w && p.y < h, "{p} outside {w}x{h}");
                }
            }
        }
    }

    #[test]
    fn test_single_pixel_image() {
        let points = compute_sample_points(1, 1).unwrap();
        assert!(points.iter().all(|p| *p == SamplePoint::new(0, 0)));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            compute_sample_points(4032, 3024).unwrap(),
            compute_sample_points(4032, 3024).unwrap()
        );
    }

    #[test]
    fn test_huge_dimensions_do_not_overflow() {
        let points = compute_sample_points(u32::MAX, u32::MAX).unwrap();
        assert!(points[4].x < u32::MAX);
        assert_eq!(points[4].x, ((3 * u32::MAX as u64) / 4) as u32);
    }

    #[test]
    fn test_zero_dimensions() {
        assert_eq!(
            compute_sample_points(0, 10),
            Err(InvalidDimensions { width: 0, height: 10 })
        );
        assert!(compute_sample_points(10, 0).is_err());
        assert!(compute_sample_points(0, 0).is_err());
    }
}
