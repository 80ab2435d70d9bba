use tracing::debug;

use crate::cornerness::{CornernessDetector, HarrisDetector, ResponseMap};
use crate::config::CornerConfig;
use crate::error::Result;
use crate::photo::Photo;

/// Upper bound of the normalized cornerness range.
pub const NORMALIZED_MAX: f64 = 255.0;

/// An integer pixel position reported as a corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CornerPoint {
    pub x: usize,
    pub y: usize,
}

impl CornerPoint {
    pub fn new(x: usize, y: usize) -> Self {
        CornerPoint { x, y }
    }
}

/// Turns a photo into a list of corner positions by thresholding a normalized
/// cornerness response.
///
/// There is no non-maximum suppression: a strong feature typically yields a small cluster
/// of adjacent corners.
pub struct CornerExtractor {
    detector: Box<dyn CornernessDetector>,
    threshold: f32,
}

impl CornerExtractor {
    /// Creates an extractor backed by a [HarrisDetector] built from `config.harris`.
    ///
    /// # Errors
    /// Returns [crate::StitchError::InvalidConfig] if `config` does not validate.
    pub fn new(config: &CornerConfig) -> Result<Self> {
        config.validate()?;
        Ok(CornerExtractor {
            detector: Box::new(HarrisDetector::new(config.harris)?),
            threshold: config.threshold,
        })
    }

    /// Creates an extractor around any cornerness implementation.
    pub fn with_detector(detector: Box<dyn CornernessDetector>, threshold: f32) -> Self {
        CornerExtractor { detector, threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Extracts corners from `photo` using the configured threshold.
    pub fn extract(&self, photo: &Photo) -> Vec<CornerPoint> {
        self.extract_corners(photo, self.threshold)
    }

    /// Converts `photo` to grayscale, computes its cornerness response, normalizes it to
    /// `[0, 255]` and returns every pixel whose truncated normalized score is strictly
    /// greater than `threshold`, in row-major order.
    ///
    /// An empty or flat response yields no corners.
    pub fn extract_corners(&self, photo: &Photo, threshold: f32) -> Vec<CornerPoint> {
        let gray = photo.to_grayscale();
        let response = self.detector.response(&gray);

        if response.width != photo.width || response.height != photo.height {
            debug!(
                "cornerness map is {}x{} for a {}x{} photo, ignoring it",
                response.width, response.height, photo.width, photo.height
            );
            return Vec::new();
        }

        corners_above_threshold(&response, threshold)
    }
}

/// Normalizes `response` to `[0, NORMALIZED_MAX]` and keeps the pixels whose truncated score
/// exceeds `threshold`.
pub fn corners_above_threshold(response: &ResponseMap, threshold: f32) -> Vec<CornerPoint> {
    if response.min_max().map_or(true, |(min, max)| min == max) {
        debug!(
            "cornerness map of {}x{} is empty or flat, no corners",
            response.width, response.height
        );
        return Vec::new();
    }

    let normalized = response.normalized(0.0, NORMALIZED_MAX);
    let threshold = threshold as f64;

    let mut corners = Vec::new();
    for y in 0..normalized.height {
        for x in 0..normalized.width {
            if normalized.get(x, y).trunc() > threshold {
                corners.push(CornerPoint::new(x, y));
            }
        }
    }
    corners
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports a fixed map regardless of the photo.
    struct FixedResponse(ResponseMap);

    impl CornernessDetector for FixedResponse {
        fn response(&self, _gray: &Photo) -> ResponseMap {
            self.0.clone()
        }
    }

    fn peaks_map() -> ResponseMap {
        let mut values = vec![0.0; 10 * 8];
        values[2 * 10 + 3] = 100.0;
        values[5 * 10 + 7] = 90.0;
        values[6 * 10 + 1] = 10.0;
        ResponseMap::from_values(10, 8, values).unwrap()
    }

    #[test]
    fn keeps_pixels_above_normalized_threshold_in_row_major_order() {
        let corners = corners_above_threshold(&peaks_map(), 200.0);
        assert_eq!(corners, vec![CornerPoint::new(3, 2), CornerPoint::new(7, 5)]);
    }

    #[test]
    fn threshold_compares_truncated_scores() {
        // 90 / 100 * 255 = 229.5, truncated to 229.
        let corners = corners_above_threshold(&peaks_map(), 229.0);
        assert_eq!(corners, vec![CornerPoint::new(3, 2)]);
        let corners = corners_above_threshold(&peaks_map(), 228.5);
        assert_eq!(corners.len(), 2);
    }

    #[test]
    fn uniform_photo_yields_no_corners() {
        let extractor = CornerExtractor::new(&CornerConfig::default()).unwrap();
        let photo = Photo::filled(32, 24, 3, 128);
        for threshold in [0.0, 0.5, 1.0, 120.0, 254.0] {
            assert!(extractor.extract_corners(&photo, threshold).is_empty());
        }
    }

    #[test]
    fn empty_photo_yields_no_corners() {
        let extractor = CornerExtractor::new(&CornerConfig::default()).unwrap();
        assert!(extractor.extract(&Photo::default()).is_empty());
    }

    #[test]
    fn unsupported_aperture_is_rejected() {
        let mut config = CornerConfig::default();
        config.harris.aperture_size = 4;
        assert!(matches!(
            CornerExtractor::new(&config),
            Err(crate::StitchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn mismatched_response_size_yields_no_corners() {
        let extractor = CornerExtractor::with_detector(Box::new(FixedResponse(peaks_map())), 0.0);
        assert!(extractor.extract(&Photo::filled(4, 4, 1, 0)).is_empty());
    }

    #[test]
    fn pluggable_detector_drives_extraction() {
        let extractor = CornerExtractor::with_detector(Box::new(FixedResponse(peaks_map())), 200.0);
        let corners = extractor.extract(&Photo::filled(10, 8, 1, 0));
        assert_eq!(corners, vec![CornerPoint::new(3, 2), CornerPoint::new(7, 5)]);
    }

    #[test]
    fn harris_finds_the_corners_of_a_square() {
        let mut photo = Photo::filled(30, 30, 1, 0);
        for y in 10..20 {
            for x in 10..20 {
                photo.set_pixel(x, y, &[255]);
            }
        }
        let extractor = CornerExtractor::new(&CornerConfig::default()).unwrap();
        let corners = extractor.extract(&photo);

        assert!(!corners.is_empty());
        let near = |cx: usize, cy: usize| {
            corners
                .iter()
                .any(|c| c.x.abs_diff(cx) <= 2 && c.y.abs_diff(cy) <= 2)
        };
        assert!(near(10, 10));
        assert!(near(19, 10));
        assert!(near(10, 19));
        assert!(near(19, 19));
        assert!(corners.iter().all(|c| !(c.x.abs_diff(15) <= 2 && c.y.abs_diff(15) <= 2)));

        // A stricter threshold leaves one pixel per square corner.
        let strict = extractor.extract_corners(&photo, 200.0);
        assert_eq!(
            strict,
            vec![
                CornerPoint::new(11, 11),
                CornerPoint::new(19, 11),
                CornerPoint::new(11, 19),
                CornerPoint::new(19, 19),
            ]
        );
    }
}
