use nalgebra::Vector2;
use tracing::debug;

use crate::corner_extractor::CornerPoint;
use crate::error::{Result, StitchError};
use crate::feature_matcher::Match;

/// Integer displacement between two photos laid out side by side.
///
/// `dx` is how far the second photo's matched features sit to the right of the first photo's,
/// once the second photo is placed immediately right of the first one; in a left-to-right
/// panorama this is the width of the overlap. `dy` is how far the first photo's features sit
/// below the second photo's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranslationOffset {
    pub dx: i64,
    pub dy: i64,
}

impl TranslationOffset {
    pub fn new(dx: i64, dy: i64) -> Self {
        TranslationOffset { dx, dy }
    }
}

/// Mean position of the matched corners of each photo, with the second photo's corners
/// shifted right by the width of the first photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCentroids {
    pub mean_a: Vector2<f64>,
    pub mean_b: Vector2<f64>,
}

impl MatchCentroids {
    /// Both means rounded to the nearest pixel, halves going to the even neighbour.
    pub fn rounded(&self) -> (Vector2<i64>, Vector2<i64>) {
        let round = |v: &Vector2<f64>| {
            Vector2::new(v.x.round_ties_even() as i64, v.y.round_ties_even() as i64)
        };
        (round(&self.mean_a), round(&self.mean_b))
    }
}

/// Averages the matched corners of each photo.
///
/// # Errors
/// - [StitchError::EmptyMatches] when `matches` is empty.
/// - [StitchError::InvalidInput] when a match refers to a corner that does not exist.
pub fn match_centroids(
    matches: &[Match],
    corners: [&[CornerPoint]; 2],
    image_a_width: usize,
) -> Result<MatchCentroids> {
    if matches.is_empty() {
        return Err(StitchError::EmptyMatches);
    }

    let shift = Vector2::new(image_a_width as f64, 0.0);
    let mut sum_a = Vector2::<f64>::zeros();
    let mut sum_b = Vector2::<f64>::zeros();

    for m in matches {
        let (a, b) = match (corners[0].get(m.index_a), corners[1].get(m.index_b)) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(StitchError::InvalidInput(format!(
                    "match ({}, {}) refers to a missing corner ({} and {} corners available)",
                    m.index_a,
                    m.index_b,
                    corners[0].len(),
                    corners[1].len()
                )))
            }
        };
        sum_a += Vector2::new(a.x as f64, a.y as f64);
        sum_b += Vector2::new(b.x as f64, b.y as f64) + shift;
    }

    let count = matches.len() as f64;
    Ok(MatchCentroids {
        mean_a: sum_a / count,
        mean_b: sum_b / count,
    })
}

/// Estimates the translation between two photos from their confirmed matches.
///
/// The matched corners of each photo are averaged (the second photo's shifted right by
/// `image_a_width`), both means are rounded to whole pixels (halves to even), and
/// `dx = mean_b.x - mean_a.x`, `dy = mean_a.y - mean_b.y`.
///
/// # Errors
/// Fails with [StitchError::EmptyMatches] instead of producing an offset when there is
/// nothing to average.
pub fn estimate_offset(
    matches: &[Match],
    corners: [&[CornerPoint]; 2],
    image_a_width: usize,
) -> Result<TranslationOffset> {
    let centroids = match_centroids(matches, corners, image_a_width)?;
    let (mean_a, mean_b) = centroids.rounded();
    let offset = TranslationOffset::new(mean_b.x - mean_a.x, mean_a.y - mean_b.y);
    debug!(
        "offset ({}, {}) from {} matches, centroids {:?} and {:?}",
        offset.dx, offset.dy, matches.len(), mean_a, mean_b
    );
    Ok(offset)
}
