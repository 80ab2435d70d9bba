use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use pixelstitch::corner_extractor::CornerPoint;
use pixelstitch::feature_matcher::Match;
use pixelstitch::photo::Photo;
use pixelstitch::translation_estimator::match_centroids;
use pixelstitch::StageObserver;
use tracing::{info, warn};

const CORNER_COLOR: Rgb<u8> = Rgb([255, 10, 10]);
const MATCH_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const MEAN_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const CORNER_RADIUS: i32 = 5;
const MEAN_RADIUS: i32 = 100;

/// Writes an image per pipeline stage into a directory:
///
/// - `corners_1.png`, `corners_2.png`: each input with a circle around every corner.
/// - `matches.png`: both inputs side by side, a line per confirmed match and a large circle
///   around the mean position of the matched corners of each input.
/// - `stitched.png`: the final canvas.
///
/// Hooks cannot fail, so the first write error is kept and reported by [DebugOverlay::finish].
pub struct DebugOverlay {
    dir: PathBuf,
    error: Option<anyhow::Error>,
}

impl DebugOverlay {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Could not create debug directory {}", dir.display()))?;
        Ok(DebugOverlay {
            dir: dir.to_path_buf(),
            error: None,
        })
    }

    /// Returns the first error hit while writing overlays, if any.
    pub fn finish(self) -> Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn save(&mut self, img: &RgbImage, name: &str) {
        if self.error.is_some() {
            return;
        }
        let path = self.dir.join(name);
        info!("Writing debug image {}", path.display());
        if let Err(err) = img.save(&path) {
            warn!("failed to write {}: {err}", path.display());
            self.error = Some(anyhow::Error::new(err).context(format!(
                "Could not write debug image {}",
                path.display()
            )));
        }
    }
}

impl StageObserver for DebugOverlay {
    fn corners_extracted(&mut self, photo_index: usize, photo: &Photo, corners: &[CornerPoint]) {
        let mut img = to_rgb_image(photo);
        for corner in corners {
            draw_hollow_circle_mut(
                &mut img,
                (corner.x as i32, corner.y as i32),
                CORNER_RADIUS,
                CORNER_COLOR,
            );
        }
        self.save(&img, &format!("corners_{}.png", photo_index + 1));
    }

    fn matches_confirmed(
        &mut self,
        photos: [&Photo; 2],
        corners: [&[CornerPoint]; 2],
        matches: &[Match],
    ) {
        let [a, b] = photos;
        let mut img = RgbImage::new((a.width + b.width) as u32, a.height.max(b.height) as u32);
        image::imageops::replace(&mut img, &to_rgb_image(a), 0, 0);
        image::imageops::replace(&mut img, &to_rgb_image(b), a.width as i64, 0);

        let shift = a.width as f32;
        for m in matches {
            let (ca, cb) = (corners[0][m.index_a], corners[1][m.index_b]);
            draw_line_segment_mut(
                &mut img,
                (ca.x as f32, ca.y as f32),
                (cb.x as f32 + shift, cb.y as f32),
                MATCH_COLOR,
            );
        }

        if let Ok(centroids) = match_centroids(matches, corners, a.width) {
            let (mean_a, mean_b) = centroids.rounded();
            for mean in [mean_a, mean_b] {
                draw_hollow_circle_mut(&mut img, (mean.x as i32, mean.y as i32), MEAN_RADIUS, MEAN_COLOR);
            }
        }

        self.save(&img, "matches.png");
    }

    fn canvas_composited(&mut self, canvas: &Photo) {
        let img = to_rgb_image(canvas);
        self.save(&img, "stitched.png");
    }
}

/// Expands a photo of any channel count to RGB for drawing. Grayscale is replicated,
/// alpha is dropped and two-channel photos show their first channel.
fn to_rgb_image(photo: &Photo) -> RgbImage {
    RgbImage::from_fn(photo.width as u32, photo.height as u32, |x, y| {
        match photo.get_pixel(x as usize, y as usize) {
            Some(px) if px.len() >= 3 => Rgb([px[0], px[1], px[2]]),
            Some(px) => Rgb([px[0]; 3]),
            None => Rgb([0; 3]),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grayscale_photos_are_replicated_to_rgb() {
        let photo = Photo::new(vec![7, 200], 2, 1, 1).unwrap();
        let img = to_rgb_image(&photo);
        assert_eq!(img.get_pixel(0, 0), &Rgb([7, 7, 7]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([200, 200, 200]));
    }

    #[test]
    fn rgba_photos_drop_alpha() {
        let photo = Photo::new(vec![1, 2, 3, 4], 1, 1, 4).unwrap();
        assert_eq!(to_rgb_image(&photo).get_pixel(0, 0), &Rgb([1, 2, 3]));
    }
}
