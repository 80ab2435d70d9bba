use tracing::debug;

use crate::error::{Result, StitchError};
use crate::photo::Photo;
use crate::translation_estimator::TranslationOffset;

/// Size of the stitched canvas and where each photo goes on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasLayout {
    pub width: usize,
    pub height: usize,
    /// Top-left corner of the first photo (always the canvas origin).
    pub origin_a: (usize, usize),
    /// Top-left corner of the second photo, chosen so that its bottom-right corner is the
    /// canvas's bottom-right corner.
    pub origin_b: (usize, usize),
}

impl CanvasLayout {
    /// Computes and validates the canvas for `photo_a` and `photo_b` placed according to
    /// `offset`:
    ///
    /// - height = `photo_b.height + dy`
    /// - width = `photo_a.width + photo_b.width - dx`
    ///
    /// # Errors
    /// Returns [StitchError::Geometry] when an offset component is negative, when `dy` is
    /// larger than the first photo's height, when the canvas would be empty, when either
    /// photo would not fit inside it, or when a size does not fit in `i64`.
    pub fn new(photo_a: &Photo, photo_b: &Photo, offset: TranslationOffset) -> Result<Self> {
        let geometry = |reason: String| StitchError::Geometry { reason };

        if offset.dx < 0 || offset.dy < 0 {
            return Err(geometry(format!(
                "offset ({}, {}) has a negative component",
                offset.dx, offset.dy
            )));
        }

        let dim = |value: usize| {
            i64::try_from(value).map_err(|_| geometry(format!("photo size {value} is too large")))
        };
        let (a_width, a_height) = (dim(photo_a.width)?, dim(photo_a.height)?);
        let (b_width, b_height) = (dim(photo_b.width)?, dim(photo_b.height)?);

        // Beyond the first photo's height the two photos share no rows.
        if offset.dy > a_height {
            return Err(geometry(format!(
                "vertical offset {} exceeds the first photo's height {}",
                offset.dy, photo_a.height
            )));
        }

        let height = b_height.checked_add(offset.dy);
        let width = a_width
            .checked_add(b_width)
            .and_then(|sum| sum.checked_sub(offset.dx));
        let (width, height) = match (width, height) {
            (Some(width), Some(height)) => (width, height),
            _ => {
                return Err(geometry(format!(
                    "offset ({}, {}) overflows the canvas size",
                    offset.dx, offset.dy
                )))
            }
        };
        if width <= 0 || height <= 0 {
            return Err(geometry(format!("canvas would be {width}x{height}")));
        }
        if a_width > width || a_height > height {
            return Err(geometry(format!(
                "first photo ({}x{}) does not fit on a {width}x{height} canvas",
                photo_a.width, photo_a.height
            )));
        }
        if b_width > width {
            return Err(geometry(format!(
                "second photo ({}x{}) does not fit on a {width}x{height} canvas",
                photo_b.width, photo_b.height
            )));
        }

        let (width, height) = (width as usize, height as usize);

        Ok(CanvasLayout {
            width,
            height,
            origin_a: (0, 0),
            origin_b: (width - photo_b.width, height - photo_b.height),
        })
    }
}

/// Places both photos on one canvas.
///
/// The first photo goes to the top-left corner, the second one to the bottom-right corner,
/// and the second photo overwrites the first where they overlap. Canvas pixels covered by
/// neither photo are zero.
///
/// # Errors
/// - [StitchError::ChannelMismatch] if the photos have different channel counts.
/// - [StitchError::Geometry] for offsets rejected by [CanvasLayout::new] (nothing is
///   allocated in that case) or a canvas whose buffer size overflows.
pub fn stitch(photo_a: &Photo, photo_b: &Photo, offset: TranslationOffset) -> Result<Photo> {
    if photo_a.channels != photo_b.channels {
        return Err(StitchError::ChannelMismatch {
            left: photo_a.channels,
            right: photo_b.channels,
        });
    }

    let layout = CanvasLayout::new(photo_a, photo_b, offset)?;
    debug!(
        "canvas {}x{}, second photo at {:?}",
        layout.width, layout.height, layout.origin_b
    );

    let mut canvas = Photo::try_filled(layout.width, layout.height, photo_a.channels, 0)
        .map_err(|_| StitchError::Geometry {
            reason: format!("canvas {}x{} is too large", layout.width, layout.height),
        })?;
    canvas.blit(photo_a, layout.origin_a.0, layout.origin_a.1)?;
    canvas.blit(photo_b, layout.origin_b.0, layout.origin_b.1)?;
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_size_follows_the_offset() {
        let a = Photo::filled(100, 100, 1, 1);
        let b = Photo::filled(100, 100, 1, 2);
        for (dx, dy) in [(0, 0), (20, 5), (100, 0), (37, 60)] {
            let canvas = stitch(&a, &b, TranslationOffset::new(dx, dy)).unwrap();
            assert_eq!(canvas.width as i64, 200 - dx);
            assert_eq!(canvas.height as i64, 100 + dy);
        }
    }

    #[test]
    fn second_photo_overwrites_the_overlap() {
        let a = Photo::filled(4, 3, 1, 1);
        let b = Photo::filled(3, 3, 1, 2);
        let canvas = stitch(&a, &b, TranslationOffset::new(2, 1)).unwrap();

        assert_eq!((canvas.width, canvas.height), (5, 4));
        let rows: Vec<&[u8]> = canvas.data().chunks(5).collect();
        assert_eq!(rows[0], &[1, 1, 1, 1, 0]);
        assert_eq!(rows[1], &[1, 1, 2, 2, 2]);
        assert_eq!(rows[2], &[1, 1, 2, 2, 2]);
        assert_eq!(rows[3], &[0, 0, 2, 2, 2]);
    }

    #[test]
    fn multi_channel_pixels_are_copied_whole() {
        let a = Photo::filled(2, 2, 3, 0);
        let mut b = Photo::filled(2, 2, 3, 0);
        b.set_pixel(1, 1, &[7, 8, 9]);
        let canvas = stitch(&a, &b, TranslationOffset::new(0, 0)).unwrap();
        assert_eq!(canvas.get_pixel(3, 1), Some(&[7u8, 8, 9][..]));
    }

    #[test]
    fn layout_places_second_photo_bottom_right() {
        let a = Photo::filled(100, 90, 1, 0);
        let b = Photo::filled(80, 100, 1, 0);
        let layout = CanvasLayout::new(&a, &b, TranslationOffset::new(30, 4)).unwrap();
        assert_eq!((layout.width, layout.height), (150, 104));
        assert_eq!(layout.origin_a, (0, 0));
        assert_eq!(layout.origin_b, (70, 4));
    }

    #[test]
    fn negative_offsets_are_rejected() {
        let a = Photo::filled(10, 10, 1, 0);
        for offset in [TranslationOffset::new(2, -1), TranslationOffset::new(-3, 2)] {
            assert!(matches!(
                stitch(&a, &a, offset),
                Err(StitchError::Geometry { .. })
            ));
        }
    }

    #[test]
    fn offsets_that_do_not_fit_are_rejected() {
        let a = Photo::filled(10, 10, 1, 0);
        let b = Photo::filled(10, 10, 1, 0);
        // Overlap wider than either photo.
        assert!(matches!(
            CanvasLayout::new(&a, &b, TranslationOffset::new(11, 0)),
            Err(StitchError::Geometry { .. })
        ));
        // Empty canvas.
        assert!(matches!(
            CanvasLayout::new(&a, &b, TranslationOffset::new(20, 0)),
            Err(StitchError::Geometry { .. })
        ));
        // First photo taller than the canvas.
        let tall = Photo::filled(10, 30, 1, 0);
        assert!(matches!(
            CanvasLayout::new(&tall, &b, TranslationOffset::new(0, 5)),
            Err(StitchError::Geometry { .. })
        ));
    }

    #[test]
    fn huge_offsets_are_rejected_without_allocating() {
        let a = Photo::filled(10, 10, 1, 0);
        for offset in [
            TranslationOffset::new(0, i64::MAX),
            TranslationOffset::new(i64::MAX, 0),
            TranslationOffset::new(0, 1 << 40),
            TranslationOffset::new(0, 11),
        ] {
            assert!(matches!(
                stitch(&a, &a, offset),
                Err(StitchError::Geometry { .. })
            ));
        }
        // Stacking the second photo right below the first is still allowed.
        let canvas = stitch(&a, &a, TranslationOffset::new(0, 10)).unwrap();
        assert_eq!((canvas.width, canvas.height), (20, 20));
    }

    #[test]
    fn channel_mismatch_is_rejected() {
        let a = Photo::filled(4, 4, 1, 0);
        let b = Photo::filled(4, 4, 3, 0);
        assert!(matches!(
            stitch(&a, &b, TranslationOffset::new(0, 0)),
            Err(StitchError::ChannelMismatch { .. })
        ));
    }
}
