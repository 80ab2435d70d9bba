use crate::error::{Result, StitchError};

/// A basic representation of an image with interleaved 8-bit pixel data.
/// Each pixel occupies `channels` consecutive bytes (1 for grayscale, 3 for RGB, 4 for RGBA).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Photo {
    /// Pixel data stored row-major in a 1D `Vec<u8>`.
    img_data: Vec<u8>,
    /// The width (in pixels) of the image.
    pub width: usize,
    /// The height (in pixels) of the image.
    pub height: usize,
    /// Number of interleaved values per pixel.
    pub channels: usize,
}

impl Default for Photo {
    /// Creates an empty single-channel `Photo` with zero width and height, and no image data.
    fn default() -> Photo {
        Photo {
            img_data: Vec::new(),
            width: 0,
            height: 0,
            channels: 1,
        }
    }
}

impl Photo {
    /// Wraps raw pixel data into a `Photo`.
    ///
    /// # Errors
    /// Returns [StitchError::InvalidInput] if `channels` is zero or if the buffer length
    /// is not `width * height * channels`.
    pub fn new(img_data: Vec<u8>, width: usize, height: usize, channels: usize) -> Result<Photo> {
        if channels == 0 {
            return Err(StitchError::InvalidInput(
                "a photo needs at least one channel".to_string(),
            ));
        }
        let expected = Self::buffer_len(width, height, channels)?;
        if img_data.len() != expected {
            return Err(StitchError::InvalidInput(format!(
                "expected {expected} bytes for a {width}x{height}x{channels} photo, got {}",
                img_data.len()
            )));
        }
        Ok(Photo {
            img_data,
            width,
            height,
            channels,
        })
    }

    /// Creates a photo with every channel of every pixel set to `value`.
    ///
    /// # Panics
    /// Panics if `width * height * channels` overflows `usize`. Use [Photo::try_filled] for
    /// sizes that are not known to be small.
    pub fn filled(width: usize, height: usize, channels: usize, value: u8) -> Photo {
        match Self::try_filled(width, height, channels, value) {
            Ok(photo) => photo,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible version of [Photo::filled].
    ///
    /// # Errors
    /// Returns [StitchError::InvalidInput] if the buffer size overflows `usize`.
    pub fn try_filled(width: usize, height: usize, channels: usize, value: u8) -> Result<Photo> {
        let len = Self::buffer_len(width, height, channels)?;
        Ok(Photo {
            img_data: vec![value; len],
            width,
            height,
            channels,
        })
    }

    fn buffer_len(width: usize, height: usize, channels: usize) -> Result<usize> {
        width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(channels))
            .ok_or_else(|| {
                StitchError::InvalidInput(format!(
                    "photo dimensions {width}x{height}x{channels} overflow"
                ))
            })
    }

    /// Returns `true` when the photo holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw interleaved pixel data.
    pub fn data(&self) -> &[u8] {
        &self.img_data
    }

    /// Consumes the photo and returns its pixel buffer.
    pub fn into_data(self) -> Vec<u8> {
        self.img_data
    }

    /// Returns the channel values of the pixel at `(x, y)`, or `None` if out of bounds.
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y * self.width + x) * self.channels;
        Some(&self.img_data[index..index + self.channels])
    }

    /// Overwrites the pixel at `(x, y)`. Out-of-bounds writes are ignored, and only the first
    /// `min(value.len(), channels)` channels are written.
    pub fn set_pixel(&mut self, x: usize, y: usize, value: &[u8]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = (y * self.width + x) * self.channels;
        let n = value.len().min(self.channels);
        self.img_data[index..index + n].copy_from_slice(&value[..n]);
    }

    /// Returns one row of interleaved pixel data.
    pub(crate) fn row(&self, y: usize) -> &[u8] {
        let stride = self.width * self.channels;
        &self.img_data[y * stride..(y + 1) * stride]
    }

    /// Produces a single-channel copy of this photo.
    ///
    /// Three- and four-channel photos are treated as RGB(A) and reduced with the
    /// ITU-R BT.601 luma weights (alpha is ignored). Two-channel photos use their first
    /// channel. A grayscale photo is simply cloned.
    pub fn to_grayscale(&self) -> Photo {
        if self.channels == 1 {
            return self.clone();
        }

        let mut gray = Vec::with_capacity(self.width * self.height);
        for px in self.img_data.chunks_exact(self.channels) {
            let luma = if self.channels >= 3 {
                0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32
            } else {
                px[0] as f32
            };
            gray.push(luma.round().clamp(0.0, 255.0) as u8);
        }

        Photo {
            img_data: gray,
            width: self.width,
            height: self.height,
            channels: 1,
        }
    }

    /// Copies `source` into this photo with its top-left corner at `(origin_x, origin_y)`,
    /// overwriting whatever was there. Parts of `source` falling outside are clipped.
    ///
    /// # Errors
    /// Returns [StitchError::ChannelMismatch] if the channel counts differ.
    pub fn blit(&mut self, source: &Photo, origin_x: usize, origin_y: usize) -> Result<()> {
        if source.channels != self.channels {
            return Err(StitchError::ChannelMismatch {
                left: self.channels,
                right: source.channels,
            });
        }
        if origin_x >= self.width || origin_y >= self.height {
            return Ok(());
        }

        let copy_width = source.width.min(self.width - origin_x);
        let copy_height = source.height.min(self.height - origin_y);
        let row_bytes = copy_width * self.channels;

        for y in 0..copy_height {
            let src = &source.row(y)[..row_bytes];
            let dst_start = ((origin_y + y) * self.width + origin_x) * self.channels;
            self.img_data[dst_start..dst_start + row_bytes].copy_from_slice(src);
        }
        Ok(())
    }
}
