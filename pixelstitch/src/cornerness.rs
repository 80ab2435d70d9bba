use crate::config::HarrisParams;
use crate::error::Result;
use crate::photo::Photo;

/// A per-pixel score map; higher values mean a more corner-like neighbourhood.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseMap {
    pub width: usize,
    pub height: usize,
    values: Vec<f64>,
}

impl ResponseMap {
    /// Wraps row-major scores. Returns `None` if `values.len() != width * height`.
    pub fn from_values(width: usize, height: usize, values: Vec<f64>) -> Option<ResponseMap> {
        if values.len() != width * height {
            return None;
        }
        Some(ResponseMap {
            width,
            height,
            values,
        })
    }

    /// A map of the given size filled with zeros.
    pub fn zeros(width: usize, height: usize) -> ResponseMap {
        ResponseMap {
            width,
            height,
            values: vec![0.0; width * height],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.values[y * self.width + x]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Smallest and largest finite score, or `None` for an empty map or one without
    /// any finite value.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Linearly rescales the map so that its minimum becomes `lo` and its maximum `hi`.
    ///
    /// A flat map (or one without finite values) becomes all `lo`, and non-finite entries
    /// are mapped to `lo` as well, so thresholding above `lo` never selects them.
    pub fn normalized(&self, lo: f64, hi: f64) -> ResponseMap {
        let range = self
            .min_max()
            .filter(|(min, max)| max - min > f64::EPSILON * max.abs().max(1.0));

        let values = match range {
            None => vec![lo; self.values.len()],
            Some((min, max)) => {
                let scale = (hi - lo) / (max - min);
                self.values
                    .iter()
                    .map(|&v| if v.is_finite() { lo + (v - min) * scale } else { lo })
                    .collect()
            }
        };

        ResponseMap {
            width: self.width,
            height: self.height,
            values,
        }
    }
}

/// Produces a cornerness score for every pixel of a photo.
///
/// Implementations read the first channel only; callers hand them grayscale photos.
pub trait CornernessDetector {
    fn response(&self, gray: &Photo) -> ResponseMap;
}

/// Harris-Stephens corner response: `det(M) - k * trace(M)^2`, where `M` is the gradient
/// structure tensor summed over a `block_size` box window.
///
/// Gradients come from Sobel filters of the configured aperture. Both the Sobel filters
/// and the box window sample outside the image by reflecting around the edge pixel
/// (`dcb|abcd|cba`).
#[derive(Clone, Debug)]
pub struct HarrisDetector {
    params: HarrisParams,
}

impl HarrisDetector {
    /// # Errors
    /// Returns [crate::StitchError::InvalidConfig] if `params` does not validate.
    pub fn new(params: HarrisParams) -> Result<Self> {
        params.validate()?;
        Ok(HarrisDetector { params })
    }

    pub fn params(&self) -> &HarrisParams {
        &self.params
    }

    /// Returns the separable smoothing and derivative kernels of a Sobel aperture.
    /// `new` only accepts 3, 5 and 7.
    fn sobel_kernels(aperture_size: usize) -> (&'static [f64], &'static [f64]) {
        match aperture_size {
            5 => (&[1.0, 4.0, 6.0, 4.0, 1.0], &[-1.0, -2.0, 0.0, 2.0, 1.0]),
            7 => (
                &[1.0, 6.0, 15.0, 20.0, 15.0, 6.0, 1.0],
                &[-1.0, -4.0, -5.0, 0.0, 5.0, 4.0, 1.0],
            ),
            _ => (&[1.0, 2.0, 1.0], &[-1.0, 0.0, 1.0]),
        }
    }

    /// Correlates `src` with `horizontal` along x then `vertical` along y.
    fn separable_filter(
        src: &[f64],
        width: usize,
        height: usize,
        horizontal: &[f64],
        vertical: &[f64],
    ) -> Vec<f64> {
        let h_half = (horizontal.len() / 2) as isize;
        let v_half = (vertical.len() / 2) as isize;

        let mut tmp = vec![0.0; width * height];
        for y in 0..height {
            let row = &src[y * width..(y + 1) * width];
            for x in 0..width {
                let mut acc = 0.0;
                for (i, &w) in horizontal.iter().enumerate() {
                    let sx = reflect_101(x as isize + i as isize - h_half, width);
                    acc += w * row[sx];
                }
                tmp[y * width + x] = acc;
            }
        }

        let mut out = vec![0.0; width * height];
        for y in 0..height {
            for x in 0..width {
                let mut acc = 0.0;
                for (j, &w) in vertical.iter().enumerate() {
                    let sy = reflect_101(y as isize + j as isize - v_half, height);
                    acc += w * tmp[sy * width + x];
                }
                out[y * width + x] = acc;
            }
        }
        out
    }

    /// Unnormalized box sum over `block_size` pixels. The window spans offsets
    /// `-(block_size / 2)..=block_size - 1 - block_size / 2` on each axis.
    fn box_sum(src: &[f64], width: usize, height: usize, block_size: usize) -> Vec<f64> {
        let ones = vec![1.0; block_size];
        Self::separable_filter(src, width, height, &ones, &ones)
    }
}

impl Default for HarrisDetector {
    fn default() -> Self {
        HarrisDetector {
            params: HarrisParams::default(),
        }
    }
}

impl CornernessDetector for HarrisDetector {
    fn response(&self, gray: &Photo) -> ResponseMap {
        let (width, height) = (gray.width, gray.height);
        if width == 0 || height == 0 {
            return ResponseMap::zeros(width, height);
        }

        let intensity: Vec<f64> = gray
            .data()
            .chunks_exact(gray.channels)
            .map(|px| px[0] as f64)
            .collect();

        let (smooth, deriv) = Self::sobel_kernels(self.params.aperture_size);
        let gx = Self::separable_filter(&intensity, width, height, deriv, smooth);
        let gy = Self::separable_filter(&intensity, width, height, smooth, deriv);

        let xx: Vec<f64> = gx.iter().map(|g| g * g).collect();
        let xy: Vec<f64> = gx.iter().zip(&gy).map(|(a, b)| a * b).collect();
        let yy: Vec<f64> = gy.iter().map(|g| g * g).collect();

        let block = self.params.block_size.max(1);
        let sxx = Self::box_sum(&xx, width, height, block);
        let sxy = Self::box_sum(&xy, width, height, block);
        let syy = Self::box_sum(&yy, width, height, block);

        let k = self.params.k;
        let values = (0..width * height)
            .map(|i| {
                let det = sxx[i] * syy[i] - sxy[i] * sxy[i];
                let trace = sxx[i] + syy[i];
                det - k * trace * trace
            })
            .collect();

        ResponseMap {
            width,
            height,
            values,
        }
    }
}

/// Maps an out-of-range index back into `0..n` by mirroring around the edge pixels.
fn reflect_101(mut i: isize, n: usize) -> usize {
    let n = n as isize;
    if n == 1 {
        return 0;
    }
    while i < 0 || i >= n {
        if i < 0 {
            i = -i;
        }
        if i >= n {
            i = 2 * n - 2 - i;
        }
    }
    i as usize
}
