//! RAW sensor image reconstruction: CFA demosaicing, white balance
//! estimation, and output geometry.
//!
//! Takes mosaiced sensor data (one color sample per photosite, stored in
//! 4-plane pixels) and reconstructs full-color images. Supports periodic
//! 2x2 Bayer patterns in 3- and 4-color variants plus the fixed 16x16
//! irregular mosaic table, with pre-demosaic white balance estimation and
//! post-demosaic 45-degree derotation and flip/transpose.
//!
//! # Algorithms
//!
//! - [`Bilinear`](Algorithm::Bilinear) — neighbor averaging
//! - [`Vng`](Algorithm::Vng) — Variable Number of Gradients
//! - [`Ahd`](Algorithm::Ahd) — Adaptive Homogeneity-Directed
//!
//! # Example
//!
//! ```
//! use rawproc::{demosaic, Algorithm, CfaPattern, RawImage};
//!
//! let width = 16;
//! let height = 16;
//! let cfa = CfaPattern::rggb();
//! let mut image = RawImage::new(width, height, 3, cfa).unwrap();
//! for row in 0..height {
//!     for col in 0..width {
//!         let c = cfa.color_at(row as i32, col as i32);
//!         image.pixels_mut()[row * width + col][c] = 8192;
//!     }
//! }
//!
//! let mut rgb_cam = [[0.0f32; 4]; 3];
//! for (i, row) in rgb_cam.iter_mut().enumerate() {
//!     row[i] = 1.0;
//! }
//! demosaic(&mut image, Algorithm::Bilinear, &rgb_cam).unwrap();
//!
//! // Every pixel now carries all three color planes.
//! assert_eq!(image.pixels()[5 * width + 5][..3], [8192, 8192, 8192]);
//! ```

#![warn(missing_docs)]

mod cfa;
mod demosaic;
mod error;
mod geometry;
mod image;
mod lab;
mod wb;

use std::fmt;

pub use cfa::CfaPattern;
pub use demosaic::border_interpolate;
pub use error::RawError;
pub use geometry::{flip_image, fuji_rotate};
pub use image::RawImage;
pub use lab::CamToLab;
pub use wb::{estimate_wb, WbMode, WbOptions};

/// Demosaicing algorithm selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Bilinear interpolation. Works on any supported CFA and plane count.
    Bilinear,
    /// Variable Number of Gradients. Works on any supported CFA and
    /// plane count; needs at least an 8x8 image.
    Vng,
    /// Adaptive Homogeneity-Directed. Periodic 3-color CFAs only; needs
    /// at least an 8x8 image.
    Ahd,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bilinear => f.write_str("Bilinear"),
            Self::Vng => f.write_str("VNG"),
            Self::Ahd => f.write_str("AHD"),
        }
    }
}

/// Demosaic `image` in place with the chosen algorithm.
///
/// On entry each pixel holds one nonzero plane (the photosite's native
/// color); on return every pixel carries all `colors` planes. `rgb_cam`
/// is the camera-to-sRGB matrix, used by AHD's perceptual homogeneity
/// test and ignored by the other algorithms.
pub fn demosaic(
    image: &mut RawImage,
    algorithm: Algorithm,
    rgb_cam: &[[f32; 4]; 3],
) -> Result<(), RawError> {
    match algorithm {
        Algorithm::Bilinear => demosaic::bilinear(image),
        Algorithm::Vng => {
            if image.width() < 8 || image.height() < 8 {
                return Err(RawError::ImageTooSmall {
                    algorithm: "VNG",
                    min_width: 8,
                    min_height: 8,
                });
            }
            demosaic::vng(image);
        }
        Algorithm::Ahd => {
            if image.colors() != 3 {
                return Err(RawError::UnsupportedColorCount {
                    algorithm: "AHD",
                    colors: image.colors(),
                });
            }
            if !image.cfa().is_periodic() {
                return Err(RawError::UnsupportedCfa { algorithm: "AHD" });
            }
            if image.width() < 8 || image.height() < 8 {
                return Err(RawError::ImageTooSmall {
                    algorithm: "AHD",
                    min_width: 8,
                    min_height: 8,
                });
            }
            demosaic::ahd(image, rgb_cam);
        }
    }
    Ok(())
}
