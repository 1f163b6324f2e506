use thiserror::Error;

/// Errors reported by the reconstruction core.
///
/// Only API-contract violations are reported this way. Allocation failure
/// is fatal (the process aborts), and degraded per-pixel conditions such as
/// out-of-bounds derotation samples are handled locally, never surfaced.
#[derive(Debug, Error)]
pub enum RawError {
    /// Pixel buffer length doesn't match width * height.
    #[error("pixel buffer: expected {expected} pixels, got {got}")]
    BufferSizeMismatch { expected: usize, got: usize },

    /// Color plane count outside the supported 3..=4 range.
    #[error("color plane count must be 3 or 4, got {0}")]
    InvalidColorCount(usize),

    /// Image too small for the chosen algorithm's kernel.
    #[error("image too small for {algorithm}: minimum {min_width}x{min_height}")]
    ImageTooSmall {
        algorithm: &'static str,
        min_width: usize,
        min_height: usize,
    },

    /// Algorithm not defined for this color plane count.
    #[error("{algorithm} interpolation requires a 3-color sensor, got {colors} planes")]
    UnsupportedColorCount {
        algorithm: &'static str,
        colors: usize,
    },

    /// Algorithm not defined for the irregular mosaic table.
    #[error("{algorithm} interpolation is not defined for the irregular CFA table")]
    UnsupportedCfa { algorithm: &'static str },
}
