use crate::cfa::CfaPattern;
use crate::error::RawError;

/// Caller-owned sensor pixel buffer plus the layout facts every algorithm
/// needs: dimensions, color plane count, CFA descriptor, and the Fuji
/// diagonal width.
///
/// Each pixel holds 4 channel slots. Before demosaicing only the slot
/// matching the sensor's native color at that location is meaningful; the
/// rest are zero. After demosaicing all `colors` slots hold reconstructed
/// values.
///
/// Geometry transforms ([`fuji_rotate`](crate::fuji_rotate),
/// [`flip_image`](crate::flip_image)) may replace the backing vector and
/// dimensions wholesale; everything else mutates in place.
#[derive(Clone, Debug)]
pub struct RawImage {
    pixels: Vec<[u16; 4]>,
    width: usize,
    height: usize,
    colors: usize,
    cfa: CfaPattern,
    fuji_width: usize,
}

impl RawImage {
    /// Create a zero-filled image.
    pub fn new(
        width: usize,
        height: usize,
        colors: usize,
        cfa: CfaPattern,
    ) -> Result<Self, RawError> {
        Self::from_pixels(vec![[0u16; 4]; width * height], width, height, colors, cfa)
    }

    /// Wrap an existing pixel buffer.
    pub fn from_pixels(
        pixels: Vec<[u16; 4]>,
        width: usize,
        height: usize,
        colors: usize,
        cfa: CfaPattern,
    ) -> Result<Self, RawError> {
        if !(3..=4).contains(&colors) {
            return Err(RawError::InvalidColorCount(colors));
        }
        let expected = width * height;
        if pixels.len() != expected {
            return Err(RawError::BufferSizeMismatch { expected, got: pixels.len() });
        }
        Ok(Self { pixels, width, height, colors, cfa, fuji_width: 0 })
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of valid color planes (3 or 4).
    pub fn colors(&self) -> usize {
        self.colors
    }

    /// CFA descriptor.
    pub fn cfa(&self) -> CfaPattern {
        self.cfa
    }

    /// Diagonal width of a 45-degree-mounted sensor; 0 for ordinary sensors.
    pub fn fuji_width(&self) -> usize {
        self.fuji_width
    }

    /// Mark the sensor as 45-degree-mounted with the given diagonal width.
    pub fn set_fuji_width(&mut self, fuji_width: usize) {
        self.fuji_width = fuji_width;
    }

    /// Native color plane index at (row, col), per the CFA descriptor.
    #[inline]
    pub fn color_at(&self, row: i32, col: i32) -> usize {
        self.cfa.color_at(row, col)
    }

    /// Row-major pixel slots.
    pub fn pixels(&self) -> &[[u16; 4]] {
        &self.pixels
    }

    /// Mutable row-major pixel slots.
    pub fn pixels_mut(&mut self) -> &mut [[u16; 4]] {
        &mut self.pixels
    }

    /// Replace the whole buffer and geometry. Used by the transforms that
    /// change dimensions; the buffer length must match the new dimensions.
    pub(crate) fn replace(
        &mut self,
        pixels: Vec<[u16; 4]>,
        width: usize,
        height: usize,
    ) {
        debug_assert_eq!(pixels.len(), width * height);
        self.pixels = pixels;
        self.width = width;
        self.height = height;
    }

    pub(crate) fn swap_dimensions(&mut self) {
        core::mem::swap(&mut self.width, &mut self.height);
    }
}
