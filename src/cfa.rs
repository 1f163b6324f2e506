use core::fmt;

/// The fixed 16x16 mosaic used by sensors whose filter layout is not
/// describable as a repeating 8x2 pattern.
const IRREGULAR: [[u8; 16]; 16] = [
    [2, 1, 1, 3, 2, 3, 2, 0, 3, 2, 3, 0, 1, 2, 1, 0],
    [0, 3, 0, 2, 0, 1, 3, 1, 0, 1, 1, 2, 0, 3, 3, 2],
    [2, 3, 3, 2, 3, 1, 1, 3, 3, 1, 2, 1, 2, 0, 0, 3],
    [0, 1, 0, 1, 0, 2, 0, 2, 2, 0, 3, 0, 1, 3, 2, 1],
    [3, 1, 1, 2, 0, 1, 0, 2, 1, 3, 1, 3, 0, 1, 3, 0],
    [2, 0, 0, 3, 3, 2, 3, 1, 2, 0, 2, 0, 3, 2, 2, 1],
    [2, 3, 3, 1, 2, 1, 2, 1, 2, 1, 1, 2, 3, 0, 0, 1],
    [1, 0, 0, 2, 3, 0, 0, 3, 0, 3, 0, 3, 2, 1, 2, 3],
    [2, 3, 3, 1, 1, 2, 1, 0, 3, 2, 3, 0, 2, 3, 1, 3],
    [1, 0, 2, 0, 3, 0, 3, 2, 0, 1, 1, 2, 0, 1, 0, 2],
    [0, 1, 1, 3, 3, 2, 2, 1, 1, 3, 3, 0, 2, 1, 3, 2],
    [2, 3, 2, 0, 0, 1, 3, 0, 2, 0, 1, 2, 3, 0, 1, 0],
    [1, 3, 1, 2, 3, 2, 3, 2, 0, 2, 0, 1, 1, 0, 3, 0],
    [0, 2, 0, 3, 1, 0, 0, 1, 1, 3, 3, 2, 3, 2, 2, 1],
    [2, 1, 3, 2, 3, 1, 2, 1, 0, 3, 0, 2, 0, 2, 0, 2],
    [0, 3, 1, 0, 0, 2, 0, 3, 2, 1, 3, 1, 1, 3, 1, 3],
];

/// Sensor margins baked into the irregular table.
const IRREGULAR_ROW_OFFSET: i32 = 8;
const IRREGULAR_COL_OFFSET: i32 = 18;

/// CFA pattern descriptor.
///
/// Covers every sensor layout the core handles: a repeating pattern of
/// eight rows and two columns packed into a 32-bit mask (two bits per
/// cell, plane indices 0..=3), or the fixed 16x16 non-periodic table used
/// by sensors the mask cannot describe.
///
/// Plane indices are 0/1/2/3 = R/G1/B/G2 (or G/M/C/Y on CMY sensors).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CfaPattern {
    /// Repeating 8x2 pattern encoded as a bit mask.
    Periodic(u32),
    /// Fixed 16x16 non-periodic table.
    Irregular,
}

impl CfaPattern {
    /// Bayer RGGB layout.
    pub fn rggb() -> Self {
        Self::Periodic(0x9494_9494)
    }

    /// Bayer BGGR layout.
    pub fn bggr() -> Self {
        Self::Periodic(0x1616_1616)
    }

    /// Bayer GRBG layout.
    pub fn grbg() -> Self {
        Self::Periodic(0x6161_6161)
    }

    /// Bayer GBRG layout.
    pub fn gbrg() -> Self {
        Self::Periodic(0x4949_4949)
    }

    /// Return the color plane index at the given row and column.
    ///
    /// Total over all `i32` coordinates: interpolation kernels probe
    /// `row - 1` / `col - 1` past the origin, and the bit masking below is
    /// a non-negative modulo under two's complement, so negative
    /// coordinates wrap the same way positive ones do.
    #[inline]
    pub fn color_at(&self, row: i32, col: i32) -> usize {
        match *self {
            Self::Periodic(mask) => {
                (mask >> ((((row << 1) & 14) + (col & 1)) << 1) & 3) as usize
            }
            Self::Irregular => {
                let r = ((row + IRREGULAR_ROW_OFFSET) & 15) as usize;
                let c = ((col + IRREGULAR_COL_OFFSET) & 15) as usize;
                IRREGULAR[r][c] as usize
            }
        }
    }

    /// Returns `true` for the repeating 8x2 representation.
    pub fn is_periodic(&self) -> bool {
        matches!(self, Self::Periodic(_))
    }

    /// Pattern repeat period as (rows, cols): (8, 2) for periodic masks,
    /// (16, 16) for the irregular table.
    pub fn period(&self) -> (usize, usize) {
        match self {
            Self::Periodic(_) => (8, 2),
            Self::Irregular => (16, 16),
        }
    }
}

impl fmt::Display for CfaPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Periodic(_) => {
                // Show the top-left 2x2 cell with the usual plane letters.
                const LETTERS: [char; 4] = ['R', 'G', 'B', 'G'];
                for (row, col) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                    write!(f, "{}", LETTERS[self.color_at(row, col)])?;
                }
                Ok(())
            }
            Self::Irregular => f.write_str("irregular 16x16"),
        }
    }
}
