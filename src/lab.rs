use std::sync::OnceLock;

/// XYZ from RGB reference primaries.
const XYZ_RGB: [[f64; 3]; 3] = [
    [0.412453, 0.357580, 0.180423],
    [0.212671, 0.715160, 0.072169],
    [0.019334, 0.119193, 0.950227],
];

/// D65 reference white.
const D65_WHITE: [f32; 3] = [0.950456, 1.0, 1.088754];

/// Cube-root lookup table over the full 16-bit sample range, using the
/// standard piecewise CIE formula. Built on first use, read-only for the
/// rest of the process.
static CBRT: OnceLock<Box<[f32; 0x10000]>> = OnceLock::new();

fn cbrt_table() -> &'static [f32; 0x10000] {
    CBRT.get_or_init(|| {
        let mut table = vec![0.0f32; 0x10000].into_boxed_slice();
        for (i, slot) in table.iter_mut().enumerate() {
            let r = i as f64 / 65535.0;
            *slot = if r > 0.008856 {
                r.powf(1.0 / 3.0) as f32
            } else {
                (7.787 * r + 16.0 / 116.0) as f32
            };
        }
        table.try_into().unwrap_or_else(|_| unreachable!())
    })
}

/// Camera-space to CIELab converter.
///
/// Folds the caller's camera-to-RGB matrix into a camera-to-XYZ matrix
/// (pre-divided by the D65 white point) at construction, so per-pixel
/// conversion is a matrix multiply plus three table lookups. Used by AHD
/// for homogeneity comparison only.
pub struct CamToLab {
    xyz_cam: [[f32; 4]; 3],
    colors: usize,
}

impl CamToLab {
    /// Build the converter from a camera-to-RGB matrix.
    ///
    /// The first call also populates the process-wide cube-root table.
    pub fn new(rgb_cam: &[[f32; 4]; 3], colors: usize) -> Self {
        cbrt_table();
        let mut xyz_cam = [[0.0f32; 4]; 3];
        for i in 0..3 {
            for j in 0..colors {
                for k in 0..3 {
                    xyz_cam[i][j] +=
                        XYZ_RGB[i][k] as f32 * rgb_cam[k][j] / D65_WHITE[i];
                }
            }
        }
        Self { xyz_cam, colors }
    }

    /// Convert one camera-space pixel to L*, a*, b*.
    ///
    /// The 0.5 bias rounds the accumulated XYZ value before it indexes the
    /// cube-root table; indices are clipped to the table domain.
    #[inline]
    pub fn convert(&self, cam: &[u16; 4]) -> [f32; 3] {
        let table = cbrt_table();
        let mut xyz = [0.0f32; 3];
        for (i, out) in xyz.iter_mut().enumerate() {
            let mut acc = 0.5f32;
            for c in 0..self.colors {
                acc += self.xyz_cam[i][c] * cam[c] as f32;
            }
            *out = table[(acc as i32).clamp(0, 0xffff) as usize];
        }
        [
            116.0 * xyz[1] - 16.0,
            500.0 * (xyz[0] - xyz[1]),
            200.0 * (xyz[1] - xyz[2]),
        ]
    }
}
