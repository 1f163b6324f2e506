use log::{debug, warn};

use crate::image::RawImage;

/// How the per-plane white-balance multipliers should be obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WbMode {
    /// Estimate from scene statistics.
    Auto,
    /// Use the camera's calibration patch or supplied multipliers,
    /// falling back to scene statistics when neither is usable.
    Camera,
    /// Keep the caller-seeded multipliers.
    Manual,
}

/// Inputs to [`estimate_wb`] beyond the image itself.
#[derive(Clone, Copy, Debug)]
pub struct WbOptions<'a> {
    /// Requested estimation mode.
    pub mode: WbMode,
    /// Sensor black level, subtracted from every sample.
    pub black: i32,
    /// Saturation ceiling of the sensor samples.
    pub maximum: i32,
    /// Camera-supplied multipliers, if the RAW file carried any.
    pub cam_mul: Option<[f32; 4]>,
    /// Camera calibration patch: an 8x8 block of known-neutral samples.
    pub white_patch: Option<&'a [[u16; 8]; 8]>,
}

/// Estimate per-plane white-balance multipliers.
///
/// `pre_mul` is seeded by the caller (its values survive wherever a mode
/// leaves a plane unestimated) and holds the result: always normalized so
/// the smallest multiplier is exactly 1.0, with the 4th plane filled from
/// plane 1 on 3-color sensors or defaulted to 1.0 on 4-color sensors.
///
/// The multipliers are not applied here; the external developer pipeline
/// consumes them.
pub fn estimate_wb(image: &RawImage, opts: &WbOptions, pre_mul: &mut [f32; 4]) {
    let maximum = opts.maximum - opts.black;

    let auto = opts.mode == WbMode::Auto
        || (opts.mode == WbMode::Camera && opts.cam_mul.is_none());
    if auto {
        auto_estimate(image, opts.black, maximum, pre_mul);
    }

    if opts.mode == WbMode::Camera {
        if let Some(cam_mul) = opts.cam_mul {
            camera_estimate(image, opts, cam_mul, pre_mul);
        }
    }

    if pre_mul[3] == 0.0 {
        pre_mul[3] = if image.colors() < 4 { pre_mul[1] } else { 1.0 };
    }
    let mut dmin = f32::MAX;
    for &m in pre_mul.iter() {
        if dmin > m {
            dmin = m;
        }
    }
    for m in pre_mul.iter_mut() {
        *m /= dmin;
    }

    debug!(
        "Scaling with black={}, pre_mul[] = {:.6} {:.6} {:.6} {:.6}",
        opts.black, pre_mul[0], pre_mul[1], pre_mul[2], pre_mul[3]
    );
}

/// Scan overlapping 7x7 blocks, discarding any block containing a sample
/// within 25 counts of saturation, and derive multipliers from the
/// per-plane count/sum ratios of the survivors.
fn auto_estimate(image: &RawImage, black: i32, maximum: i32, pre_mul: &mut [f32; 4]) {
    let width = image.width();
    let height = image.height();
    let pixels = image.pixels();
    let mut dsum = [0.0f64; 8];

    for row in 0..height.saturating_sub(7) {
        'block: for col in 0..width.saturating_sub(7) {
            let mut sum = [0i64; 8];
            for y in row..row + 7 {
                for x in col..col + 7 {
                    for c in 0..4 {
                        let mut val = pixels[y * width + x][c] as i32;
                        if val == 0 {
                            continue;
                        }
                        val -= black;
                        if val > maximum - 25 {
                            continue 'block;
                        }
                        if val < 0 {
                            val = 0;
                        }
                        sum[c] += val as i64;
                        sum[c + 4] += 1;
                    }
                }
            }
            for c in 0..8 {
                dsum[c] += sum[c] as f64;
            }
        }
    }

    for c in 0..4 {
        if dsum[c] != 0.0 {
            pre_mul[c] = (dsum[c + 4] / dsum[c]) as f32;
        }
    }
}

/// Derive multipliers from the 8x8 calibration patch, classifying each
/// sample through the CFA resolver. Falls back to the camera-supplied
/// multipliers when any plane is unsampled, and reports the degenerate
/// case where those are unusable too.
fn camera_estimate(
    image: &RawImage,
    opts: &WbOptions,
    cam_mul: [f32; 4],
    pre_mul: &mut [f32; 4],
) {
    let mut sum = [0i64; 8];
    if let Some(white) = opts.white_patch {
        for (row, line) in white.iter().enumerate() {
            for (col, &sample) in line.iter().enumerate() {
                let c = image.color_at(row as i32, col as i32);
                let val = sample as i32 - opts.black;
                if val > 0 {
                    sum[c] += val as i64;
                }
                sum[c + 4] += 1;
            }
        }
    }
    if sum[0] != 0 && sum[1] != 0 && sum[2] != 0 && sum[3] != 0 {
        for c in 0..4 {
            pre_mul[c] = sum[c + 4] as f32 / sum[c] as f32;
        }
    } else if cam_mul[0] != 0.0 && cam_mul[2] != 0.0 {
        *pre_mul = cam_mul;
    } else {
        warn!("Cannot use camera white balance.");
    }
}
