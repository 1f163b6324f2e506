mod ahd_impl;
mod bilinear_impl;
mod vng_impl;

use crate::image::RawImage;

pub(crate) fn bilinear(image: &mut RawImage) {
    bilinear_impl::demosaic(image);
}

pub(crate) fn vng(image: &mut RawImage) {
    vng_impl::demosaic(image);
}

pub(crate) fn ahd(image: &mut RawImage, rgb_cam: &[[f32; 4]; 3]) {
    ahd_impl::demosaic(image, rgb_cam);
}

/// Fill the missing colors of every pixel within `border` of an edge by
/// averaging same-color neighbors from the surrounding 3x3 window that lie
/// inside the image. The pixel's own native color is left untouched.
///
/// A correctness fallback only: the full algorithms overwrite its output
/// everywhere their kernel fits.
pub fn border_interpolate(image: &mut RawImage, border: usize) {
    if border == 0 {
        return;
    }
    let width = image.width();
    let height = image.height();
    let colors = image.colors();
    let cfa = image.cfa();
    let pixels = image.pixels_mut();

    // When the border covers the whole image there is no interior to skip.
    let has_interior = width > 2 * border && height > 2 * border;

    for row in 0..height {
        let mut col = 0;
        while col < width {
            if has_interior && col == border && row >= border && row < height - border {
                col = width - border;
            }
            let mut sum = [0u32; 8];
            for y in row as i32 - 1..=row as i32 + 1 {
                for x in col as i32 - 1..=col as i32 + 1 {
                    if y >= 0 && (y as usize) < height && x >= 0 && (x as usize) < width {
                        let f = cfa.color_at(y, x);
                        sum[f] += pixels[y as usize * width + x as usize][f] as u32;
                        sum[f + 4] += 1;
                    }
                }
            }
            let f = cfa.color_at(row as i32, col as i32);
            for c in 0..colors {
                if c != f && sum[c + 4] != 0 {
                    pixels[row * width + col][c] = (sum[c] / sum[c + 4]) as u16;
                }
            }
            col += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfa::CfaPattern;

    fn flat_mosaic(width: usize, height: usize, values: [u16; 4]) -> RawImage {
        let cfa = CfaPattern::rggb();
        let mut image = RawImage::new(width, height, 3, cfa).unwrap();
        for row in 0..height {
            for col in 0..width {
                let c = cfa.color_at(row as i32, col as i32);
                image.pixels_mut()[row * width + col][c] = values[c];
            }
        }
        image
    }

    #[test]
    fn border_fills_missing_colors_on_flat_field() {
        let mut image = flat_mosaic(8, 8, [4000, 6000, 2000, 0]);
        border_interpolate(&mut image, 1);
        // Every edge pixel gets exact plane averages on a flat field.
        for row in 0..8usize {
            for col in 0..8usize {
                if row != 0 && row != 7 && col != 0 && col != 7 {
                    continue;
                }
                let p = image.pixels()[row * 8 + col];
                let f = image.color_at(row as i32, col as i32);
                for (c, want) in [(0, 4000), (1, 6000), (2, 2000)] {
                    if c == f {
                        continue;
                    }
                    assert_eq!(p[c], want, "({row},{col}) plane {c}");
                }
            }
        }
    }

    #[test]
    fn border_leaves_native_color_untouched() {
        let mut image = flat_mosaic(8, 8, [4000, 6000, 2000, 0]);
        let before = image.pixels().to_vec();
        border_interpolate(&mut image, 2);
        for (i, (a, b)) in before.iter().zip(image.pixels()).enumerate() {
            let f = image.color_at((i / 8) as i32, (i % 8) as i32);
            assert_eq!(a[f], b[f], "native slot changed at {i}");
        }
    }

    #[test]
    fn border_skips_interior() {
        let mut image = flat_mosaic(10, 10, [4000, 6000, 2000, 0]);
        border_interpolate(&mut image, 2);
        // Interior pixels keep their zero slots.
        for row in 2..8usize {
            for col in 2..8usize {
                let p = image.pixels()[row * 10 + col];
                let f = image.color_at(row as i32, col as i32);
                for c in 0..3 {
                    if c != f {
                        assert_eq!(p[c], 0, "interior ({row},{col}) plane {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn border_zero_is_noop() {
        let mut image = flat_mosaic(8, 8, [4000, 6000, 2000, 0]);
        let before = image.pixels().to_vec();
        border_interpolate(&mut image, 0);
        assert_eq!(image.pixels(), &before[..]);
    }

    #[test]
    fn border_wider_than_image_covers_everything() {
        let mut image = flat_mosaic(4, 4, [4000, 6000, 2000, 0]);
        border_interpolate(&mut image, 3);
        for p in image.pixels() {
            assert!(p[..3].iter().all(|&v| v != 0));
        }
    }
}
