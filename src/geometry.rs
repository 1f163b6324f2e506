use log::debug;

use crate::image::RawImage;

/// Derotate a 45-degree-mounted ("Fuji") sensor into an axis-aligned
/// buffer.
///
/// No-op when the image has no diagonal offset. Otherwise allocates a new
/// buffer of `fuji_width / step` by `(height - fuji_width) / step` pixels,
/// maps every destination pixel to a fractional source coordinate via the
/// fixed 45-degree rotation, and bilinearly samples the 2x2 source
/// neighborhood per color plane. Destination pixels whose source falls
/// past the right or bottom edge are left at zero.
///
/// The old buffer is released, dimensions are updated, and the diagonal
/// offset is cleared: the transform is one-shot.
pub fn fuji_rotate(image: &mut RawImage, step: f64) {
    let fuji_width = image.fuji_width();
    if fuji_width == 0 {
        return;
    }
    debug!("Rotating image 45 degrees...");

    let width = image.width();
    let height = image.height();
    let colors = image.colors();
    let wide = (fuji_width as f64 / step) as usize;
    // A diagonal at least as tall as the image leaves no rows to derotate;
    // the result is an empty image rather than an underflowing subtraction.
    let high = (height.saturating_sub(fuji_width) as f64 / step) as usize;
    let mut img = vec![[0u16; 4]; wide * high];

    {
        let pixels = image.pixels();
        for row in 0..high {
            for col in 0..wide {
                let r = fuji_width as f64 + (row as f64 - col as f64) * step;
                let c = (row as f64 + col as f64) * step;
                let ur = r as usize;
                let uc = c as usize;
                if ur > height - 2 || uc > width - 2 {
                    continue;
                }
                let fr = r - ur as f64;
                let fc = c - uc as f64;
                let base = ur * width + uc;
                for i in 0..colors {
                    let top = pixels[base][i] as f64 * (1.0 - fc)
                        + pixels[base + 1][i] as f64 * fc;
                    let bot = pixels[base + width][i] as f64 * (1.0 - fc)
                        + pixels[base + width + 1][i] as f64 * fc;
                    img[row * wide + col][i] = (top * (1.0 - fr) + bot * fr) as u16;
                }
            }
        }
    }

    image.replace(img, wide, high);
    image.set_fuji_width(0);
}

/// Flip and/or transpose the image in place.
///
/// `flip` bit 0 mirrors columns, bit 1 mirrors rows, bit 2 transposes.
/// Pixels are permuted by following each cycle of the permutation,
/// rotating values along it; a one-bit-per-slot bitmap guarantees every
/// slot moves exactly once without a full-size temporary. Width and height
/// are swapped afterward when transposing.
pub fn flip_image(image: &mut RawImage, flip: u32) {
    let width = image.width();
    let height = image.height();
    let size = width * height;
    let mut flag = vec![0u32; (size + 31) >> 5];
    let pixels = image.pixels_mut();

    for base in 0..size {
        if flag[base >> 5] & (1 << (base & 31)) != 0 {
            continue;
        }
        let mut dest = base;
        let hold = pixels[base];
        loop {
            let (mut row, mut col) = if flip & 4 != 0 {
                (dest % height, dest / height)
            } else {
                (dest / width, dest % width)
            };
            if flip & 2 != 0 {
                row = height - 1 - row;
            }
            if flip & 1 != 0 {
                col = width - 1 - col;
            }
            let next = row * width + col;
            if next == base {
                break;
            }
            flag[next >> 5] |= 1 << (next & 31);
            pixels[dest] = pixels[next];
            dest = next;
        }
        pixels[dest] = hold;
    }

    if flip & 4 != 0 {
        image.swap_dimensions();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfa::CfaPattern;

    /// Image whose pixel values encode their original (row, col).
    fn coordinate_image(width: usize, height: usize) -> RawImage {
        let mut image = RawImage::new(width, height, 3, CfaPattern::rggb()).unwrap();
        for row in 0..height {
            for col in 0..width {
                image.pixels_mut()[row * width + col] =
                    [row as u16, col as u16, (row * width + col) as u16, 0];
            }
        }
        image
    }

    #[test]
    fn flip_mirror_columns() {
        let mut image = coordinate_image(5, 3);
        flip_image(&mut image, 1);
        for row in 0..3 {
            for col in 0..5 {
                assert_eq!(
                    image.pixels()[row * 5 + col],
                    [row as u16, (4 - col) as u16, (row * 5 + 4 - col) as u16, 0]
                );
            }
        }
    }

    #[test]
    fn flip_transpose_swaps_dimensions() {
        let mut image = coordinate_image(5, 3);
        flip_image(&mut image, 4);
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 5);
        // New (row, col) holds the old (col, row).
        for row in 0..5 {
            for col in 0..3 {
                let p = image.pixels()[row * 3 + col];
                assert_eq!((p[0], p[1]), (col as u16, row as u16));
            }
        }
    }

    #[test]
    fn involutive_flips_round_trip() {
        // Mirrors, their composition, transpose, and anti-transpose are
        // involutions. Codes 5 and 6 are 90-degree rotations and are not.
        for flip in [0u32, 1, 2, 3, 4, 7] {
            let mut image = coordinate_image(7, 4);
            let original = image.pixels().to_vec();
            flip_image(&mut image, flip);
            flip_image(&mut image, flip);
            assert_eq!(image.width(), 7);
            assert_eq!(image.height(), 4);
            assert_eq!(image.pixels(), &original[..], "flip code {flip}");
        }
    }

    #[test]
    fn rotations_return_after_four() {
        for flip in [5u32, 6] {
            let mut image = coordinate_image(6, 4);
            let original = image.pixels().to_vec();
            for _ in 0..4 {
                flip_image(&mut image, flip);
            }
            assert_eq!(image.width(), 6);
            assert_eq!(image.height(), 4);
            assert_eq!(image.pixels(), &original[..], "flip code {flip}");
        }
    }

    #[test]
    fn fuji_rotate_noop_without_diagonal() {
        let mut image = coordinate_image(8, 8);
        let original = image.pixels().to_vec();
        fuji_rotate(&mut image, core::f64::consts::FRAC_1_SQRT_2);
        assert_eq!(image.width(), 8);
        assert_eq!(image.height(), 8);
        assert_eq!(image.pixels(), &original[..]);
    }

    #[test]
    fn fuji_rotate_dimension_law() {
        let step = core::f64::consts::FRAC_1_SQRT_2;
        let mut image = RawImage::new(64, 64, 3, CfaPattern::rggb()).unwrap();
        image.set_fuji_width(24);
        fuji_rotate(&mut image, step);
        assert_eq!(image.width(), (24.0 / step) as usize);
        assert_eq!(image.height(), ((64.0 - 24.0) / step) as usize);
        assert_eq!(image.fuji_width(), 0);
    }

    #[test]
    fn fuji_rotate_oversized_diagonal_yields_empty_image() {
        let step = core::f64::consts::FRAC_1_SQRT_2;
        let mut image = RawImage::new(16, 16, 3, CfaPattern::rggb()).unwrap();
        image.set_fuji_width(16);
        fuji_rotate(&mut image, step);
        assert_eq!(image.height(), 0);
        assert!(image.pixels().is_empty());
        assert_eq!(image.fuji_width(), 0);
    }

    #[test]
    fn fuji_rotate_preserves_flat_field() {
        let step = core::f64::consts::FRAC_1_SQRT_2;
        let mut image = RawImage::new(64, 64, 3, CfaPattern::rggb()).unwrap();
        for p in image.pixels_mut() {
            *p = [8192, 8192, 8192, 0];
        }
        image.set_fuji_width(24);
        fuji_rotate(&mut image, step);
        // Interior samples interpolate between equal values; only pixels
        // whose source window fell out of bounds stay zero.
        let interior = image
            .pixels()
            .iter()
            .filter(|p| p[0] != 0)
            .collect::<Vec<_>>();
        assert!(!interior.is_empty());
        for p in interior {
            for c in 0..3 {
                assert!(
                    (p[c] as i32 - 8192).abs() <= 1,
                    "plane {c} = {}",
                    p[c]
                );
            }
        }
    }
}
