use log::debug;

use super::border_interpolate;
use crate::image::RawImage;
use crate::lab::CamToLab;

/// Tile edge. Tiles overlap by 6 pixels so every written pixel has a full
/// homogeneity neighborhood inside its own tile.
const TS: usize = 256;

#[inline]
fn clip(x: i32) -> u16 {
    x.clamp(0, 65535) as u16
}

/// Clamp `x` to the closed range spanned by `a` and `b`.
#[inline]
fn ulim(x: i32, a: i32, b: i32) -> i32 {
    if a < b {
        x.clamp(a, b)
    } else {
        x.clamp(b, a)
    }
}

/// Adaptive Homogeneity-Directed demosaicing.
///
/// Per tile: interpolate green along rows and along columns (clamped to
/// the two same-line green neighbors), complete red/blue for both
/// candidates with green-guided gradients, convert both to fixed-point
/// (x64) CIELab, count per-direction homogeneity against the 4 axis
/// neighbors, then pick the direction with the larger 3x3 vote sum — or
/// the floored average of both candidates on a tie.
///
/// The outermost 3 pixels of the image keep the border interpolator's
/// result. Defined for 3-color periodic CFAs.
pub fn demosaic(image: &mut RawImage, rgb_cam: &[[f32; 4]; 3]) {
    debug!("AHD interpolation...");

    let cam_to_lab = CamToLab::new(rgb_cam, 3);
    border_interpolate(image, 3);

    let width = image.width();
    let height = image.height();
    let cfa = image.cfa();
    let w = width as isize;

    // Tile-scoped scratch, reused across tiles within this call.
    let mut rgb = vec![[0u16; 3]; 2 * TS * TS];
    let mut lab = vec![[0i16; 3]; 2 * TS * TS];
    let mut homo = vec![0u8; 2 * TS * TS];

    let pixels = image.pixels_mut();

    let mut top = 0;
    while top < height {
        let mut left = 0;
        while left < width {
            rgb.fill([0; 3]);

            // Interpolate green horizontally and vertically.
            for row in top.max(2)..(top + TS).min(height.saturating_sub(2)) {
                let mut col =
                    left + (cfa.color_at(row as i32, left as i32) == 1) as usize;
                if col < 2 {
                    col += 2;
                }
                let f = cfa.color_at(row as i32, col as i32);
                while col < left + TS && col + 2 < width {
                    let idx = row * width + col;
                    let at = |o: isize| &pixels[(idx as isize + o) as usize];
                    let t = (row - top) * TS + (col - left);

                    let val = ((at(-1)[1] as i32 + at(0)[f] as i32 + at(1)[1] as i32) * 2
                        - at(-2)[f] as i32
                        - at(2)[f] as i32)
                        >> 2;
                    rgb[t][1] = ulim(val, at(-1)[1] as i32, at(1)[1] as i32) as u16;

                    let val = ((at(-w)[1] as i32 + at(0)[f] as i32 + at(w)[1] as i32) * 2
                        - at(-2 * w)[f] as i32
                        - at(2 * w)[f] as i32)
                        >> 2;
                    rgb[TS * TS + t][1] =
                        ulim(val, at(-w)[1] as i32, at(w)[1] as i32) as u16;

                    col += 2;
                }
            }

            // Interpolate red and blue, and convert to CIELab.
            for d in 0..2 {
                let plane = d * TS * TS;
                for row in top + 1..(top + TS - 1).min(height.saturating_sub(1)) {
                    for col in left + 1..(left + TS - 1).min(width.saturating_sub(1)) {
                        let idx = row * width + col;
                        let at = |o: isize| &pixels[(idx as isize + o) as usize];
                        let t = plane + (row - top) * TS + (col - left);

                        let c = 2 - cfa.color_at(row as i32, col as i32);
                        if c == 1 {
                            // Green site: row color from row neighbors,
                            // column color from column neighbors.
                            let c = cfa.color_at(row as i32 + 1, col as i32);
                            let val = at(0)[1] as i32
                                + ((at(-1)[2 - c] as i32 + at(1)[2 - c] as i32
                                    - rgb[t - 1][1] as i32
                                    - rgb[t + 1][1] as i32)
                                    >> 1);
                            rgb[t][2 - c] = clip(val);
                            let val = at(0)[1] as i32
                                + ((at(-w)[c] as i32 + at(w)[c] as i32
                                    - rgb[t - TS][1] as i32
                                    - rgb[t + TS][1] as i32)
                                    >> 1);
                            rgb[t][c] = clip(val);
                        } else {
                            // Red or blue site: the opposite color from
                            // the four diagonals, guided by green.
                            let val = rgb[t][1] as i32
                                + ((at(-w - 1)[c] as i32
                                    + at(-w + 1)[c] as i32
                                    + at(w - 1)[c] as i32
                                    + at(w + 1)[c] as i32
                                    - rgb[t - TS - 1][1] as i32
                                    - rgb[t - TS + 1][1] as i32
                                    - rgb[t + TS - 1][1] as i32
                                    - rgb[t + TS + 1][1] as i32
                                    + 1)
                                    >> 2);
                            rgb[t][c] = clip(val);
                        }
                        let f = cfa.color_at(row as i32, col as i32);
                        rgb[t][f] = pixels[idx][f];

                        let cam = [rgb[t][0], rgb[t][1], rgb[t][2], 0];
                        let flab = cam_to_lab.convert(&cam);
                        for (slot, l) in lab[t].iter_mut().zip(flab) {
                            *slot = (64.0 * l) as i16;
                        }
                    }
                }
            }

            // Build homogeneity maps from the CIELab candidates.
            homo.fill(0);
            let dirs: [isize; 4] = [-1, 1, -(TS as isize), TS as isize];
            for row in top + 2..(top + TS - 2).min(height) {
                let tr = row - top;
                for col in left + 2..(left + TS - 2).min(width) {
                    let tc = col - left;
                    let mut ldiff = [[0i32; 4]; 2];
                    let mut abdiff = [[0i32; 4]; 2];
                    for d in 0..2 {
                        let t = d * TS * TS + tr * TS + tc;
                        for (i, &dir) in dirs.iter().enumerate() {
                            let n = (t as isize + dir) as usize;
                            ldiff[d][i] = (lab[t][0] as i32 - lab[n][0] as i32).abs();
                        }
                    }
                    let leps = ldiff[0][0]
                        .max(ldiff[0][1])
                        .min(ldiff[1][2].max(ldiff[1][3]));
                    for d in 0..2 {
                        let t = d * TS * TS + tr * TS + tc;
                        for (i, &dir) in dirs.iter().enumerate() {
                            if i >> 1 == d || ldiff[d][i] <= leps {
                                let n = (t as isize + dir) as usize;
                                let da = lab[t][1] as i32 - lab[n][1] as i32;
                                let db = lab[t][2] as i32 - lab[n][2] as i32;
                                abdiff[d][i] = da * da + db * db;
                            }
                        }
                    }
                    let abeps = abdiff[0][0]
                        .max(abdiff[0][1])
                        .min(abdiff[1][2].max(abdiff[1][3]));
                    for d in 0..2 {
                        for i in 0..4 {
                            if ldiff[d][i] <= leps && abdiff[d][i] <= abeps {
                                homo[d * TS * TS + tr * TS + tc] += 1;
                            }
                        }
                    }
                }
            }

            // Combine the more homogeneous candidate per pixel.
            for row in top + 3..(top + TS - 3).min(height.saturating_sub(3)) {
                let tr = row - top;
                for col in left + 3..(left + TS - 3).min(width.saturating_sub(3)) {
                    let tc = col - left;
                    let mut hm = [0u32; 2];
                    for (d, slot) in hm.iter_mut().enumerate() {
                        for i in tr - 1..=tr + 1 {
                            for j in tc - 1..=tc + 1 {
                                *slot += homo[d * TS * TS + i * TS + j] as u32;
                            }
                        }
                    }
                    let t = tr * TS + tc;
                    let out = &mut pixels[row * width + col];
                    if hm[0] != hm[1] {
                        let d = (hm[1] > hm[0]) as usize;
                        out[..3].copy_from_slice(&rgb[d * TS * TS + t]);
                    } else {
                        for c in 0..3 {
                            out[c] =
                                ((rgb[t][c] as u32 + rgb[TS * TS + t][c] as u32) >> 1) as u16;
                        }
                    }
                }
            }

            left += TS - 6;
        }
        top += TS - 6;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfa::CfaPattern;

    fn identity() -> [[f32; 4]; 3] {
        let mut m = [[0.0f32; 4]; 3];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        m
    }

    fn mosaic(width: usize, height: usize, cfa: CfaPattern, values: [u16; 4]) -> RawImage {
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
    fn flat_field_reconstructed() {
        for cfa in [
            CfaPattern::rggb(),
            CfaPattern::bggr(),
            CfaPattern::grbg(),
            CfaPattern::gbrg(),
        ] {
            let mut image = mosaic(32, 32, cfa, [8192, 8192, 8192, 0]);
            demosaic(&mut image, &identity());
            for row in 3..29usize {
                for col in 3..29usize {
                    let p = image.pixels()[row * 32 + col];
                    for c in 0..3 {
                        assert_eq!(p[c], 8192, "({row},{col}) plane {c} on {cfa}");
                    }
                }
            }
        }
    }

    #[test]
    fn tied_directions_average() {
        // A flat field makes both candidates identical at every pixel, so
        // every homogeneity vote ties and the output must be the floored
        // average of the two (equal) candidates, bit for bit.
        let mut image = mosaic(32, 32, CfaPattern::rggb(), [9000, 5000, 3000, 0]);
        demosaic(&mut image, &identity());
        for row in 3..29usize {
            for col in 3..29usize {
                let p = image.pixels()[row * 32 + col];
                for (c, want) in [(0usize, 9000u16), (1, 5000), (2, 3000)] {
                    assert_eq!(p[c], want, "({row},{col}) plane {c}");
                }
            }
        }
    }

    #[test]
    fn equal_votes_average_differing_candidates() {
        // Flat red and blue with green striped by row parity. The
        // horizontal candidate comes out constant along every row and the
        // vertical candidate constant along every column, so each
        // direction collects exactly its two zero-gradient votes and
        // every pixel ties, while the candidates themselves disagree.
        // The output must be their floored per-channel average.
        let cfa = CfaPattern::rggb();
        let mut image = RawImage::new(32, 32, 3, cfa).unwrap();
        for row in 0..32usize {
            for col in 0..32usize {
                let c = cfa.color_at(row as i32, col as i32);
                let value = match c {
                    0 => 8000,
                    2 => 3000,
                    _ if row % 2 == 1 => 6000,
                    _ => 5000,
                };
                image.pixels_mut()[row * 32 + col][c] = value;
            }
        }
        demosaic(&mut image, &identity());

        // Horizontal rows: [8000, 5000, 2000] even, [9000, 6000, 3000]
        // odd; vertical columns: [8000, 6000, 4000] even, [7000, 5000,
        // 3000] odd.
        for row in 5..27usize {
            for col in 5..27usize {
                let want = match (row % 2, col % 2) {
                    (0, 0) => [8000u16, 5500, 3000],
                    (0, 1) => [7500, 5000, 2500],
                    (1, 0) => [8500, 6000, 3500],
                    _ => [8000, 5500, 3000],
                };
                let p = image.pixels()[row * 32 + col];
                assert_eq!(p[..3], want, "({row},{col})");
            }
        }
    }

    #[test]
    fn spans_multiple_tiles() {
        // 300 pixels wide forces a second tile column (tile step is 250).
        let mut image = mosaic(300, 64, CfaPattern::rggb(), [8192, 8192, 8192, 0]);
        demosaic(&mut image, &identity());
        for row in 3..61usize {
            for col in 3..297usize {
                let p = image.pixels()[row * 300 + col];
                for c in 0..3 {
                    assert_eq!(p[c], 8192, "({row},{col}) plane {c}");
                }
            }
        }
    }
}
