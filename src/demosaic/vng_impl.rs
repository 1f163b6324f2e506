use log::debug;

use super::bilinear_impl;
use crate::image::RawImage;

/// Candidate gradient terms: (y1, x1, y2, x2, weight, gradient mask).
///
/// Each term names two sample positions relative to the phase cell, a
/// weight exponent, and the compass gradients it feeds (bit 0 = NW,
/// clockwise through bit 7 = W). A term only survives precomputation when
/// both samples share a color and the pair is not on a diagonal already
/// covered by adjacent terms.
#[rustfmt::skip]
const TERMS: [(i8, i8, i8, i8, u8, u8); 64] = [
    (-2, -2,  0, -1, 0, 0x01), (-2, -2,  0,  0, 1, 0x01), (-2, -1, -1,  0, 0, 0x01),
    (-2, -1,  0, -1, 0, 0x02), (-2, -1,  0,  0, 0, 0x03), (-2, -1,  0,  1, 1, 0x01),
    (-2,  0,  0, -1, 0, 0x06), (-2,  0,  0,  0, 1, 0x02), (-2,  0,  0,  1, 0, 0x03),
    (-2,  1, -1,  0, 0, 0x04), (-2,  1,  0, -1, 1, 0x04), (-2,  1,  0,  0, 0, 0x06),
    (-2,  1,  0,  1, 0, 0x02), (-2,  2,  0,  0, 1, 0x04), (-2,  2,  0,  1, 0, 0x04),
    (-1, -2, -1,  0, 0, 0x80), (-1, -2,  0, -1, 0, 0x01), (-1, -2,  1, -1, 0, 0x01),
    (-1, -2,  1,  0, 1, 0x01), (-1, -1, -1,  1, 0, 0x88), (-1, -1,  1, -2, 0, 0x40),
    (-1, -1,  1, -1, 0, 0x22), (-1, -1,  1,  0, 0, 0x33), (-1, -1,  1,  1, 1, 0x11),
    (-1,  0, -1,  2, 0, 0x08), (-1,  0,  0, -1, 0, 0x44), (-1,  0,  0,  1, 0, 0x11),
    (-1,  0,  1, -2, 1, 0x40), (-1,  0,  1, -1, 0, 0x66), (-1,  0,  1,  0, 1, 0x22),
    (-1,  0,  1,  1, 0, 0x33), (-1,  0,  1,  2, 1, 0x10), (-1,  1,  1, -1, 1, 0x44),
    (-1,  1,  1,  0, 0, 0x66), (-1,  1,  1,  1, 0, 0x22), (-1,  1,  1,  2, 0, 0x10),
    (-1,  2,  0,  1, 0, 0x04), (-1,  2,  1,  0, 1, 0x04), (-1,  2,  1,  1, 0, 0x04),
    ( 0, -2,  0,  0, 1, 0x80), ( 0, -1,  0,  1, 1, 0x88), ( 0, -1,  1, -2, 0, 0x40),
    ( 0, -1,  1,  0, 0, 0x11), ( 0, -1,  2, -2, 0, 0x40), ( 0, -1,  2, -1, 0, 0x20),
    ( 0, -1,  2,  0, 0, 0x30), ( 0, -1,  2,  1, 1, 0x10), ( 0,  0,  0,  2, 1, 0x08),
    ( 0,  0,  2, -2, 1, 0x40), ( 0,  0,  2, -1, 0, 0x60), ( 0,  0,  2,  0, 1, 0x20),
    ( 0,  0,  2,  1, 0, 0x30), ( 0,  0,  2,  2, 1, 0x10), ( 0,  1,  1,  0, 0, 0x44),
    ( 0,  1,  1,  2, 0, 0x10), ( 0,  1,  2, -1, 1, 0x40), ( 0,  1,  2,  0, 0, 0x60),
    ( 0,  1,  2,  1, 0, 0x20), ( 0,  1,  2,  2, 0, 0x10), ( 1, -2,  1,  0, 0, 0x80),
    ( 1, -1,  1,  1, 0, 0x88), ( 1,  0,  1,  2, 0, 0x08), ( 1,  0,  2, -1, 0, 0x40),
    ( 1,  0,  2,  1, 0, 0x10),
];

/// Compass neighbors, NW first, clockwise.
const CHOOD: [(i8, i8); 8] = [
    (-1, -1), (-1, 0), (-1, 1), (0, 1), (1, 1), (1, 0), (1, -1), (0, -1),
];

struct GradTerm {
    off1: isize,
    off2: isize,
    color: usize,
    shift: u8,
    grads: u8,
}

/// One compass direction of a phase cell: the neighbor's offset and, when
/// that neighbor is another color but the pixel beyond it matches the
/// cell's color, the same-color alternate two steps out.
struct Neighbor {
    off: isize,
    alt: Option<(isize, usize)>,
}

struct PhaseCode {
    terms: Vec<GradTerm>,
    neighbors: Vec<Neighbor>,
}

/// Threshold-based variable-number-of-gradients demosaicing.
///
/// Seeds the image with [`bilinear_impl::demosaic`], then for every
/// interior pixel accumulates 8 compass gradients from the precomputed
/// term tables, keeps the directions at or below
/// `min + max / 2`, and averages their contributions per plane. Flat
/// regions (all gradients zero) pass the bilinear seed through unchanged.
///
/// Output goes through a rolling set of three row buffers and lands in the
/// image two rows behind the cursor, so later rows still read undisturbed
/// earlier columns.
pub fn demosaic(image: &mut RawImage) {
    bilinear_impl::demosaic(image);
    debug!("VNG interpolation...");

    let width = image.width();
    let height = image.height();
    let colors = image.colors();
    let cfa = image.cfa();

    // Phase grid: 8x2 for periodic masks, 16x16 for the irregular table.
    let (prows, pcols) = if cfa.is_periodic() { (8, 2) } else { (16, 16) };
    let rmask = prows - 1;
    let cmask = pcols - 1;

    let mut codes = Vec::with_capacity(prows * pcols);
    for row in 0..prows as i32 {
        for col in 0..pcols as i32 {
            let mut terms = Vec::new();
            for &(y1, x1, y2, x2, weight, grads) in TERMS.iter() {
                let (y1, x1, y2, x2) = (y1 as i32, x1 as i32, y2 as i32, x2 as i32);
                let color = cfa.color_at(row + y1, col + x1);
                if cfa.color_at(row + y2, col + x2) != color {
                    continue;
                }
                let diag = if cfa.color_at(row, col + 1) == color
                    && cfa.color_at(row + 1, col) == color
                {
                    2
                } else {
                    1
                };
                if (y1 - y2).abs() == diag && (x1 - x2).abs() == diag {
                    continue;
                }
                terms.push(GradTerm {
                    off1: y1 as isize * width as isize + x1 as isize,
                    off2: y2 as isize * width as isize + x2 as isize,
                    color,
                    shift: weight,
                    grads,
                });
            }
            let native = cfa.color_at(row, col);
            let neighbors = CHOOD
                .iter()
                .map(|&(y, x)| {
                    let (y, x) = (y as i32, x as i32);
                    let off = y as isize * width as isize + x as isize;
                    let alt = if cfa.color_at(row + y, col + x) != native
                        && cfa.color_at(row + 2 * y, col + 2 * x) == native
                    {
                        Some((2 * off, native))
                    } else {
                        None
                    };
                    Neighbor { off, alt }
                })
                .collect();
            codes.push(PhaseCode { terms, neighbors });
        }
    }

    let pixels = image.pixels_mut();
    let mut brow = vec![vec![[0u16; 4]; width]; 3];

    for row in 2..height - 2 {
        for col in 2..width - 2 {
            let idx = row * width + col;
            let code = &codes[(row & rmask) * pcols + (col & cmask)];

            let mut gval = [0i32; 8];
            for t in &code.terms {
                let a = pixels[(idx as isize + t.off1) as usize][t.color] as i32;
                let b = pixels[(idx as isize + t.off2) as usize][t.color] as i32;
                let diff = (a - b).abs() << t.shift;
                for (g, slot) in gval.iter_mut().enumerate() {
                    if t.grads & (1 << g) != 0 {
                        *slot += diff;
                    }
                }
            }

            let mut gmin = gval[0];
            let mut gmax = gval[0];
            for &g in &gval[1..] {
                gmin = gmin.min(g);
                gmax = gmax.max(g);
            }
            if gmax == 0 {
                brow[2][col] = pixels[idx];
                continue;
            }
            let thold = gmin + (gmax >> 1);

            let mut sum = [0i32; 4];
            let mut num = 0i32;
            let color = cfa.color_at(row as i32, col as i32);
            for (g, nb) in code.neighbors.iter().enumerate() {
                if gval[g] > thold {
                    continue;
                }
                for (c, slot) in sum.iter_mut().enumerate().take(colors) {
                    if c == color {
                        if let Some((aoff, acolor)) = nb.alt {
                            let other =
                                pixels[(idx as isize + aoff) as usize][acolor] as i32;
                            *slot += (pixels[idx][c] as i32 + other) >> 1;
                            continue;
                        }
                    }
                    *slot += pixels[(idx as isize + nb.off) as usize][c] as i32;
                }
                num += 1;
            }

            for c in 0..colors {
                let mut t = pixels[idx][color] as i32;
                if c != color {
                    t += (sum[c] - sum[color]) / num;
                }
                brow[2][col][c] = t.clamp(0, 65535) as u16;
            }
        }

        // Flush the row processed two iterations ago.
        if row > 3 {
            let base = (row - 2) * width;
            pixels[base + 2..base + width - 2].copy_from_slice(&brow[0][2..width - 2]);
        }
        brow.rotate_left(1);
    }

    for (i, out_row) in [height - 4, height - 3].into_iter().enumerate() {
        let base = out_row * width;
        pixels[base + 2..base + width - 2].copy_from_slice(&brow[i][2..width - 2]);
    }
}
