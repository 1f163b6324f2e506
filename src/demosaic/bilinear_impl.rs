use log::debug;

use super::border_interpolate;
use crate::image::RawImage;

/// One neighbor's contribution to a phase cell: where to read, how much it
/// counts (as a shift), and which plane it lands in.
struct Contribution {
    offset: isize,
    shift: u8,
    color: usize,
}

/// Precomputed interpolation recipe for one CFA phase cell.
struct PhaseCode {
    /// The 8 surrounding contributions (center excluded).
    gather: Vec<Contribution>,
    /// (plane, total weight) for every plane other than the cell's native
    /// color; the divisor for the gathered sum.
    finish: Vec<(usize, u32)>,
}

/// Bilinear demosaicing.
///
/// Precomputes, per 16x16 phase cell, the weighted neighbor contributions
/// (axis neighbors count double via a shift of 1, diagonals single), then
/// resolves every interior pixel with one table walk and an integer
/// division per missing plane. The outermost ring is primed by
/// [`border_interpolate`].
pub fn demosaic(image: &mut RawImage) {
    debug!("Bilinear interpolation...");

    border_interpolate(image, 1);

    let width = image.width();
    let height = image.height();
    let colors = image.colors();
    let cfa = image.cfa();

    let mut codes = Vec::with_capacity(16 * 16);
    for row in 0..16i32 {
        for col in 0..16i32 {
            let mut gather = Vec::with_capacity(8);
            let mut sum = [0u32; 4];
            for y in -1..=1i32 {
                for x in -1..=1i32 {
                    let shift = (y == 0) as u8 + (x == 0) as u8;
                    if shift == 2 {
                        continue;
                    }
                    let color = cfa.color_at(row + y, col + x);
                    gather.push(Contribution {
                        offset: y as isize * width as isize + x as isize,
                        shift,
                        color,
                    });
                    sum[color] += 1 << shift;
                }
            }
            let native = cfa.color_at(row, col);
            let finish = (0..colors)
                .filter(|&c| c != native && sum[c] != 0)
                .map(|c| (c, sum[c]))
                .collect();
            codes.push(PhaseCode { gather, finish });
        }
    }

    let pixels = image.pixels_mut();
    for row in 1..height.saturating_sub(1) {
        for col in 1..width.saturating_sub(1) {
            let idx = row * width + col;
            let code = &codes[(row & 15) * 16 + (col & 15)];
            let mut sum = [0u32; 4];
            for g in &code.gather {
                let p = &pixels[(idx as isize + g.offset) as usize];
                sum[g.color] += (p[g.color] as u32) << g.shift;
            }
            for &(c, weight) in &code.finish {
                pixels[idx][c] = (sum[c] / weight) as u16;
            }
        }
    }
}
