//! Flood-fill suppression of block-compression hotspots in a spectrum
//!
//! Summing millions of independently block-compressed images leaves a
//! periodic signature whose energy sits on a regular frequency grid with
//! spacing `height / blocks` by `width / blocks`. Starting from every grid
//! coordinate except DC, the fill zeroes a coefficient and spreads to a
//! 4-neighbor only while the neighbor is weaker than the coefficient just
//! removed by at least the ratio threshold. Coordinates on either frequency
//! axis are zeroed but never spread from.
//!
//! The spectrum of a real image is conjugate symmetric, so every zeroed
//! coefficient takes its mirror `(-row, -col)` with it; the inverse transform
//! then stays real up to rounding.

use crate::artifact::spectrum::FrequencyField;
use crate::io::configuration::ArtifactSettings;
use bitvec::prelude::*;
use ndarray::Axis;
use rustfft::num_complex::Complex;
use std::collections::VecDeque;

/// Summary of one flood-fill pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FloodReport {
    /// Grid coordinates the fill started from
    pub seeds: usize,
    /// Every coordinate zeroed, in the order it was processed
    pub nulled: Vec<(usize, usize)>,
}

/// Grid coordinates along one axis of length `length`
///
/// Positions are `i * length / blocks` for `i` in `0..blocks`, which rounds
/// down and therefore always stays below `length`; duplicates from very
/// short axes are removed.
pub fn grid_positions(length: usize, blocks: usize) -> Vec<usize> {
    if length == 0 || blocks == 0 {
        return Vec::new();
    }
    let mut positions: Vec<usize> = (0..blocks).map(|i| i * length / blocks).collect();
    positions.dedup();
    positions
}

/// Every hotspot seed of a `height` by `width` spectrum, excluding DC
pub fn hotspot_seeds(height: usize, width: usize, blocks: usize) -> Vec<(usize, usize)> {
    let rows = grid_positions(height, blocks);
    let cols = grid_positions(width, blocks);
    rows.iter()
        .flat_map(|&row| cols.iter().map(move |&col| (row, col)))
        .filter(|&coordinate| coordinate != (0, 0))
        .collect()
}

/// Largest per-channel ratio of `neighbor` magnitude to `current` magnitude
///
/// A zero current magnitude gives 0 against a zero neighbor and infinity
/// against anything else.
pub fn magnitude_ratio(neighbor: &[f64], current: &[f64]) -> f64 {
    neighbor
        .iter()
        .zip(current)
        .map(|(&n, &c)| {
            if c > 0.0 {
                n / c
            } else if n > 0.0 {
                f64::INFINITY
            } else {
                0.0
            }
        })
        .fold(0.0, f64::max)
}

/// In-bounds 4-neighbors of `(row, col)`
fn neighbors(row: usize, col: usize, height: usize, width: usize) -> [Option<(usize, usize)>; 4] {
    [
        row.checked_sub(1).map(|r| (r, col)),
        (row + 1 < height).then_some((row + 1, col)),
        col.checked_sub(1).map(|c| (row, c)),
        (col + 1 < width).then_some((row, col + 1)),
    ]
}

/// Conjugate-symmetric partner of `(row, col)` in a `height` by `width` spectrum
pub const fn mirror(row: usize, col: usize, height: usize, width: usize) -> (usize, usize) {
    ((height - row) % height, (width - col) % width)
}

fn zero_coefficient(field: &mut FrequencyField, row: usize, col: usize) {
    for channel in 0..field.len_of(Axis(2)) {
        if let Some(value) = field.get_mut([row, col, channel]) {
            *value = Complex::new(0.0, 0.0);
        }
    }
}

fn magnitudes_into(field: &FrequencyField, row: usize, col: usize, out: &mut [f64]) {
    for (channel, slot) in out.iter_mut().enumerate() {
        *slot = field.get([row, col, channel]).map_or(0.0, |v| v.norm());
    }
}

/// Zero the block-artifact grid and its decaying surroundings in place
///
/// Every coordinate is queued at most once, so the pass finishes after at
/// most `height * width` steps. The nulled set is closed under [`mirror`] and
/// DC is never touched.
pub fn flood_fill(field: &mut FrequencyField, settings: &ArtifactSettings) -> FloodReport {
    let (height, width, channels) = field.dim();
    let mut visited = bitvec![0; height * width];
    let mut queue = VecDeque::new();

    for (row, col) in hotspot_seeds(height, width, settings.blocks) {
        visited.set(row * width + col, true);
        queue.push_back((row, col));
    }

    let mut report = FloodReport {
        seeds: queue.len(),
        nulled: Vec::with_capacity(queue.len()),
    };
    let mut current = vec![0.0; channels];
    let mut candidate = vec![0.0; channels];

    while let Some((row, col)) = queue.pop_front() {
        magnitudes_into(field, row, col, &mut current);
        zero_coefficient(field, row, col);
        report.nulled.push((row, col));

        // A queued partner is zeroed when its own turn comes
        let (mirror_row, mirror_col) = mirror(row, col, height, width);
        let mirror_index = mirror_row * width + mirror_col;
        if visited.get(mirror_index).as_deref() == Some(&false) {
            visited.set(mirror_index, true);
            zero_coefficient(field, mirror_row, mirror_col);
            report.nulled.push((mirror_row, mirror_col));
        }

        // Axis energy is image structure, not block artifact
        if row == 0 || col == 0 {
            continue;
        }

        for (next_row, next_col) in neighbors(row, col, height, width).into_iter().flatten() {
            let index = next_row * width + next_col;
            if (next_row, next_col) == (0, 0) || visited.get(index).as_deref() == Some(&true) {
                continue;
            }
            magnitudes_into(field, next_row, next_col, &mut candidate);
            if magnitude_ratio(&candidate, &current) < settings.ratio_threshold {
                visited.set(index, true);
                queue.push_back((next_row, next_col));
            }
        }
    }

    report
}
