//! Deterministic mine placement.
//!
//! Clients never receive the mine set; they re-derive it locally from
//! the seed broadcast in `game:state`. Every constant here is therefore
//! wire-normative: the LCG parameters, the row-major coordinate order,
//! and the shuffle direction must match the client implementation
//! exactly, or boards desynchronize.

use std::collections::HashSet;

use rand::Rng;

/// A board coordinate, `(x, y)` with `0 <= x < width`, `0 <= y < height`.
pub type Tile = (u32, u32);

/// Linear-congruential generator driving mine placement.
///
/// Numerical recipes constants, 32-bit state. Each draw advances the
/// state first, then maps it into `[0, 1)`.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        f64::from(self.state) / 4_294_967_296.0
    }
}

/// Draws a fresh board seed, uniform in `[0, 2^31)`.
pub fn create_board_seed() -> u32 {
    rand::rng().random_range(0..(1u32 << 31))
}

/// Computes the mine set for a board: exactly `mine_count` distinct
/// in-bounds tiles (capped at the cell count), identical for identical
/// inputs.
///
/// The full coordinate list is built row-major, Fisher–Yates shuffled
/// with the seeded generator, and the first `mine_count` entries become
/// mines.
pub fn mine_positions(
    seed: u32,
    width: u32,
    height: u32,
    mine_count: u32,
) -> HashSet<Tile> {
    let mut rng = Lcg::new(seed);

    let mut coords: Vec<Tile> = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            coords.push((x, y));
        }
    }

    for i in (1..coords.len()).rev() {
        let j = (rng.next_unit() * (i as f64 + 1.0)) as usize;
        coords.swap(i, j);
    }

    coords
        .into_iter()
        .take(mine_count as usize)
        .collect()
}

/// The in-bounds 8-neighborhood of a tile, in scan order.
pub fn neighbors(width: u32, height: u32, x: u32, y: u32) -> Vec<Tile> {
    let mut out = Vec::with_capacity(8);
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx >= 0 && ny >= 0 && nx < width as i64 && ny < height as i64 {
                out.push((nx as u32, ny as u32));
            }
        }
    }
    out
}

/// Number of mines among a tile's neighbors.
pub fn adjacent_mines(
    mines: &HashSet<Tile>,
    width: u32,
    height: u32,
    x: u32,
    y: u32,
) -> u8 {
    neighbors(width, height, x, y)
        .into_iter()
        .filter(|tile| mines.contains(tile))
        .count() as u8
}
