//! Stats & Density Reporter (component H): per-tick state counters and a
//! coarse spatial density grid of in-game players, published atomically
//! for the HTTP server to read.

use std::sync::{Arc, RwLock};

use crate::player::PlayerState;

pub const DENSITY_WIDTH: usize = 120;
pub const DENSITY_HEIGHT: usize = 64;
pub const DENSITY_CELLS: usize = DENSITY_WIDTH * DENSITY_HEIGHT;

fn density_cell(lat: f64, long: f64) -> usize {
    let ix = (((long + 180.0) / 3.0).floor() as i64).clamp(0, DENSITY_WIDTH as i64 - 1) as usize;
    let iy = (((90.0 - lat) / 3.0).floor() as i64).clamp(0, DENSITY_HEIGHT as i64 - 1) as usize;
    ix + iy * DENSITY_WIDTH
}

/// Owned, exclusively by the simulation loop, as a plain `Vec<u32>`.
/// Snapshots are serialized to little-endian bytes for publication.
#[derive(Clone, Debug)]
pub struct DensityGrid {
    cells: Vec<u32>,
}

impl DensityGrid {
    pub fn new() -> Self {
        Self { cells: vec![0; DENSITY_CELLS] }
    }

    pub fn increment(&mut self, lat: f64, long: f64) {
        self.cells[density_cell(lat, long)] += 1;
    }

    pub fn decrement(&mut self, lat: f64, long: f64) {
        let idx = density_cell(lat, long);
        self.cells[idx] = self.cells[idx].saturating_sub(1);
    }

    pub fn get(&self, ix: usize, iy: usize) -> u32 {
        self.cells[ix + iy * DENSITY_WIDTH]
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.cells.len() * 4);
        for v in &self.cells {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }
}

impl Default for DensityGrid {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-tick population counters, one per player state, plus the
/// cumulative WarmBody-timeout failure count.
#[derive(Clone, Copy, Debug, Default)]
pub struct StateCounters {
    pub new: u64,
    pub ideal: u64,
    pub expand: u64,
    pub warm_body: u64,
    pub playing: u64,
    pub cooldown: u64,
    pub cumulative_failures: u64,
}

impl StateCounters {
    pub fn record(&mut self, state: PlayerState) {
        match state {
            PlayerState::New => self.new += 1,
            PlayerState::Ideal => self.ideal += 1,
            PlayerState::Expand => self.expand += 1,
            PlayerState::WarmBody => self.warm_body += 1,
            PlayerState::Playing => self.playing += 1,
            PlayerState::Cooldown => self.cooldown += 1,
        }
    }

    pub fn reset_tick_counts(&mut self) {
        let failures = self.cumulative_failures;
        *self = StateCounters { cumulative_failures: failures, ..StateCounters::default() };
    }
}

/// Handle shared with the HTTP server: a reader-writer-locked byte buffer
/// holding the latest published density map, in the wire format described
/// in the external-interfaces section (120*64*4 little-endian uint32
/// cells).
#[derive(Clone)]
pub struct DensityHandle {
    inner: Arc<RwLock<Vec<u8>>>,
}

impl DensityHandle {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(DensityGrid::new().to_le_bytes())) }
    }

    pub fn publish(&self, grid: &DensityGrid) {
        let bytes = grid.to_le_bytes();
        if let Ok(mut guard) = self.inner.write() {
            *guard = bytes;
        }
    }

    pub fn snapshot(&self) -> Vec<u8> {
        self.inner.read().map(|g| g.clone()).unwrap_or_default()
    }
}

impl Default for DensityHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_arrival_lands_on_documented_cell() {
        // Scenario 1 in the testable-properties section: a player at
        // (0,0) must land on density cell (60, 32).
        assert_eq!(density_cell(0.0, 0.0), 60 + 32 * DENSITY_WIDTH);
    }

    #[test]
    fn increment_then_decrement_returns_to_zero() {
        let mut grid = DensityGrid::new();
        grid.increment(10.0, 20.0);
        grid.increment(10.0, 20.0);
        assert_eq!(grid.get(
            (((20.0f64 + 180.0) / 3.0).floor()) as usize,
            (((90.0f64 - 10.0) / 3.0).floor()) as usize,
        ), 2);
        grid.decrement(10.0, 20.0);
        grid.decrement(10.0, 20.0);
        assert_eq!(grid.get(
            (((20.0f64 + 180.0) / 3.0).floor()) as usize,
            (((90.0f64 - 10.0) / 3.0).floor()) as usize,
        ), 0);
    }

    #[test]
    fn density_grid_round_trips_le_bytes() {
        let mut grid = DensityGrid::new();
        grid.increment(0.0, 0.0);
        let bytes = grid.to_le_bytes();
        assert_eq!(bytes.len(), DENSITY_CELLS * 4);
        let cell0 = u32::from_le_bytes([bytes[240 * 4], bytes[240 * 4 + 1], bytes[240 * 4 + 2], bytes[240 * 4 + 3]]);
        assert_eq!(cell0, grid.get(60, 32));
    }

    #[test]
    fn publish_replaces_shared_buffer() {
        let handle = DensityHandle::new();
        let mut grid = DensityGrid::new();
        grid.increment(0.0, 0.0);
        handle.publish(&grid);
        assert_eq!(handle.snapshot(), grid.to_le_bytes());
    }
}
