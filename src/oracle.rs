//! RTT Oracle: estimates one-way round-trip time between a player and a
//! datacenter, preferring an empirical latency grid and falling back to a
//! haversine-distance model when no grid sample exists.

use crate::datacenter::Datacenter;

pub const GRID_WIDTH: usize = 360;
pub const GRID_HEIGHT: usize = 180;
pub const GRID_CELLS: usize = GRID_WIDTH * GRID_HEIGHT;

const EARTH_RADIUS_KM: f64 = 6371.0;
const SPEED_OF_LIGHT_KM_PER_MS: f64 = 299792.458 / 1000.0;

/// A 360x180 latency grid: one empirical RTT sample (ms) per integer
/// (longitude, latitude) degree cell. Values <= 0 mean "no sample".
#[derive(Clone, Debug)]
pub struct LatencyGrid {
    cells: Vec<f32>,
}

impl LatencyGrid {
    pub fn from_cells(cells: Vec<f32>) -> Option<Self> {
        if cells.len() != GRID_CELLS {
            return None;
        }
        Some(Self { cells })
    }

    /// Decode from little-endian f32 bytes (360*180*4 = 259200 bytes).
    pub fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != GRID_CELLS * 4 {
            return None;
        }
        let cells = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Some(Self { cells })
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.cells.len() * 4);
        for v in &self.cells {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    fn sample(&self, lat: f64, long: f64) -> Option<f32> {
        let idx = cell_index(lat, long);
        let v = self.cells[idx];
        if v > 0.0 {
            Some(v)
        } else {
            None
        }
    }
}

/// Integer cell index for (lat, long), per the row-major layout documented
/// on the latency grid: x = floor(long) + 180 clamped to [0,359],
/// y = 90 - floor(lat) clamped to [0,179], index = x + y*360.
fn cell_index(lat: f64, long: f64) -> usize {
    let lat = lat.clamp(-90.0, 90.0);
    let mut long = long;
    if long < 0.0 {
        long += 360.0;
    }
    long %= 360.0;

    let x = (long.floor() as i64 + 180).clamp(0, GRID_WIDTH as i64 - 1) as usize;
    let y = (90 - lat.floor() as i64).clamp(0, GRID_HEIGHT as i64 - 1) as usize;
    x + y * GRID_WIDTH
}

/// Great-circle distance between two (lat, long) points, in kilometers.
/// Symmetric in its arguments by construction.
pub fn haversine_km(lat1: f64, long1: f64, lat2: f64, long2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_long = (long2 - long1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_long / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Estimated one-way RTT in milliseconds from (playerLat, playerLong) to
/// `dc`. Uses `dc`'s latency grid when a sample exists there, otherwise
/// falls back to a haversine-distance model scaled by the configured
/// speed-of-light factor.
///
/// The historical source built this fallback from `playerLatitude` twice
/// (a variable-naming typo dropped the player's longitude entirely); this
/// implementation uses the player's actual longitude.
pub fn rtt(dc: &Datacenter, player_lat: f64, player_long: f64, speed_of_light_factor: f64) -> f32 {
    if let Some(grid) = &dc.latency_grid {
        if let Some(ms) = grid.sample(player_lat, player_long) {
            return ms;
        }
    }

    let km = haversine_km(player_lat, player_long, dc.lat, dc.long);
    let one_way_ms = km / SPEED_OF_LIGHT_KM_PER_MS;
    (one_way_ms * 2.0 * 1.5 * speed_of_light_factor) as f32
}
