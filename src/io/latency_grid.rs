//! Reads `latency_<city>.bin` grids: 360*180*4 = 259200 little-endian
//! 32-bit floats. A missing file is allowed and treated as "no grid";
//! a file of the wrong size is configuration-fatal.

use std::path::Path;

use crate::error::ConfigError;
use crate::oracle::{LatencyGrid, GRID_CELLS};

const EXPECTED_BYTES: u64 = (GRID_CELLS * 4) as u64;

/// Load the grid for `city` from `<dir>/latency_<city>.bin`. Returns
/// `Ok(None)` if the file simply doesn't exist (missing grids are
/// transparently handled by the RTT oracle's fallback), and `Err` only
/// when the file exists but has the wrong size.
pub fn load(dir: &Path, city: &str) -> Result<Option<LatencyGrid>, ConfigError> {
    let path = dir.join(format!("latency_{city}.bin"));
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(city, "no latency grid found, falling back to haversine");
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::PathUnreadable { path, source });
        }
    };

    if bytes.len() as u64 != EXPECTED_BYTES {
        return Err(ConfigError::GridSizeMismatch {
            path,
            observed: bytes.len() as u64,
            expected: EXPECTED_BYTES,
        });
    }

    Ok(LatencyGrid::from_le_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(dir.path(), "nowhere").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn wrong_size_is_configuration_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latency_bad.bin");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0u8; 10]).unwrap();

        let err = load(dir.path(), "bad").unwrap_err();
        assert!(matches!(err, ConfigError::GridSizeMismatch { .. }));
    }

    #[test]
    fn well_sized_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latency_good.bin");
        let bytes = vec![0u8; EXPECTED_BYTES as usize];
        std::fs::write(&path, &bytes).unwrap();

        let grid = load(dir.path(), "good").unwrap();
        assert!(grid.is_some());
    }
}
