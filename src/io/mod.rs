//! I/O layer (component J): CSV readers for datacenters/players, a binary
//! reader for latency grids, and CSV writers for matches/stats.

pub mod datacenters;
pub mod latency_grid;
pub mod output;
pub mod players;
