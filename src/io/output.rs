//! Writers for the optional `matches.csv` and `stats.csv` output sinks.

use std::fs::File;
use std::path::Path;

use crate::assembler::CommittedPlayer;

/// Appends one row per committed player: `<sec>,<lat>,<long>,<city>,<latency>,<matchingTime>`.
pub struct MatchesWriter {
    writer: csv::Writer<File>,
}

impl MatchesWriter {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self { writer: csv::WriterBuilder::new().has_headers(false).from_writer(file) })
    }

    pub fn write_rows(&mut self, rows: &[CommittedPlayer]) -> std::io::Result<()> {
        for row in rows {
            self.writer.write_record([
                row.second.to_string(),
                row.lat.to_string(),
                row.long.to_string(),
                row.city.clone(),
                row.latency.to_string(),
                row.matching_time.to_string(),
            ])?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// One row per datacenter per tick: `<sec>,<city>,<playerCount>,<avgLatency>,<avgMatchingTime>`.
pub struct StatsRow {
    pub second: u64,
    pub city: String,
    pub player_count: u64,
    pub avg_latency: f64,
    pub avg_matching_time: f64,
}

pub struct StatsWriter {
    writer: csv::Writer<File>,
}

impl StatsWriter {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self { writer: csv::WriterBuilder::new().has_headers(false).from_writer(file) })
    }

    pub fn write_rows(&mut self, rows: &[StatsRow]) -> std::io::Result<()> {
        for row in rows {
            self.writer.write_record([
                row.second.to_string(),
                row.city.clone(),
                row.player_count.to_string(),
                row.avg_latency.to_string(),
                row.avg_matching_time.to_string(),
            ])?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_writer_round_trips_via_bare_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matches.csv");
        {
            let mut w = MatchesWriter::create(&path).unwrap();
            w.write_rows(&[CommittedPlayer {
                second: 5,
                lat: 1.5,
                long: -2.5,
                city: "london".into(),
                latency: 42.0,
                matching_time: 3,
            }])
            .unwrap();
            w.flush().unwrap();
        }

        let mut reader = csv::ReaderBuilder::new().has_headers(false).from_path(&path).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.get(0), Some("5"));
        assert_eq!(record.get(3), Some("london"));
        assert_eq!(record.get(4), Some("42"));
    }

    #[test]
    fn stats_writer_round_trips_via_bare_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        {
            let mut w = StatsWriter::create(&path).unwrap();
            w.write_rows(&[StatsRow {
                second: 7,
                city: "tokyo".into(),
                player_count: 12,
                avg_latency: 55.5,
                avg_matching_time: 2.0,
            }])
            .unwrap();
            w.flush().unwrap();
        }

        let mut reader = csv::ReaderBuilder::new().has_headers(false).from_path(&path).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.get(1), Some("tokyo"));
        assert_eq!(record.get(2), Some("12"));
    }
}
