//! Reads `players.csv`: lines of `HH:MM:SS,<lat>,<long>`, feeding the
//! Arrival Source's second-of-day buckets.

use std::path::Path;

use crate::arrivals::ArrivalSource;
use crate::error::{ConfigError, RuntimeError};

pub fn load(path: &Path) -> Result<ArrivalSource, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::PlayersUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(&contents))
}

fn parse(contents: &str) -> ArrivalSource {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let mut source = ArrivalSource::new();
    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                let err = RuntimeError::MalformedRow { file: "players.csv".into(), line: e.to_string() };
                tracing::warn!(error = %err, "skipping malformed players.csv row");
                continue;
            }
        };
        if row.len() < 3 {
            let err = RuntimeError::MalformedRow { file: "players.csv".into(), line: row.iter().collect::<Vec<_>>().join(",") };
            tracing::warn!(error = %err, "skipping short players.csv row");
            continue;
        }
        let (Some(second_of_day), Some(lat), Some(long)) = (
            row.get(0).and_then(parse_hms),
            row.get(1).and_then(|s| s.trim().parse::<f64>().ok()),
            row.get(2).and_then(|s| s.trim().parse::<f64>().ok()),
        ) else {
            let err = RuntimeError::MalformedRow { file: "players.csv".into(), line: row.iter().collect::<Vec<_>>().join(",") };
            tracing::warn!(error = %err, "skipping unparseable players.csv row");
            continue;
        };
        source.push(second_of_day, lat, long);
    }
    source
}

fn parse_hms(s: &str) -> Option<u32> {
    let mut parts = s.trim().splitn(3, ':');
    let h: u32 = parts.next()?.parse().ok()?;
    let m: u32 = parts.next()?.parse().ok()?;
    let sec: u32 = parts.next()?.parse().ok()?;
    Some(h * 3600 + m * 60 + sec)
}
