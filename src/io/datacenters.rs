//! Reads `datacenters.csv`: lines of `<id>,<city>,<lat>,<long>`. Lines
//! with fewer than 4 fields are skipped, per the per-row parse-failure
//! policy (log and continue, never abort the load).

use std::path::Path;

use crate::error::{ConfigError, RuntimeError};

#[derive(Clone, Debug, PartialEq)]
pub struct DatacenterRecord {
    pub id: u32,
    pub city: String,
    pub lat: f64,
    pub long: f64,
}

pub fn load(path: &Path) -> Result<Vec<DatacenterRecord>, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::DatacentersUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse(&contents);
    if records.is_empty() {
        return Err(ConfigError::NoDatacenters { path: path.to_path_buf() });
    }
    Ok(records)
}

fn parse(contents: &str) -> Vec<DatacenterRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                let err = RuntimeError::MalformedRow { file: "datacenters.csv".into(), line: e.to_string() };
                tracing::warn!(error = %err, "skipping malformed datacenters.csv row");
                continue;
            }
        };
        if row.len() < 4 {
            let err = RuntimeError::MalformedRow { file: "datacenters.csv".into(), line: row.iter().collect::<Vec<_>>().join(",") };
            tracing::warn!(error = %err, "skipping short datacenters.csv row");
            continue;
        }
        let (Some(id), Some(city), Some(lat), Some(long)) = (
            row.get(0).and_then(|s| s.trim().parse::<u32>().ok()),
            row.get(1).map(|s| s.trim().to_string()),
            row.get(2).and_then(|s| s.trim().parse::<f64>().ok()),
            row.get(3).and_then(|s| s.trim().parse::<f64>().ok()),
        ) else {
            let err = RuntimeError::MalformedRow { file: "datacenters.csv".into(), line: row.iter().collect::<Vec<_>>().join(",") };
            tracing::warn!(error = %err, "skipping unparseable datacenters.csv row");
            continue;
        };
        records.push(DatacenterRecord { id, city, lat, long });
    }
    records
}
