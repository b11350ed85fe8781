use crate::simulation::state::TrajectorySample;
use csv::Writer;
use serde::Serialize;
use std::fs;
use std::io;

#[derive(Debug, Serialize)]
struct LogEntry {
    time: f64,
    phase: String,
    log_cell_size: f64,
    instantaneous_growth: f64,
    effector_level: f64,
    mrna_total: u32,
    protein_pool_json: String,
}

/// Writes a cell trajectory to CSV, one row per sample.
pub struct TrajectoryLogger {
    writer: Writer<fs::File>,
}

impl TrajectoryLogger {
    pub fn new(path: &str) -> Result<Self, io::Error> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }

    pub fn log_sample(&mut self, sample: &TrajectorySample) -> Result<(), anyhow::Error> {
        let entry = LogEntry {
            time: sample.time,
            phase: format!("{:?}", sample.phase),
            log_cell_size: sample.log_cell_size,
            instantaneous_growth: sample.instantaneous_growth,
            effector_level: sample.effector_level,
            mrna_total: sample.mrna_total,
            protein_pool_json: serde_json::to_string(&sample.protein_pool)?,
        };

        self.writer.serialize(entry)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grnforge_schemas::environment::SignalPhase;

    #[test]
    fn writes_one_row_per_sample() {
        let path = std::env::temp_dir().join(format!("grnforge-logger-{}.csv", std::process::id()));
        let path_str = path.to_str().unwrap();
        let mut logger = TrajectoryLogger::new(path_str).unwrap();
        for t in [0.0, 1.5] {
            let sample = TrajectorySample {
                time: t,
                phase: SignalPhase::B,
                log_cell_size: 0.25 * t,
                instantaneous_growth: 0.25,
                effector_level: 12.0,
                protein_pool: vec![10.0, 2.5],
                mrna_total: 4,
            };
            logger.log_sample(&sample).unwrap();
        }
        drop(logger);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "time");
        assert_eq!(&headers[6], "protein_pool_json");
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][1], "B");
        assert_eq!(&rows[1][6], "[10.0,2.5]");
        std::fs::remove_file(&path).unwrap();
    }
}
