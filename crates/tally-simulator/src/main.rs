//! Synthetic device uploads for the tally service.
//!
//! Fills a document store with smoothly varying readings so average queries
//! can be exercised without hardware:
//!
//! ```text
//! tally-simulator --store tally-store.json --subjects raz,taz --count 120 --interval 5
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use log::{error, info};
use serde_json::{Value, json};

use tally::config::{CONFIG_ENV, STORE_PATH_ENV};
use tally::{Config, DocumentStore, StoreError};
use tally_core::SubjectRegistry;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "tally-simulator", version, about = "Generate synthetic device uploads")]
struct Cli {
    /// JSON config file providing the subject registry
    #[arg(long, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Store file to upload into (created if missing)
    #[arg(long, env = STORE_PATH_ENV)]
    store: Option<PathBuf>,

    /// Subjects to generate documents for
    #[arg(long, value_delimiter = ',', default_value = "raz,taz")]
    subjects: Vec<String>,

    /// Documents per subject
    #[arg(long, default_value_t = 120)]
    count: u32,

    /// Seconds between consecutive documents
    #[arg(long, default_value_t = 5)]
    interval: u32,
}

// ---------------------------------------------------------------------------
// Mock data generation
// ---------------------------------------------------------------------------

/// Generates device documents that vary smoothly with capture time.
struct MockSensorGenerator {
    /// Per-subject phase shift so subjects do not report identical values.
    phase: f64,
}

impl MockSensorGenerator {
    fn new(subject_index: usize) -> Self {
        Self {
            phase: subject_index as f64 * 45.0,
        }
    }

    /// Document for `subject` captured at `ts`.
    fn document(&self, subject: &str, ts: i64) -> Value {
        let t = ts as f64 + self.phase;

        // Temperature: 20–26 °C sinusoidal with slow drift
        let temp = 23.0 + 3.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos();

        // Humidity: 40–60 % with different period
        let r_hum = 50.0 + 10.0 * (t / 180.0).sin() + 2.0 * (t / 23.0).cos();

        // Light: daylight-like swell with a faster flicker
        let al = (400.0 + 300.0 * (t / 600.0).sin() + 20.0 * (t / 11.0).cos()).round();
        let rwl = (al * 1.8).round();
        let prox = (5.0 + 4.0 * (t / 90.0).sin()).round();

        // Acceleration: device at rest, gravity on z with small wobble
        let ax = 0.02 * (t / 13.0).sin();
        let ay = 0.02 * (t / 17.0).cos();
        let az = 0.98 + 0.01 * (t / 29.0).sin();

        json!({
            "m5Details": { "ax": ax, "ay": ay, "az": az },
            "shtDetails": { "temp": temp, "rHum": r_hum },
            "vcnlDetails": { "prox": prox, "al": al, "rwl": rwl },
            "otherDetails": { "timeCaptured": ts, "userId": subject }
        })
    }

    /// Returns `count` documents spaced `interval_secs` apart, the last one
    /// captured at `end_ts`.
    fn generate_history(
        &self,
        subject: &str,
        count: u32,
        interval_secs: u32,
        end_ts: i64,
    ) -> Vec<Value> {
        let span = i64::from(count.saturating_sub(1)) * i64::from(interval_secs);
        let start_ts = end_ts.saturating_sub(span);
        (0..count)
            .map(|i| self.document(subject, start_ts + i64::from(i) * i64::from(interval_secs)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

fn upload_all(
    store: &DocumentStore,
    registry: &SubjectRegistry,
    cli: &Cli,
    end_ts: i64,
) -> Result<usize, StoreError> {
    let mut uploaded = 0;
    for (index, subject) in cli.subjects.iter().enumerate() {
        let generator = MockSensorGenerator::new(index);
        for document in generator.generate_history(subject, cli.count, cli.interval, end_ts) {
            store.upload(document, registry)?;
            uploaded += 1;
        }
        info!("Uploaded {} documents for {}", cli.count, subject);
    }
    Ok(uploaded)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("Starting tally simulator");

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = &cli.store {
        config.store.path = path.clone();
    }
    config.store.create_if_missing = true;

    let registry = match config.registry() {
        Ok(registry) => registry,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let end_ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;

    let store = DocumentStore::open(&config.store);
    let uploaded = upload_all(&store, &registry, &cli, end_ts);

    // Persist whatever made it in, even after a rejected upload
    let closed = store.close();

    match (uploaded, closed) {
        (Ok(count), Ok(())) => {
            info!("Wrote {} documents to {}", count, config.store.path.display());
            ExitCode::SUCCESS
        }
        (Err(e), _) | (_, Err(e)) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_spacing() {
        let generator = MockSensorGenerator::new(0);
        let docs = generator.generate_history("raz", 4, 10, 1_000);
        let stamps: Vec<i64> = docs
            .iter()
            .map(|d| d["otherDetails"]["timeCaptured"].as_i64().unwrap())
            .collect();
        assert_eq!(stamps, vec![970, 980, 990, 1_000]);
        assert!(docs.iter().all(|d| d["otherDetails"]["userId"] == "raz"));
    }

    #[test]
    fn test_documents_are_readable() {
        let generator = MockSensorGenerator::new(1);
        let reading = tally::store::document_to_reading(&generator.document("taz", 500)).unwrap();
        assert_eq!(reading.timestamp(), 500);

        let temp = reading.value("shtDetails", "temp").unwrap();
        assert!((19.5..=26.5).contains(&temp));
        assert!(reading.value("vcnlDetails", "al").is_some());
        assert!(reading.value("m5Details", "az").is_some());
    }

    #[test]
    fn test_empty_history() {
        assert!(MockSensorGenerator::new(0).generate_history("raz", 0, 5, 100).is_empty());
    }
}
