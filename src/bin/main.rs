//! Command-line front end for the tally service.
//!
//! Issues one average query or one upload against the configured document
//! store and prints the response, the same way a device request would be
//! answered.
//!
//! ```text
//! tally average --subject raz --duration 6000 --metric temp
//! tally average --details '{"userId":"all","timeDuration":"600","dataType":"rHum"}'
//! tally upload --details "$(cat m5-details.json)"
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use log::{error, info};
use serde_json::{Map, Value};

use tally::config::CONFIG_ENV;
use tally::{Config, DocumentStore, Handler, HttpResponse};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "tally", version, about = "Trailing-window sensor averages")]
struct Cli {
    /// JSON config file
    #[arg(long, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Average one metric over a trailing window
    Average {
        /// Subject or composite alias
        #[arg(long, conflicts_with = "details")]
        subject: Option<String>,

        /// Window length in seconds
        #[arg(long, allow_negative_numbers = true, conflicts_with = "details")]
        duration: Option<f64>,

        /// Metric name (ax, ay, az, temp, rHum, als, prox, rwl)
        #[arg(long, conflicts_with = "details")]
        metric: Option<String>,

        /// Raw `Req-Details` header JSON
        #[arg(long)]
        details: Option<String>,

        /// Evaluation time in seconds since the epoch (defaults to now)
        #[arg(long)]
        now: Option<i64>,
    },
    /// Store one device document
    Upload {
        /// Raw `M5-Details` header JSON
        #[arg(long)]
        details: String,
    },
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Builds a `Req-Details` header from individual flags. Absent flags are
/// left out so the handler reports them.
fn request_header(
    subject: Option<String>,
    duration: Option<f64>,
    metric: Option<String>,
) -> String {
    let mut fields = Map::new();
    if let Some(subject) = subject {
        fields.insert(String::from("userId"), Value::from(subject));
    }
    if let Some(duration) = duration {
        fields.insert(String::from("timeDuration"), Value::from(duration));
    }
    if let Some(metric) = metric {
        fields.insert(String::from("dataType"), Value::from(metric));
    }
    Value::Object(fields).to_string()
}

fn report(response: &HttpResponse) -> ExitCode {
    println!("{}", response.status);
    println!("{}", response.body);
    if response.status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let store = DocumentStore::open(&config.store);
    info!("Using store {}", store.path().display());

    let handler = match Handler::new(&config, &store) {
        Ok(handler) => handler,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let response = match cli.command {
        Command::Average {
            subject,
            duration,
            metric,
            details,
            now,
        } => {
            let header = details.unwrap_or_else(|| request_header(subject, duration, metric));
            handler.average(Some(&header), now.unwrap_or_else(now_secs))
        }
        Command::Upload { details } => handler.upload(Some(&details)),
    };
    drop(handler);

    let code = report(&response);

    if let Err(e) = store.close() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }
    code
}
