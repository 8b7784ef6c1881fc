//! Host side of the tally sensor-average service
//!
//! Wires the platform-independent [`tally_core`] engine to a JSON document
//! store and to the header-based request protocol used by the devices.

pub mod config;
pub mod handler;
pub mod store;

pub use config::{Config, ConfigError, StoreConfig};
pub use handler::{Handler, HttpResponse, Status};
pub use store::{DocumentStore, StoreError};
pub use tally_core;
