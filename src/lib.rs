//! pumpzero-bot - Predictive Scale Calibration Bot Library
//!
//! A Discord bot that:
//! - Logs predictive-scale shot measurements to a hosted Airtable table
//! - Suggests the next pump-zero value from a linear fit over the user's history
//! - Falls back to a simple correction heuristic when history is thin or noisy
//! - Lets users review and soft-delete bad records with a confirmed drop flow
//! - Autocompletes firmware build tags from the GitHub branch list
//!
//! # Example
//!
//! ```ignore
//! use pumpzero_bot::estimator;
//! use pumpzero_bot::model::Sample;
//!
//! let samples = vec![
//!     Sample { delta: 1.0, pump_zero: 0.0 },
//!     Sample { delta: 2.0, pump_zero: 1.0 },
//! ];
//! let est = estimator::estimate(36.5, 35.9, 0.15, &samples);
//! println!("next pump-zero: {} ({})", est.next, est.quality);
//! ```

// Core (pure) modules
pub mod model;
pub mod filter;
pub mod estimator;

// Boundaries and glue
pub mod validation;
pub mod error;
pub mod config;
pub mod cache;
pub mod confirm;
pub mod store;
pub mod github;
pub mod discord;
pub mod commands;
pub mod render;
pub mod cli;

// Re-export commonly used types for convenience
pub use error::BotError;
pub use estimator::{estimate, Estimate};
pub use model::{MeasurementRecord, NewRecord, Quality, Sample};
pub use store::RecordStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Predictive Scale Calibration Bot", NAME, VERSION)
}
