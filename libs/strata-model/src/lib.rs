//! Strata Model Library
//!
//! Sample model and time-series analytics for building telemetry rules.
//! Everything here is synchronous and side-effect free.

//! # Modules
//!
//! - `sample`: Time-stamped readings and value selectors
//! - `statistics`: Min/average/max summaries, standard deviation
//! - `timeseries`: Windowed analytics (interpolation, averages, clipping,
//!   regression, edge counting, hysteresis, series combination)
//! - `health`: Rolling per-point summary, timeliness and health checks
//! - `config`: Tunables for the timeliness and health checks
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use strata_model::{timeseries, Sample};
//!
//! let t = |s| Utc.timestamp_opt(s, 0).unwrap();
//! let samples = vec![
//!     Sample::new(t(0), 10.0),
//!     Sample::new(t(10), 20.0),
//!     Sample::new(t(20), 10.0),
//! ];
//!
//! assert_eq!(timeseries::average(&samples, t(0), t(20)), 15.0);
//! assert_eq!(timeseries::average_above(&samples, t(0), t(20), 15.0), 1.25);
//! ```

pub mod config;
pub mod error;
pub mod health;
pub mod sample;
pub mod statistics;
pub mod timeseries;

// Re-exports for convenience
pub use config::{HealthConfig, TimelinessConfig};
pub use error::{ModelError, Result};
pub use health::{SeriesHealth, SeriesSummary};
pub use sample::{selectors, Sample};
pub use statistics::{calculate_statistics, standard_deviation, Stat};
