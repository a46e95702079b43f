//! Strata common library
//!
//! Ambient plumbing shared by services embedding the Strata crates:
//! - logging initialisation (bracketed text or JSON)
//! - layered configuration loading (files, then `STRATA_` env overrides)

pub mod config;
pub mod error;
pub mod logging;

pub use config::{load_config, load_config_from_dir, load_config_from_file, StrataConfig};
pub use error::{CommonError, Result};
pub use logging::{init_logging, BracketedLevelFormat, LogFormat, LoggingConfig};
