//! Configuration for the Strata terrain tools.
//!
//! Settings persist to disk as RON, accept CLI overrides via clap, and detect
//! changes on reload so hosts know when to regenerate.

mod cli;
mod config;
mod error;

pub use cli::{CliArgs, PolicyArg};
pub use config::{Config, DebugConfig, OutputConfig, PlacementConfig, default_config_dir};
pub use error::ConfigError;
