//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use strata_terrain::ShapePolicy;

use crate::Config;

/// Shaping policy as accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Elevation,
    Terrace,
}

impl From<PolicyArg> for ShapePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Elevation => ShapePolicy::Elevation,
            PolicyArg::Terrace => ShapePolicy::Terrace,
        }
    }
}

/// Strata command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "strata", about = "Procedural terrain mesh and prop placement")]
pub struct CliArgs {
    /// Grid width in cells.
    #[arg(long)]
    pub width: Option<u32>,

    /// Grid depth in cells.
    #[arg(long)]
    pub depth: Option<u32>,

    /// Placement random seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Noise permutation seed.
    #[arg(long)]
    pub noise_seed: Option<u32>,

    /// Number of noise octaves.
    #[arg(long)]
    pub octaves: Option<u32>,

    /// Base noise frequency.
    #[arg(long)]
    pub frequency: Option<f64>,

    /// Height shaping policy.
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Output directory for generated artifacts.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.terrain.grid.width = w;
        }
        if let Some(d) = args.depth {
            self.terrain.grid.depth = d;
        }
        if let Some(seed) = args.seed {
            self.placement.seed = seed;
        }
        if let Some(seed) = args.noise_seed {
            self.terrain.noise.seed = seed;
        }
        if let Some(octaves) = args.octaves {
            self.terrain.noise.octaves = octaves;
        }
        if let Some(frequency) = args.frequency {
            self.terrain.noise.frequency = frequency;
        }
        if let Some(policy) = args.policy {
            self.terrain.shape.policy = policy.into();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(ref dir) = args.output {
            self.output.directory = dir.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(128),
            seed: Some(9),
            policy: Some(PolicyArg::Terrace),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.terrain.grid.width, 128);
        assert_eq!(config.placement.seed, 9);
        assert_eq!(config.terrain.shape.policy, ShapePolicy::Terrace);
        // Non-overridden fields retain defaults
        assert_eq!(config.terrain.grid.depth, 64);
        assert_eq!(config.terrain.noise.octaves, 3);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::try_parse_from([
            "strata",
            "--width",
            "10",
            "--policy",
            "terrace",
            "--frequency",
            "0.2",
            "--output",
            "out",
        ])
        .unwrap();
        assert_eq!(args.width, Some(10));
        assert_eq!(args.policy, Some(PolicyArg::Terrace));
        assert_eq!(args.frequency, Some(0.2));
        assert_eq!(args.output, Some(PathBuf::from("out")));
    }
}
