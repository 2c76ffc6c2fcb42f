//! Headless host for the terrain pipeline.
//!
//! Loads `config.ron` (CLI flags override it), runs one generation pass,
//! realizes the placements, and writes the mesh, a color preview and the
//! placement list to the output directory.
//! Run with `cargo run -p strata-demo -- --width 128 --policy terrace`.

mod export;
mod host;

use std::path::PathBuf;

use clap::Parser;
use strata_config::{CliArgs, Config, default_config_dir};
use strata_log::init_logging;
use strata_terrain::{GenerationResult, TerrainError, regenerate_seeded};
use tracing::{error, info};

use crate::export::{
    ExportError, render_preview, write_obj_file, write_placements_file, write_png,
};
use crate::host::InstanceSet;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("terrain generation refused: {0}")]
    Terrain(#[from] TerrainError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

fn main() {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(|| default_config_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let (mut config, load_error) = match Config::load_or_create(&config_dir) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.apply_cli_overrides(&args);

    init_logging(
        config.debug.log_dir.as_deref(),
        cfg!(debug_assertions),
        Some(&config),
    );
    if let Some(e) = load_error {
        error!("using default config, {}: {e}", config_dir.display());
    }

    let mut instances = InstanceSet::default();
    if let Err(e) = run(&config, &mut instances) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(config: &Config, instances: &mut InstanceSet) -> Result<(), DemoError> {
    let result = regenerate_seeded(
        &config.terrain,
        &config.placement.context(),
        config.placement.seed,
    )?;

    let stats = instances.replace_all(&result.placements, &config.terrain.spawn_rules);
    info!(
        destroyed = stats.destroyed,
        created = stats.created,
        "realized placements"
    );
    for (rule, count) in result
        .placements_per_rule(config.terrain.spawn_rules.len())
        .iter()
        .enumerate()
    {
        let prototype = config.terrain.spawn_rules[rule].prototype.0;
        info!(rule, prototype, count, "rule summary");
    }
    if let Some((lo, hi)) = result.mesh.height_bounds() {
        info!(min = lo, max = hi, hash = result.content_hash(), "mesh summary");
    }

    write_outputs(config, &result)
}

fn write_outputs(config: &Config, result: &GenerationResult) -> Result<(), DemoError> {
    let output = &config.output;
    if !(output.write_obj || output.write_preview || output.write_placements) {
        return Ok(());
    }
    std::fs::create_dir_all(&output.directory).map_err(ExportError::from)?;

    if output.write_obj {
        let path = output.directory.join("terrain.obj");
        write_obj_file(&result.mesh, &path)?;
        info!("wrote {}", path.display());
    }
    if output.write_preview {
        let path = output.directory.join("preview.png");
        write_png(&render_preview(&result.mesh), &path)?;
        info!("wrote {}", path.display());
    }
    if output.write_placements {
        let path = output.directory.join("placements.ron");
        write_placements_file(&result.placements, &config.terrain.spawn_rules, &path)?;
        info!("wrote {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_terrain::{PrototypeId, SpawnRule};

    #[test]
    fn test_run_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.terrain.grid.width = 8;
        config.terrain.grid.depth = 8;
        config.output.directory = dir.path().to_path_buf();

        let mut instances = InstanceSet::default();
        run(&config, &mut instances).unwrap();

        for name in ["terrain.obj", "preview.png", "placements.ron"] {
            assert!(dir.path().join(name).exists(), "{name} missing");
        }
    }

    #[test]
    fn test_invalid_config_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut config = Config::default();
        config.terrain.noise.octaves = 0;
        config.output.directory = out.clone();

        let mut instances = InstanceSet::default();
        let err = run(&config, &mut instances).unwrap_err();
        assert!(matches!(err, DemoError::Terrain(TerrainError::ZeroOctaves)));
        assert!(!out.exists(), "refused passes must not touch the output");
        assert!(instances.is_empty());
    }

    #[test]
    fn test_second_pass_replaces_instances() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.terrain.grid.width = 6;
        config.terrain.grid.depth = 6;
        config.terrain.spawn_rules = vec![SpawnRule::new(PrototypeId(0), (-1.0, 2.0), 1.0)];
        config.output.directory = dir.path().to_path_buf();
        config.output.write_obj = false;
        config.output.write_preview = false;
        config.output.write_placements = false;

        let mut instances = InstanceSet::default();
        run(&config, &mut instances).unwrap();
        run(&config, &mut instances).unwrap();
        assert_eq!(instances.len(), 49);
    }
}
