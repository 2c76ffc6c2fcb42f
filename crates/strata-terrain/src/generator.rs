//! The full generation pass: validate, build mesh, compute normals, place props.
//!
//! The core keeps no state between passes. Hosts decide when to call
//! [`regenerate`] and replace everything they realized from the previous result.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use crate::color_band::{ColorBand, default_bands};
use crate::error::{GenerationWarning, TerrainError};
use crate::grid_mesh::{self, GridSpec, TerrainMesh};
use crate::height_shaper::ShapeConfig;
use crate::noise_sampler::NoiseConfig;
use crate::normals::VertexNormals;
use crate::placement::{
    PlacementContext, PlacementRequest, PrototypeId, SpawnRule, place, validate_rules,
};

/// Everything that determines the mesh and the placements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub grid: GridSpec,
    pub noise: NoiseConfig,
    pub shape: ShapeConfig,
    /// Unordered height bands for vertex colors.
    pub bands: Vec<ColorBand>,
    /// Ordered spawn rules; earlier rules win shared vertices.
    pub spawn_rules: Vec<SpawnRule>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            grid: GridSpec::default(),
            noise: NoiseConfig::default(),
            shape: ShapeConfig::default(),
            bands: default_bands(),
            spawn_rules: vec![
                SpawnRule::new(PrototypeId(0), (0.4, 0.65), 0.08),
                SpawnRule::new(PrototypeId(1), (0.65, 0.8), 0.05).with_surface_alignment(),
            ],
        }
    }
}

impl TerrainConfig {
    /// Reject invalid configurations and collect non-fatal warnings.
    pub fn validate(&self) -> Result<Vec<GenerationWarning>, TerrainError> {
        self.grid.validate()?;
        self.noise.validate()?;
        self.noise.validate_domain(self.grid)?;
        self.shape.validate()?;

        let mut warnings = Vec::new();
        if self.bands.is_empty() {
            warnings.push(GenerationWarning::NoColorBands);
        }
        warnings.extend(validate_rules(&self.spawn_rules)?);
        Ok(warnings)
    }
}

/// Output of one generation pass. Ownership passes to the host.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationResult {
    pub mesh: TerrainMesh,
    pub normals: VertexNormals,
    /// Ordered by ascending vertex index.
    pub placements: Vec<PlacementRequest>,
    pub warnings: Vec<GenerationWarning>,
}

impl GenerationResult {
    /// Digest of every buffer, for comparing passes.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for v in &self.mesh.vertices {
            v.position.to_array().map(f64::to_bits).hash(&mut hasher);
            v.raw_height.to_bits().hash(&mut hasher);
            v.color.to_array().map(f32::to_bits).hash(&mut hasher);
        }
        self.mesh.triangles.hash(&mut hasher);
        for p in &self.placements {
            p.vertex_index.hash(&mut hasher);
            p.rule_index.hash(&mut hasher);
            p.world_position.to_array().map(f64::to_bits).hash(&mut hasher);
            p.orientation.to_array().map(f64::to_bits).hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Number of placements produced by each rule, indexed like the rule list.
    pub fn placements_per_rule(&self, rule_count: usize) -> Vec<usize> {
        let mut counts = vec![0; rule_count];
        for p in &self.placements {
            if let Some(c) = counts.get_mut(p.rule_index) {
                *c += 1;
            }
        }
        counts
    }
}

/// The random stream used for placement draws.
pub fn placement_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Run a complete pass with an injected random source.
///
/// Invalid configurations fail before any buffer is allocated.
pub fn regenerate<R: Rng + ?Sized>(
    config: &TerrainConfig,
    context: &PlacementContext,
    rng: &mut R,
) -> Result<GenerationResult, TerrainError> {
    let _span = info_span!(
        "regenerate",
        width = config.grid.width,
        depth = config.grid.depth
    )
    .entered();

    let warnings = config.validate()?;
    for w in &warnings {
        warn!("{w}");
    }

    let mesh = grid_mesh::build(config.grid, &config.noise, &config.shape, &config.bands)?;
    let normals = VertexNormals::compute(&mesh);
    let placements = place(&mesh.vertices, &config.spawn_rules, &normals, context, rng)?;

    info!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        placements = placements.len(),
        "terrain regenerated"
    );

    Ok(GenerationResult {
        mesh,
        normals,
        placements,
        warnings,
    })
}

/// [`regenerate`] with a [`ChaCha8Rng`] seeded from `seed`.
pub fn regenerate_seeded(
    config: &TerrainConfig,
    context: &PlacementContext,
    seed: u64,
) -> Result<GenerationResult, TerrainError> {
    let mut rng = placement_rng(seed);
    regenerate(config, context, &mut rng)
}
