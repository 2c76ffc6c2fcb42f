//! Procedural terrain synthesis: averaged octave noise, height shaping, banded
//! vertex colors, grid triangulation, and grid-constrained prop placement.

mod color_band;
mod error;
mod generator;
mod grid_mesh;
mod height_shaper;
mod noise_sampler;
mod normals;
mod placement;

pub use color_band::{ColorBand, Rgba, classify, default_bands};
pub use error::{GenerationWarning, TerrainError};
pub use generator::{
    GenerationResult, TerrainConfig, placement_rng, regenerate, regenerate_seeded,
};
pub use grid_mesh::{
    GpuTerrainVertex, GridSpec, TerrainMesh, TerrainVertex, build as build_mesh, build_triangles,
};
pub use height_shaper::{ShapeConfig, ShapePolicy, elevate, shape, terrace};
pub use noise_sampler::{MAX_FREQUENCY, MAX_NOISE_COORDINATE, NoiseConfig, NoiseSampler};
pub use normals::{NormalLookup, VertexNormals};
pub use placement::{
    OccupancyMask, PlacementContext, PlacementRequest, PrototypeId, SpawnRule, place,
    surface_rotation, validate_rules,
};
