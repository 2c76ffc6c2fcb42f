//! Regular-grid terrain mesh: height-displaced vertices and triangle indices.
//!
//! Vertices are laid out row-major (x fastest, then z). Each grid cell becomes
//! two triangles wound so that `(b - a) × (c - a)` points along +Y.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color_band::{ColorBand, Rgba, classify};
use crate::error::TerrainError;
use crate::height_shaper::{ShapeConfig, shape};
use crate::noise_sampler::{NoiseConfig, NoiseSampler};

/// Grid dimensions in cells. Vertex counts per axis are `width + 1` and `depth + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub width: u32,
    pub depth: u32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            width: 64,
            depth: 64,
        }
    }
}

impl GridSpec {
    pub fn new(width: u32, depth: u32) -> Self {
        Self { width, depth }
    }

    /// Vertices along x.
    #[inline]
    pub fn row_len(&self) -> u32 {
        self.width + 1
    }

    /// Total vertex count, computed without overflow.
    pub fn vertex_count_u64(&self) -> u64 {
        (self.width as u64 + 1) * (self.depth as u64 + 1)
    }

    /// Total triangle count (`width * depth * 2`).
    pub fn triangle_count_u64(&self) -> u64 {
        self.width as u64 * self.depth as u64 * 2
    }

    /// Reject grids whose vertices cannot all be addressed by a `u32` index.
    pub fn validate(&self) -> Result<(), TerrainError> {
        let vertex_count = self.vertex_count_u64();
        if vertex_count > u32::MAX as u64 {
            return Err(TerrainError::GridTooLarge {
                width: self.width,
                depth: self.depth,
                vertex_count,
            });
        }
        Ok(())
    }

    /// Row-major vertex index of grid point `(x, z)`.
    #[inline]
    pub fn vertex_index(&self, x: u32, z: u32) -> u32 {
        z * self.row_len() + x
    }

    /// The two triangles covering cell `(x, z)`.
    #[inline]
    pub fn cell_triangles(&self, x: u32, z: u32) -> [[u32; 3]; 2] {
        let row = self.row_len();
        let v = self.vertex_index(x, z);
        [[v, v + row, v + 1], [v + 1, v + row, v + row + 1]]
    }
}

/// One displaced grid vertex.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainVertex {
    /// `(x, shaped height, z)` in grid-local units.
    pub position: DVec3,
    /// Pre-shaping noise value used for coloring and spawn rules.
    pub raw_height: f64,
    pub color: Rgba,
}

/// GPU-ready vertex: position and color as `f32`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuTerrainVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

static_assertions::assert_eq_size!(GpuTerrainVertex, [u8; 28]);

/// The output of a mesh build.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TerrainMesh {
    pub grid: GridSpec,
    /// Row-major vertex buffer.
    pub vertices: Vec<TerrainVertex>,
    /// Triangle list, one `[a, b, c]` per triangle.
    pub triangles: Vec<[u32; 3]>,
}

impl TerrainMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Flat index buffer view of [`Self::triangles`].
    pub fn indices(&self) -> &[u32] {
        bytemuck::cast_slice(&self.triangles)
    }

    /// Raw heights in vertex order.
    pub fn raw_heights(&self) -> impl Iterator<Item = f64> + '_ {
        self.vertices.iter().map(|v| v.raw_height)
    }

    /// Convert to the packed upload format.
    pub fn gpu_vertices(&self) -> Vec<GpuTerrainVertex> {
        self.vertices
            .iter()
            .map(|v| GpuTerrainVertex {
                position: v.position.as_vec3().to_array(),
                color: v.color.to_array(),
            })
            .collect()
    }

    /// Minimum and maximum shaped height, or `None` for an empty mesh.
    pub fn height_bounds(&self) -> Option<(f64, f64)> {
        self.vertices.iter().map(|v| v.position.y).fold(None, |acc, y| {
            Some(match acc {
                None => (y, y),
                Some((lo, hi)) => (lo.min(y), hi.max(y)),
            })
        })
    }
}

/// Build the displaced, colored grid mesh.
///
/// All configuration is validated before any buffer is allocated.
pub fn build(
    grid: GridSpec,
    noise: &NoiseConfig,
    shape_config: &ShapeConfig,
    bands: &[ColorBand],
) -> Result<TerrainMesh, TerrainError> {
    grid.validate()?;
    noise.validate()?;
    noise.validate_domain(grid)?;
    shape_config.validate()?;

    let sampler = NoiseSampler::new(noise.clone());
    let vertices = build_vertices(grid, &sampler, shape_config, bands);
    let triangles = build_triangles(grid);

    debug!(
        width = grid.width,
        depth = grid.depth,
        vertices = vertices.len(),
        triangles = triangles.len(),
        "built terrain mesh"
    );

    Ok(TerrainMesh {
        grid,
        vertices,
        triangles,
    })
}

fn build_vertices(
    grid: GridSpec,
    sampler: &NoiseSampler,
    shape_config: &ShapeConfig,
    bands: &[ColorBand],
) -> Vec<TerrainVertex> {
    let mut vertices = Vec::with_capacity(grid.vertex_count_u64() as usize);
    for z in 0..=grid.depth {
        for x in 0..=grid.width {
            let (fx, fz) = (x as f64, z as f64);
            let raw_height = sampler.sample(fx, fz);
            vertices.push(TerrainVertex {
                position: DVec3::new(fx, shape(raw_height, shape_config), fz),
                raw_height,
                color: classify(raw_height, bands),
            });
        }
    }
    vertices
}

/// Triangle list for every cell of `grid`. Requires a validated grid.
pub fn build_triangles(grid: GridSpec) -> Vec<[u32; 3]> {
    let mut triangles = Vec::with_capacity(grid.triangle_count_u64() as usize);
    for z in 0..grid.depth {
        for x in 0..grid.width {
            triangles.extend_from_slice(&grid.cell_triangles(x, z));
        }
    }
    triangles
}
