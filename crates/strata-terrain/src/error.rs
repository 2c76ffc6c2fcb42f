//! Error and warning types for terrain generation.

/// Configuration problems that make a generation pass impossible.
///
/// Every variant is raised before any vertex or index buffer is allocated, so a
/// failed pass never leaves partial mesh state behind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TerrainError {
    /// `(width + 1) * (depth + 1)` does not fit a 32-bit vertex index.
    #[error("grid {width}x{depth} needs {vertex_count} vertices, exceeding the u32 index range")]
    GridTooLarge {
        width: u32,
        depth: u32,
        vertex_count: u64,
    },

    /// Noise must accumulate at least one octave.
    #[error("noise octaves must be at least 1")]
    ZeroOctaves,

    /// Base noise frequency outside `[0, 0.5]`.
    #[error("noise frequency {0} is outside [0, 0.5]")]
    FrequencyOutOfRange(f64),

    /// Elevation exponent outside `[1, 10]`.
    #[error("elevation exponent {0} is outside [1, 10]")]
    ExponentOutOfRange(f64),

    /// Terrace count outside `[1, 32]`.
    #[error("terrace count {0} is outside [1, 32]")]
    TerraceCountOutOfRange(u32),

    /// A spawn rule's frequency lies outside `[0, 1]`.
    #[error("spawn rule {rule} has frequency {value} outside [0, 1]")]
    SpawnFrequencyOutOfRange { rule: usize, value: f64 },

    /// The last octave would sample Perlin noise beyond its usable coordinate range.
    #[error("noise coordinates reach {coordinate:e}, beyond the supported magnitude 2^52")]
    NoiseDomainTooLarge { coordinate: f64 },

    /// A parameter that must be finite was NaN or infinite.
    #[error("parameter `{0}` must be finite")]
    NonFiniteParameter(&'static str),

    /// The normal lookup does not cover every vertex.
    #[error("normal lookup covers {normals} vertices but the mesh has {vertices}")]
    NormalCountMismatch { vertices: usize, normals: usize },
}

/// Non-fatal degenerate inputs. Generation proceeds with sentinel behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationWarning {
    /// No color bands configured; every vertex gets the magenta sentinel.
    NoColorBands,
    /// No spawn rules configured; the pass produces no placements.
    NoSpawnRules,
    /// The rule's open interval `(min, max)` is empty, so it can never qualify.
    EmptySpawnBand { rule: usize },
}

impl std::fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoColorBands => write!(f, "no color bands configured, using fallback color"),
            Self::NoSpawnRules => write!(f, "no spawn rules configured, nothing will be placed"),
            Self::EmptySpawnBand { rule } => {
                write!(f, "spawn rule {rule} has an empty height band and never qualifies")
            }
        }
    }
}
