//! Grid-constrained prop placement.
//!
//! Walks mesh vertices in index order and offers each free vertex to the spawn
//! rules in configuration order. The first rule whose height band contains the
//! vertex's raw height and whose frequency draw succeeds claims the vertex, so
//! no vertex ever holds more than one placement.

use std::cmp::Ordering;

use glam::{DQuat, DVec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{GenerationWarning, TerrainError};
use crate::grid_mesh::TerrainVertex;
use crate::normals::NormalLookup;

/// Opaque handle to the host-side prototype a rule instantiates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrototypeId(pub u32);

/// A placement policy: a raw-height band plus a probabilistic gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnRule {
    pub prototype: PrototypeId,
    /// Exclusive lower bound on raw height.
    pub spawn_level_min: f64,
    /// Exclusive upper bound on raw height.
    pub spawn_level_max: f64,
    /// Probability in `[0, 1]` that a qualifying vertex is claimed.
    pub spawn_frequency: f64,
    /// Align the instance's up axis with the surface normal.
    #[serde(default)]
    pub rotate_on_surface_normal: bool,
}

impl SpawnRule {
    pub fn new(prototype: PrototypeId, level: (f64, f64), frequency: f64) -> Self {
        Self {
            prototype,
            spawn_level_min: level.0,
            spawn_level_max: level.1,
            spawn_frequency: frequency,
            rotate_on_surface_normal: false,
        }
    }

    pub fn with_surface_alignment(mut self) -> Self {
        self.rotate_on_surface_normal = true;
        self
    }

    /// `min < raw < max`.
    #[inline]
    pub fn qualifies(&self, raw_height: f64) -> bool {
        self.spawn_level_min < raw_height && raw_height < self.spawn_level_max
    }

    /// True when no value can satisfy [`Self::qualifies`].
    pub fn has_empty_band(&self) -> bool {
        self.spawn_level_min.partial_cmp(&self.spawn_level_max) != Some(Ordering::Less)
    }
}

/// Check every rule's frequency and report degenerate rule sets.
pub fn validate_rules(rules: &[SpawnRule]) -> Result<Vec<GenerationWarning>, TerrainError> {
    let mut warnings = Vec::new();
    if rules.is_empty() {
        warnings.push(GenerationWarning::NoSpawnRules);
    }
    for (rule, r) in rules.iter().enumerate() {
        if !(0.0..=1.0).contains(&r.spawn_frequency) {
            return Err(TerrainError::SpawnFrequencyOutOfRange {
                rule,
                value: r.spawn_frequency,
            });
        }
        if r.has_empty_band() {
            warnings.push(GenerationWarning::EmptySpawnBand { rule });
        }
    }
    Ok(warnings)
}

/// Host transform the placements are expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacementContext {
    /// Added to every vertex position.
    pub origin: DVec3,
    /// Composed after the surface alignment rotation.
    pub base_rotation: DQuat,
}

impl Default for PlacementContext {
    fn default() -> Self {
        Self {
            origin: DVec3::ZERO,
            base_rotation: DQuat::IDENTITY,
        }
    }
}

/// A request for the host to instantiate `rules[rule_index].prototype`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub vertex_index: u32,
    pub world_position: DVec3,
    pub orientation: DQuat,
    pub rule_index: usize,
}

/// One claim bit per vertex.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OccupancyMask {
    words: Vec<u64>,
    len: usize,
}

impl OccupancyMask {
    /// All vertices free.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_occupied(&self, index: usize) -> bool {
        index < self.len && self.words[index / 64] & (1u64 << (index % 64)) != 0
    }

    /// Mark `index` occupied. Returns `false` if it was already taken or out of range.
    #[inline]
    pub fn claim(&mut self, index: usize) -> bool {
        if index >= self.len || self.is_occupied(index) {
            return false;
        }
        self.words[index / 64] |= 1u64 << (index % 64);
        true
    }

    pub fn occupied_count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Run one placement pass over `vertices`.
///
/// One uniform draw is taken from `rng` per qualifying (vertex, rule) pair, in
/// ascending vertex order, so a seeded generator reproduces the exact result.
/// `normals` is only read for rules with `rotate_on_surface_normal`.
pub fn place<N, R>(
    vertices: &[TerrainVertex],
    rules: &[SpawnRule],
    normals: &N,
    context: &PlacementContext,
    rng: &mut R,
) -> Result<Vec<PlacementRequest>, TerrainError>
where
    N: NormalLookup + ?Sized,
    R: Rng + ?Sized,
{
    validate_rules(rules)?;
    let needs_normals = rules.iter().any(|r| r.rotate_on_surface_normal);
    if needs_normals && normals.len() < vertices.len() {
        return Err(TerrainError::NormalCountMismatch {
            vertices: vertices.len(),
            normals: normals.len(),
        });
    }

    let mut occupancy = OccupancyMask::new(vertices.len());
    let mut requests = Vec::new();

    for (index, vertex) in vertices.iter().enumerate() {
        if occupancy.is_occupied(index) {
            continue;
        }
        for (rule_index, rule) in rules.iter().enumerate() {
            if !rule.qualifies(vertex.raw_height) {
                continue;
            }
            let draw: f64 = rng.random();
            if draw >= rule.spawn_frequency {
                continue;
            }

            occupancy.claim(index);
            let orientation = if rule.rotate_on_surface_normal {
                surface_rotation(normals.normal(index)) * context.base_rotation
            } else {
                DQuat::IDENTITY
            };
            trace!(vertex = index, rule = rule_index, "placement claimed vertex");
            requests.push(PlacementRequest {
                vertex_index: index as u32,
                world_position: vertex.position + context.origin,
                orientation,
                rule_index,
            });
            break;
        }
    }

    Ok(requests)
}

/// Shortest-arc rotation taking world up onto `normal`.
pub fn surface_rotation(normal: DVec3) -> DQuat {
    let n = normal.try_normalize().unwrap_or(DVec3::Y);
    DQuat::from_rotation_arc(DVec3::Y, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_band::Rgba;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    const EPSILON: f64 = 1e-9;

    fn vertices(raw: &[f64]) -> Vec<TerrainVertex> {
        raw.iter()
            .enumerate()
            .map(|(i, &raw_height)| TerrainVertex {
                position: DVec3::new(i as f64, raw_height * 10.0, 0.0),
                raw_height,
                color: Rgba::WHITE,
            })
            .collect()
    }

    fn spread(count: usize) -> Vec<f64> {
        (0..count).map(|i| (i as f64 + 0.5) / count as f64).collect()
    }

    fn up_normals(count: usize) -> Vec<DVec3> {
        vec![DVec3::Y; count]
    }

    #[test]
    fn test_certain_rule_claims_every_vertex() {
        let verts = vertices(&spread(100));
        let rules = [SpawnRule::new(PrototypeId(1), (0.0, 1.0), 1.0)];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let out = place(
            &verts,
            &rules,
            &up_normals(100),
            &PlacementContext::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(out.len(), 100);
        for (i, req) in out.iter().enumerate() {
            assert_eq!(req.vertex_index, i as u32, "requests must ascend by vertex");
            assert_eq!(req.rule_index, 0);
            assert_eq!(req.orientation, DQuat::IDENTITY);
        }
    }

    #[test]
    fn test_never_more_than_one_placement_per_vertex() {
        let verts = vertices(&spread(500));
        let rules = [
            SpawnRule::new(PrototypeId(1), (0.0, 0.8), 0.6),
            SpawnRule::new(PrototypeId(2), (0.1, 1.0), 0.9),
            SpawnRule::new(PrototypeId(3), (-1.0, 2.0), 1.0),
        ];
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let out = place(
                &verts,
                &rules,
                &up_normals(500),
                &PlacementContext::default(),
                &mut rng,
            )
            .unwrap();
            let unique: HashSet<u32> = out.iter().map(|r| r.vertex_index).collect();
            assert_eq!(unique.len(), out.len(), "seed {seed}: duplicate vertex claims");
            // The catch-all last rule guarantees every vertex is claimed.
            assert_eq!(out.len(), 500);
        }
    }

    #[test]
    fn test_earlier_rules_have_priority() {
        let verts = vertices(&spread(50));
        let rules = [
            SpawnRule::new(PrototypeId(10), (0.0, 1.0), 1.0),
            SpawnRule::new(PrototypeId(20), (0.0, 1.0), 1.0),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let out = place(
            &verts,
            &rules,
            &up_normals(50),
            &PlacementContext::default(),
            &mut rng,
        )
        .unwrap();
        assert!(out.iter().all(|r| r.rule_index == 0));
    }

    #[test]
    fn test_band_bounds_are_exclusive() {
        let verts = vertices(&[0.2, 0.3, 0.5, 0.7, 0.8]);
        let rules = [SpawnRule::new(PrototypeId(1), (0.2, 0.8), 1.0)];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let out = place(
            &verts,
            &rules,
            &up_normals(5),
            &PlacementContext::default(),
            &mut rng,
        )
        .unwrap();
        let claimed: Vec<u32> = out.iter().map(|r| r.vertex_index).collect();
        assert_eq!(claimed, vec![1, 2, 3]);
    }

    #[test]
    fn test_zero_frequency_never_places() {
        let verts = vertices(&spread(64));
        let rules = [SpawnRule::new(PrototypeId(1), (0.0, 1.0), 0.0)];
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let out = place(
            &verts,
            &rules,
            &up_normals(64),
            &PlacementContext::default(),
            &mut rng,
        )
        .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_failed_draw_falls_through_to_next_rule() {
        let verts = vertices(&spread(200));
        let rules = [
            SpawnRule::new(PrototypeId(1), (0.0, 1.0), 0.5),
            SpawnRule::new(PrototypeId(2), (0.0, 1.0), 1.0),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let out = place(
            &verts,
            &rules,
            &up_normals(200),
            &PlacementContext::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(out.len(), 200);
        let first = out.iter().filter(|r| r.rule_index == 0).count();
        assert!(
            (60..=140).contains(&first),
            "about half the vertices should go to rule 0, got {first}"
        );
    }

    #[test]
    fn test_draws_consume_stream_in_vertex_order() {
        // Replaying the same uniform stream by hand must match the engine.
        let raw = spread(40);
        let verts = vertices(&raw);
        let rules = [
            SpawnRule::new(PrototypeId(1), (0.0, 0.6), 0.3),
            SpawnRule::new(PrototypeId(2), (0.4, 1.0), 0.7),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let out = place(
            &verts,
            &rules,
            &up_normals(40),
            &PlacementContext::default(),
            &mut rng,
        )
        .unwrap();

        let mut replay = ChaCha8Rng::seed_from_u64(99);
        let mut expected = Vec::new();
        for (i, &h) in raw.iter().enumerate() {
            for (ri, rule) in rules.iter().enumerate() {
                if rule.qualifies(h) {
                    let draw: f64 = replay.random();
                    if draw < rule.spawn_frequency {
                        expected.push((i as u32, ri));
                        break;
                    }
                }
            }
        }
        let got: Vec<(u32, usize)> = out.iter().map(|r| (r.vertex_index, r.rule_index)).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_same_seed_same_placements() {
        let verts = vertices(&spread(300));
        let rules = [SpawnRule::new(PrototypeId(1), (0.1, 0.9), 0.25)];
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            place(&verts, &rules, &up_normals(300), &PlacementContext::default(), &mut rng)
                .unwrap()
        };
        assert_eq!(run(4), run(4));
        assert_ne!(run(4), run(5));
    }

    #[test]
    fn test_world_position_includes_origin() {
        let verts = vertices(&[0.5]);
        let rules = [SpawnRule::new(PrototypeId(1), (0.0, 1.0), 1.0)];
        let context = PlacementContext {
            origin: DVec3::new(100.0, -5.0, 3.0),
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let out = place(&verts, &rules, &up_normals(1), &context, &mut rng).unwrap();
        assert_eq!(out[0].world_position, DVec3::new(100.0, 0.0, 3.0));
    }

    #[test]
    fn test_surface_alignment_rotates_up_onto_normal() {
        let verts = vertices(&[0.5, 0.5]);
        let tilted = DVec3::new(1.0, 1.0, 0.0).normalize();
        let normals = vec![tilted, DVec3::Y];
        let base = DQuat::from_rotation_y(0.75);
        let context = PlacementContext {
            base_rotation: base,
            ..Default::default()
        };
        let rules = [SpawnRule::new(PrototypeId(1), (0.0, 1.0), 1.0).with_surface_alignment()];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let out = place(&verts, &rules, &normals, &context, &mut rng).unwrap();

        let up = out[0].orientation * DVec3::Y;
        assert!((up - tilted).length() < EPSILON, "up axis {up:?} should match normal");
        // With an upright normal only the base rotation remains.
        assert!(out[1].orientation.abs_diff_eq(base, EPSILON));
    }

    #[test]
    fn test_alignment_requires_normals_for_every_vertex() {
        let verts = vertices(&spread(4));
        let rules = [SpawnRule::new(PrototypeId(1), (0.0, 1.0), 1.0).with_surface_alignment()];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = place(&verts, &rules, &up_normals(2), &PlacementContext::default(), &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            TerrainError::NormalCountMismatch {
                vertices: 4,
                normals: 2
            }
        );
    }

    #[test]
    fn test_normals_not_needed_without_alignment() {
        let verts = vertices(&spread(4));
        let rules = [SpawnRule::new(PrototypeId(1), (0.0, 1.0), 1.0)];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let out = place(
            &verts,
            &rules,
            &up_normals(0),
            &PlacementContext::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_invalid_frequency_rejected() {
        let rules = [
            SpawnRule::new(PrototypeId(1), (0.0, 1.0), 0.5),
            SpawnRule::new(PrototypeId(2), (0.0, 1.0), 1.5),
        ];
        assert_eq!(
            validate_rules(&rules),
            Err(TerrainError::SpawnFrequencyOutOfRange { rule: 1, value: 1.5 })
        );
    }

    #[test]
    fn test_degenerate_rule_warnings() {
        assert_eq!(validate_rules(&[]), Ok(vec![GenerationWarning::NoSpawnRules]));
        let rules = [SpawnRule::new(PrototypeId(1), (0.5, 0.5), 0.5)];
        assert_eq!(
            validate_rules(&rules),
            Ok(vec![GenerationWarning::EmptySpawnBand { rule: 0 }])
        );
    }

    #[test]
    fn test_occupancy_mask_claims_once() {
        let mut mask = OccupancyMask::new(130);
        assert!(!mask.is_occupied(129));
        assert!(mask.claim(129));
        assert!(!mask.claim(129));
        assert!(mask.is_occupied(129));
        assert!(!mask.claim(130), "out of range claims fail");
        assert!(mask.claim(0));
        assert_eq!(mask.occupied_count(), 2);
        assert_eq!(mask.len(), 130);
    }
}
