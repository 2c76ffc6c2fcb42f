//! Per-vertex surface normals and the lookup used by normal-aligned placement.

use glam::DVec3;

use crate::grid_mesh::TerrainMesh;

/// Supplies a unit surface normal for a vertex index of a built mesh.
pub trait NormalLookup {
    /// Number of vertices covered.
    fn len(&self) -> usize;

    /// Normal at `index`. Only called with `index < self.len()`.
    fn normal(&self, index: usize) -> DVec3;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NormalLookup for [DVec3] {
    fn len(&self) -> usize {
        <[DVec3]>::len(self)
    }

    fn normal(&self, index: usize) -> DVec3 {
        self[index]
    }
}

impl NormalLookup for Vec<DVec3> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn normal(&self, index: usize) -> DVec3 {
        self[index]
    }
}

/// Smoothed vertex normals computed from a mesh's triangles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexNormals {
    normals: Vec<DVec3>,
}

impl VertexNormals {
    /// Area-weighted average of adjacent face normals.
    ///
    /// Vertices touched by no triangle, or whose adjacent faces cancel out,
    /// get straight up.
    pub fn compute(mesh: &TerrainMesh) -> Self {
        let mut normals = vec![DVec3::ZERO; mesh.vertices.len()];

        for &[a, b, c] in &mesh.triangles {
            let (a, b, c) = (a as usize, b as usize, c as usize);
            let pa = mesh.vertices[a].position;
            let pb = mesh.vertices[b].position;
            let pc = mesh.vertices[c].position;
            // Unnormalized cross product weights each face by twice its area.
            let face = (pb - pa).cross(pc - pa);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }

        for n in &mut normals {
            *n = n.try_normalize().unwrap_or(DVec3::Y);
        }

        Self { normals }
    }

    pub fn as_slice(&self) -> &[DVec3] {
        &self.normals
    }

    pub fn into_inner(self) -> Vec<DVec3> {
        self.normals
    }
}

impl NormalLookup for VertexNormals {
    fn len(&self) -> usize {
        self.normals.len()
    }

    fn normal(&self, index: usize) -> DVec3 {
        self.normals[index]
    }
}
