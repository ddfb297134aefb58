//! Triangle mesh conversion.
//!
//! Polygon primitives can be imported as a renderer-agnostic triangle mesh.
//! Each mesh vertex is a geometry point, so shared points stay shared.

use hgeo_math::{Bounds, Vec3};

use crate::attribute::AttributeOwner;
use crate::geometry::{GeoContainer, NORMAL_ATTRIBUTE};

/// A mesh consisting of vertex positions, optional normals, and triangle indices.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional)
    pub normals: Option<Vec<Vec3>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: Bounds,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        let bounds = Bounds::from_points(&positions);
        Self {
            positions,
            normals,
            indices,
            bounds,
        }
    }

    /// Check if the mesh has normals.
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the mesh center (center of bounding box).
    pub fn center(&self) -> Vec3 {
        self.bounds.center()
    }

    /// Get the mesh size (diagonal length of bounding box).
    pub fn size(&self) -> f32 {
        self.bounds.extent().length()
    }
}

impl GeoContainer {
    /// Convert the closed polygons of this geometry to a triangle mesh.
    ///
    /// Polygons are fan triangulated. Open polylines, polygons with fewer
    /// than three vertices and curves are ignored. Positions come from `P`,
    /// normals from a point `N` attribute when there is one.
    pub fn to_mesh(&self) -> Mesh {
        let point_refs = self.point_refs();
        let mut indices = Vec::new();
        let mut skipped = 0usize;

        for poly in self.poly_primitives() {
            let count = poly.vertices.len();
            if !poly.closed || count < 3 {
                skipped += 1;
                continue;
            }

            // Fan triangulation: for a polygon with vertices [0, 1, 2, 3, ...n-1]
            // create triangles: (0,1,2), (0,2,3), (0,3,4), ... (0,n-2,n-1)
            let point = |i: usize| point_refs[poly.vertices[i]] as u32;
            for i in 1..(count - 1) {
                indices.push(point(0));
                indices.push(point(i));
                indices.push(point(i + 1));
            }
        }

        if skipped > 0 {
            log::debug!("Skipped {} open or degenerate polygons", skipped);
        }

        let normals = self.vec3_values(NORMAL_ATTRIBUTE, AttributeOwner::Point);
        Mesh::new(self.positions(), indices, normals)
    }
}
