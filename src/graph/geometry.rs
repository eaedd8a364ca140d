//! Geometry metadata describing how co-located arrays' tuples map onto
//! spatial elements.
//!
//! A geometry node carries structural metadata only: either a regular grid
//! description (dimensions, spacing, origin) or [`DataPath`] references to
//! sibling index arrays holding explicit vertices and connectivity. The
//! referenced arrays are ordinary array nodes resolved through the owning
//! `DataStructure`.

use crate::path::DataPath;
use serde::{Deserialize, Serialize};

/// Structural metadata of one geometry node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "geometry")]
pub enum Geometry {
    /// Regular grid of cells.
    Image {
        /// Cell counts along x, y, z.
        dimensions: [usize; 3],
        /// Cell size along x, y, z.
        spacing: [f32; 3],
        /// Position of the grid origin.
        origin: [f32; 3],
    },
    /// Unconnected points; `vertices` references the coordinate array.
    Vertex { vertices: DataPath },
    /// Line segments between shared vertices.
    Edge {
        vertices: DataPath,
        edges: DataPath,
    },
    /// Triangulated surface.
    Triangle {
        vertices: DataPath,
        faces: DataPath,
    },
    /// Quadrilateral surface.
    Quad {
        vertices: DataPath,
        faces: DataPath,
    },
    /// Tetrahedral volume mesh.
    Tetrahedral {
        vertices: DataPath,
        cells: DataPath,
    },
    /// Hexahedral volume mesh.
    Hexahedral {
        vertices: DataPath,
        cells: DataPath,
    },
}

impl Geometry {
    /// The serialized type tag of this geometry variant.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Geometry::Image { .. } => "ImageGeom",
            Geometry::Vertex { .. } => "VertexGeom",
            Geometry::Edge { .. } => "EdgeGeom",
            Geometry::Triangle { .. } => "TriangleGeom",
            Geometry::Quad { .. } => "QuadGeom",
            Geometry::Tetrahedral { .. } => "TetrahedralGeom",
            Geometry::Hexahedral { .. } => "HexahedralGeom",
        }
    }

    /// Number of cells for a grid geometry, `None` for mesh geometries
    /// (their element count lives in the referenced connectivity array).
    pub fn cell_count(&self) -> Option<usize> {
        match self {
            Geometry::Image { dimensions, .. } => Some(dimensions.iter().product()),
            _ => None,
        }
    }

    /// Paths to sibling arrays this geometry references.
    pub fn referenced_paths(&self) -> Vec<&DataPath> {
        match self {
            Geometry::Image { .. } => Vec::new(),
            Geometry::Vertex { vertices } => vec![vertices],
            Geometry::Edge { vertices, edges } => vec![vertices, edges],
            Geometry::Triangle { vertices, faces } | Geometry::Quad { vertices, faces } => {
                vec![vertices, faces]
            }
            Geometry::Tetrahedral { vertices, cells }
            | Geometry::Hexahedral { vertices, cells } => vec![vertices, cells],
        }
    }

    /// Mutable access to the referenced paths, used when a deep copy
    /// rewrites references into the copied subtree.
    pub fn referenced_paths_mut(&mut self) -> Vec<&mut DataPath> {
        match self {
            Geometry::Image { .. } => Vec::new(),
            Geometry::Vertex { vertices } => vec![vertices],
            Geometry::Edge { vertices, edges } => vec![vertices, edges],
            Geometry::Triangle { vertices, faces } | Geometry::Quad { vertices, faces } => {
                vec![vertices, faces]
            }
            Geometry::Tetrahedral { vertices, cells }
            | Geometry::Hexahedral { vertices, cells } => vec![vertices, cells],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_cell_count() {
        let geom = Geometry::Image {
            dimensions: [2, 2, 2],
            spacing: [1.0; 3],
            origin: [0.0; 3],
        };
        assert_eq!(geom.cell_count(), Some(8));
        assert!(geom.referenced_paths().is_empty());
        assert_eq!(geom.type_tag(), "ImageGeom");
    }

    #[test]
    fn test_mesh_references() {
        let geom = Geometry::Triangle {
            vertices: "Geo/Vertices".parse().unwrap(),
            faces: "Geo/Faces".parse().unwrap(),
        };
        assert_eq!(geom.cell_count(), None);
        let refs = geom.referenced_paths();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].to_string(), "Geo/Vertices");
        assert_eq!(geom.type_tag(), "TriangleGeom");
    }

    #[test]
    fn test_serde_round_trip() {
        let geom = Geometry::Image {
            dimensions: [4, 2, 1],
            spacing: [0.5, 0.5, 1.0],
            origin: [0.0, 0.0, 0.0],
        };
        let json = serde_json::to_string(&geom).unwrap();
        let back: Geometry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, geom);
    }
}
