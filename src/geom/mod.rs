//! Neutral geometry representation.
//!
//! [`GeometryObject`] is the tagged union moved through the interchange
//! document: a plain polygon mesh, a subdivision surface (base topology plus
//! crease data and a scheme tag), or a point cloud. One object is built per
//! copy, serialized once and discarded; paste deserializes a fresh object
//! and hands it to a target adapter.

use crate::attr::AttributeBuffer;
use crate::topo::{EdgeCreaseMap, FaceTopology};
use crate::util::{positions_approx_eq, Result, Vec3, POSITION_EPSILON};

/// Subdivision scheme tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubdivisionScheme {
    /// Catmull-Clark subdivision.
    #[default]
    CatmullClark,
    /// Loop subdivision (for triangle meshes).
    Loop,
    /// Bilinear subdivision.
    Bilinear,
}

impl SubdivisionScheme {
    /// Parse a scheme from its canonical string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "catmull-clark" | "catmullClark" => Some(SubdivisionScheme::CatmullClark),
            "loop" => Some(SubdivisionScheme::Loop),
            "bilinear" => Some(SubdivisionScheme::Bilinear),
            _ => None,
        }
    }

    /// Canonical string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubdivisionScheme::CatmullClark => "catmull-clark",
            SubdivisionScheme::Loop => "loop",
            SubdivisionScheme::Bilinear => "bilinear",
        }
    }
}

/// Ordered point positions, parallel-indexed with the attribute columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointSet {
    pub positions: Vec<Vec3>,
}

impl PointSet {
    /// Create a point set from positions.
    pub fn new(positions: Vec<Vec3>) -> Self {
        Self { positions }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// One transferable geometry object.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryObject {
    /// Plain polygon mesh.
    Mesh {
        topology: FaceTopology,
        attributes: AttributeBuffer,
    },
    /// Subdivision surface: base cage plus crease data and scheme.
    SubdividedMesh {
        topology: FaceTopology,
        crease: EdgeCreaseMap,
        scheme: SubdivisionScheme,
        attributes: AttributeBuffer,
    },
    /// Point cloud with per-point attributes.
    PointCloud {
        points: PointSet,
        attributes: AttributeBuffer,
    },
}

impl GeometryObject {
    /// Variant name, matching the document discriminator.
    pub fn variant_name(&self) -> &'static str {
        match self {
            GeometryObject::Mesh { .. } => "mesh",
            GeometryObject::SubdividedMesh { .. } => "subdivided_mesh",
            GeometryObject::PointCloud { .. } => "point_cloud",
        }
    }

    /// Cardinality of the attribute domain (vertex or point count).
    pub fn domain_cardinality(&self) -> usize {
        match self {
            GeometryObject::Mesh { topology, .. }
            | GeometryObject::SubdividedMesh { topology, .. } => topology.num_vertices(),
            GeometryObject::PointCloud { points, .. } => points.len(),
        }
    }

    /// The attribute buffer of any variant.
    pub fn attributes(&self) -> &AttributeBuffer {
        match self {
            GeometryObject::Mesh { attributes, .. }
            | GeometryObject::SubdividedMesh { attributes, .. }
            | GeometryObject::PointCloud { attributes, .. } => attributes,
        }
    }

    /// Validate the cross-component invariants of a fully built object.
    ///
    /// Checks attribute cardinality against the domain, and for subdivision
    /// surfaces that every creased edge exists in the base topology.
    pub fn validate(&self) -> Result<()> {
        self.attributes().validate_cardinality(self.domain_cardinality())?;
        if let GeometryObject::SubdividedMesh {
            topology, crease, ..
        } = self
        {
            crease.validate_against(topology)?;
        }
        Ok(())
    }

    /// Structural equality used by the round-trip contract.
    ///
    /// Positions compare within [`POSITION_EPSILON`]; indices, face degrees,
    /// attribute names, scheme tags and variant compare exactly.
    pub fn structurally_eq(&self, other: &GeometryObject) -> bool {
        let eps = POSITION_EPSILON;
        match (self, other) {
            (
                GeometryObject::Mesh {
                    topology: ta,
                    attributes: aa,
                },
                GeometryObject::Mesh {
                    topology: tb,
                    attributes: ab,
                },
            ) => topologies_eq(ta, tb, eps) && aa.approx_eq(ab, eps),
            (
                GeometryObject::SubdividedMesh {
                    topology: ta,
                    crease: ca,
                    scheme: sa,
                    attributes: aa,
                },
                GeometryObject::SubdividedMesh {
                    topology: tb,
                    crease: cb,
                    scheme: sb,
                    attributes: ab,
                },
            ) => {
                sa == sb
                    && topologies_eq(ta, tb, eps)
                    && ca.approx_eq(cb, eps)
                    && aa.approx_eq(ab, eps)
            }
            (
                GeometryObject::PointCloud {
                    points: pa,
                    attributes: aa,
                },
                GeometryObject::PointCloud {
                    points: pb,
                    attributes: ab,
                },
            ) => positions_approx_eq(&pa.positions, &pb.positions, eps) && aa.approx_eq(ab, eps),
            _ => false,
        }
    }
}

fn topologies_eq(a: &FaceTopology, b: &FaceTopology, eps: f32) -> bool {
    positions_approx_eq(&a.vertices, &b.vertices, eps) && a.faces == b.faces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{AttrName, AttrValues};
    use crate::topo::EdgeKey;

    fn triangle() -> FaceTopology {
        FaceTopology::build(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.5, 1.0, 0.0),
            ],
            vec![vec![0, 1, 2]],
        )
        .unwrap()
    }

    #[test]
    fn test_scheme_parse() {
        assert_eq!(
            SubdivisionScheme::parse("catmull-clark"),
            Some(SubdivisionScheme::CatmullClark)
        );
        assert_eq!(SubdivisionScheme::parse("loop"), Some(SubdivisionScheme::Loop));
        assert_eq!(SubdivisionScheme::parse("nurbs"), None);
        assert_eq!(SubdivisionScheme::Bilinear.as_str(), "bilinear");
    }

    #[test]
    fn test_variant_names() {
        let mesh = GeometryObject::Mesh {
            topology: triangle(),
            attributes: AttributeBuffer::new(),
        };
        assert_eq!(mesh.variant_name(), "mesh");
        assert_eq!(mesh.domain_cardinality(), 3);
    }

    #[test]
    fn test_structural_eq_within_epsilon() {
        let a = GeometryObject::Mesh {
            topology: triangle(),
            attributes: AttributeBuffer::new(),
        };
        let mut topo = triangle();
        topo.vertices[0].x += 5e-7;
        let b = GeometryObject::Mesh {
            topology: topo,
            attributes: AttributeBuffer::new(),
        };
        assert!(a.structurally_eq(&b));
    }

    #[test]
    fn test_structural_eq_variant_mismatch() {
        let mesh = GeometryObject::Mesh {
            topology: triangle(),
            attributes: AttributeBuffer::new(),
        };
        let subd = GeometryObject::SubdividedMesh {
            topology: triangle(),
            crease: EdgeCreaseMap::new(),
            scheme: SubdivisionScheme::CatmullClark,
            attributes: AttributeBuffer::new(),
        };
        assert!(!mesh.structurally_eq(&subd));
    }

    #[test]
    fn test_validate_catches_crease_off_topology() {
        let mut crease = EdgeCreaseMap::new();
        crease.set(EdgeKey::new(0, 1), 0.5);
        let ok = GeometryObject::SubdividedMesh {
            topology: triangle(),
            crease: crease.clone(),
            scheme: SubdivisionScheme::CatmullClark,
            attributes: AttributeBuffer::new(),
        };
        assert!(ok.validate().is_ok());

        crease.set(EdgeKey::new(7, 9), 0.5);
        let bad = GeometryObject::SubdividedMesh {
            topology: triangle(),
            crease,
            scheme: SubdivisionScheme::CatmullClark,
            attributes: AttributeBuffer::new(),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_validate_catches_attribute_cardinality() {
        let mut attributes = AttributeBuffer::new();
        attributes
            .set(AttrName::Radius, 2, AttrValues::Float(vec![0.1, 0.2]))
            .unwrap();
        let cloud = GeometryObject::PointCloud {
            points: PointSet::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y]),
            attributes,
        };
        assert!(cloud.validate().is_err());
    }
}
